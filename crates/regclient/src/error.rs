//! Error types for admin API operations.
//!
//! Errors are categorized so the wakeup barrier can retry transient network
//! failures while everything else fails the run immediately.

use thiserror::Error;

/// Errors that can occur while talking to the admin API.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (connection refused, timeout, DNS)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed request
        message: String,
    },

    /// The admin token was rejected
    #[error("admin token rejected (HTTP {status})")]
    Unauthorized {
        /// HTTP status returned by the service
        status: u16,
    },

    /// The service answered with an unexpected status
    #[error("admin API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status returned by the service
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// A referenced entity does not exist
    ///
    /// Raised when an operation names a tenant, user or role that was never
    /// registered. The client does not auto-create referenced entities;
    /// declaration order is responsible for registering them first.
    #[error("missing dependency: {what}")]
    MissingDependency {
        /// Description of the missing entity, e.g. `tenant 'admin'`
        what: String,
    },

    /// The service did not become reachable within the retry bound
    #[error("service did not become ready after {attempts} attempts")]
    WakeupTimeout {
        /// Number of connection attempts made
        attempts: u32,
    },

    /// The service answered with a payload the client could not decode
    #[error("invalid response payload: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Whether this error is transient and worth retrying.
    ///
    /// Only network errors qualify; an authentication failure or API error
    /// will not resolve itself by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Self::Network {
            message: e.to_string(),
        }
    }
}

/// Result type for admin API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_retry() {
        assert!(
            Error::Network {
                message: "connection refused".into()
            }
            .is_retryable()
        );
        assert!(!Error::Unauthorized { status: 401 }.is_retryable());
        assert!(
            !Error::MissingDependency {
                what: "tenant 'admin'".into()
            }
            .is_retryable()
        );
        assert!(!Error::WakeupTimeout { attempts: 5 }.is_retryable());
    }
}
