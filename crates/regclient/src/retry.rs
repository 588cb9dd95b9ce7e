//! Retry logic with exponential backoff for transient errors.

use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Retry configuration for the wakeup barrier.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            backoff_factor: 1.5,
            max_delay: Duration::from_secs(15),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(15),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Execute an operation with retry logic.
///
/// Retries the operation while it returns a retryable error, sleeping with
/// exponential backoff between attempts. Non-retryable errors return
/// immediately; exhausting the attempts returns the last error.
pub fn with_retry<T, F>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_error: Option<Error> = None;

    for attempt in 0..config.max_attempts {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                if attempt + 1 >= config.max_attempts {
                    last_error = Some(e);
                    break;
                }

                let delay = config.delay_for_attempt(attempt);
                log::debug!(
                    "attempt {}/{} failed: {e}; retrying in {}s",
                    attempt + 1,
                    config.max_attempts,
                    delay.as_secs()
                );
                thread::sleep(delay);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::WakeupTimeout {
        attempts: config.max_attempts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_success_first_try() {
        let result = with_retry(&RetryConfig::no_retry(), || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_non_retryable_error_returns_immediately() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<()> = with_retry(&fast_config(5), || {
            attempts_clone.set(attempts_clone.get() + 1);
            Err(Error::Unauthorized { status: 401 })
        });

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_eventual_success() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();

        let result = with_retry(&fast_config(3), || {
            let current = attempts_clone.get();
            attempts_clone.set(current + 1);
            if current < 2 {
                Err(Error::Network {
                    message: "connection refused".into(),
                })
            } else {
                Ok(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_bounded_attempts() {
        let attempts = Rc::new(Cell::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<()> = with_retry(&fast_config(3), || {
            attempts_clone.set(attempts_clone.get() + 1);
            Err(Error::Network {
                message: "connection refused".into(),
            })
        });

        assert!(result.is_err());
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_backoff_delays() {
        let config = RetryConfig::new(5, Duration::from_secs(1), 2.0);
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        // Capped at max_delay.
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(15));
    }
}
