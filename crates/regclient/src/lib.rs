//! # regclient
//!
//! Idempotent client for the identity service's administrative API.
//!
//! Every operation treats the remote service as convergeable state: look the
//! entity up by its natural key (tenant name, user name, the
//! user/role/tenant triple), create it when absent, and do nothing when it
//! already exists. Attribute drift on existing entities is deliberately not
//! reconciled - existence is the only convergence criterion, so re-running
//! with changed attributes never updates an entity that is already there.
//!
//! The one suspension point is [`AdminClient::wait_ready`], a bounded
//! retry/poll used as a startup barrier after the service is (re)started.
//!
//! Referenced entities are never auto-created: registering a role assignment
//! for a tenant that does not exist is an ordering error surfaced as
//! [`Error::MissingDependency`], not an implicit tenant creation.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{AdminClient, AdminEndpoint, Ensured};
pub use error::{Error, Result};
pub use retry::{RetryConfig, with_retry};
pub use types::{Ec2Credential, Endpoint, EndpointTemplate, Role, ServiceEntry, Tenant, User};
