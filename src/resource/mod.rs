//! Concrete resources composed into the convergence plan.

#[cfg(test)]
pub(crate) mod test_support;

mod database;
mod execute;
mod file;
mod monitor;
mod package;
mod register;
mod service;
mod template;

pub use database::{Database, DatabaseGrant, DatabaseUser};
pub use execute::ExecuteCommand;
pub use file::FileResource;
pub use monitor::MonitorEntry;
pub use package::Package;
pub use register::{
    RegisterAccess, RegisterEc2, RegisterEndpoint, RegisterRole, RegisterService, RegisterTenant,
    RegisterUser, Wakeup,
};
pub use service::Service;
pub use template::{SubstitutionEngine, TemplateEngine, TemplateResource};
