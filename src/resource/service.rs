use crate::system::SystemProvider;
use anyhow::Result;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::sync::Arc;

/// A system service that must be enabled at boot
///
/// Supports the `restart` action, which notification edges from the rendered
/// configuration target.
#[derive(Debug)]
pub struct Service {
    name: String,
    system: Arc<dyn SystemProvider>,
}

impl Service {
    pub fn new(name: impl Into<String>, system: Arc<dyn SystemProvider>) -> Self {
        Self {
            name: name.into(),
            system,
        }
    }
}

impl Resource for Service {
    fn kind(&self) -> &'static str {
        "service"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("enable service {}", self.name)
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.system.service_enabled(&self.name)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.system.enable_service(&self.name)?;
        Ok(ApplyResult::Created)
    }

    fn run_action(&self, action: &str, _ctx: &mut ApplyContext) -> Result<()> {
        match action {
            "restart" => self.system.restart_service(&self.name),
            other => anyhow::bail!("{} does not support action '{other}'", self.key()),
        }
    }
}
