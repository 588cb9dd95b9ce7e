use crate::state::ClusterState;
use anyhow::Result;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::path::PathBuf;
use std::sync::Mutex;

/// Announces a service in the persisted monitoring registry
///
/// The registry is append-if-absent, so repeated converges leave a single
/// entry per service.
#[derive(Debug)]
pub struct MonitorEntry {
    state: Mutex<ClusterState>,
    path: PathBuf,
    service: String,
}

impl MonitorEntry {
    pub fn new(state: ClusterState, path: impl Into<PathBuf>, service: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(state),
            path: path.into(),
            service: service.into(),
        }
    }
}

impl Resource for MonitorEntry {
    fn kind(&self) -> &'static str {
        "monitor"
    }

    fn name(&self) -> String {
        self.service.clone()
    }

    fn description(&self) -> String {
        format!("announce {} to monitoring", self.service)
    }

    fn current_state(&self) -> Result<ResourceState> {
        let state = self.state.lock().unwrap();
        if state.monitors(&self.service) {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let mut state = self.state.lock().unwrap();
        if state.register_monitor(&self.service) {
            state.save(&self.path)?;
            Ok(ApplyResult::Created)
        } else {
            Ok(ApplyResult::NoChange)
        }
    }
}
