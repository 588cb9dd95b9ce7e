use crate::system::SystemProvider;
use anyhow::Result;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::sync::Arc;

/// A command run on every converge, such as a schema migration
///
/// Always applies; the command itself is expected to be idempotent.
#[derive(Debug)]
pub struct ExecuteCommand {
    name: String,
    command: String,
    args: Vec<String>,
    system: Arc<dyn SystemProvider>,
}

impl ExecuteCommand {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        args: &[&str],
        system: Arc<dyn SystemProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: args.iter().map(ToString::to_string).collect(),
            system,
        }
    }
}

impl Resource for ExecuteCommand {
    fn kind(&self) -> &'static str {
        "execute"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("run {} {}", self.command, self.args.join(" "))
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(ResourceState::Unknown)
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Unknown
    }

    fn always_applies(&self) -> bool {
        true
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        self.system.run(&self.command, &args)?;
        Ok(ApplyResult::Executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::MockSystem;

    #[test]
    fn test_runs_every_time() {
        let system = Arc::new(MockSystem::default());
        let exec = ExecuteCommand::new(
            "db-sync",
            "identity-manage",
            &["db_sync"],
            system.clone(),
        );

        assert!(exec.always_applies());
        for _ in 0..2 {
            let result = exec.apply(&mut ApplyContext::default()).unwrap();
            assert_eq!(result, ApplyResult::Executed);
        }
        assert_eq!(system.journal().len(), 2);
        assert_eq!(system.journal()[0], "run identity-manage db_sync");
    }
}
