use crate::system::SystemProvider;
use anyhow::Result;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::sync::Arc;

/// An OS package that must be installed
#[derive(Debug)]
pub struct Package {
    name: String,
    system: Arc<dyn SystemProvider>,
}

impl Package {
    pub fn new(name: impl Into<String>, system: Arc<dyn SystemProvider>) -> Self {
        Self {
            name: name.into(),
            system,
        }
    }
}

impl Resource for Package {
    fn kind(&self) -> &'static str {
        "package"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("install package {}", self.name)
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.system.package_installed(&self.name)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.system.install_package(&self.name)?;
        Ok(ApplyResult::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::MockSystem;

    #[test]
    fn test_absent_package_applies_as_created() {
        let system = Arc::new(MockSystem::default());
        let pkg = Package::new("identity-server", system.clone());

        assert_eq!(pkg.current_state().unwrap(), ResourceState::Absent);
        assert!(pkg.needs_apply().unwrap());

        let result = pkg.apply(&mut ApplyContext::default()).unwrap();
        assert_eq!(result, ApplyResult::Created);
        assert_eq!(system.journal(), ["install_package identity-server"]);
    }

    #[test]
    fn test_installed_package_needs_nothing() {
        let system = Arc::new(MockSystem::default());
        system.preinstall("identity-server");
        let pkg = Package::new("identity-server", system);
        assert!(!pkg.needs_apply().unwrap());
    }
}
