//! Resource trait for declarative state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a declared state. Identity is the
//! (kind, name) pair; the name is also the target of notification edges.

use crate::types::{ApplyResult, ResourceState};
use anyhow::Result;
use std::fmt;

/// Identity of a resource within a plan
///
/// Re-declaring the same key overwrites the earlier declaration rather than
/// duplicating execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.name)
    }
}

/// Context passed to resource apply operations
#[derive(Debug, Clone, Default)]
pub struct ApplyContext {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}

/// Core trait for declarative resources
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (kind + name)
/// - State detection (current vs desired)
/// - State convergence (apply)
/// - Named actions invokable through notification edges
pub trait Resource: Send + Sync + fmt::Debug {
    /// Resource type category
    ///
    /// Used for identity, grouping and error reporting. Examples:
    /// - "package", "service", "template"
    /// - "database", "database_user"
    /// - "register" for remote registrations
    fn kind(&self) -> &'static str;

    /// Name of this resource, unique within its kind
    ///
    /// Notification edges target resources by (kind, name), so this should
    /// be stable. Examples: a package name, a file path, a tenant name.
    fn name(&self) -> String;

    /// Identity of this resource within a plan
    fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind(), self.name())
    }

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Detect the current state of this resource
    ///
    /// This should query the system (or a remote API) to determine what
    /// state the resource is currently in.
    fn current_state(&self) -> Result<ResourceState>;

    /// Get the declared state for this resource
    fn desired_state(&self) -> ResourceState;

    /// Whether this resource applies on every run, skipping the diff step
    ///
    /// Inherently mutating actions ("run this command every time") return
    /// true and report [`ApplyResult::Executed`] from `apply`.
    fn always_applies(&self) -> bool {
        false
    }

    /// Check if the resource needs changes to reach declared state
    ///
    /// Default implementation compares current and desired states.
    fn needs_apply(&self) -> Result<bool> {
        let current = self.current_state()?;
        let desired = self.desired_state();
        Ok(current != desired)
    }

    /// Apply changes to reach the declared state
    ///
    /// Must either fully apply the change or fail without claiming partial
    /// success; the engine aborts the run on the first failure.
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;

    /// Run a named action on this resource (notification target)
    ///
    /// Invoked by the engine when another resource's change triggers an edge
    /// pointing here, e.g. `restart` on a service. Resources that support no
    /// actions keep the default, which fails with the unknown action name.
    fn run_action(&self, action: &str, ctx: &mut ApplyContext) -> Result<()> {
        let _ = ctx;
        anyhow::bail!("{} does not support action '{action}'", self.key())
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = ResourceKey::new("service", "identity");
        assert_eq!(key.to_string(), "service[identity]");
    }

    #[derive(Debug)]
    struct Inert;

    impl Resource for Inert {
        fn kind(&self) -> &'static str {
            "inert"
        }
        fn name(&self) -> String {
            "x".into()
        }
        fn description(&self) -> String {
            "inert".into()
        }
        fn current_state(&self) -> Result<ResourceState> {
            Ok(ResourceState::Present { details: None })
        }
        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }
        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    #[test]
    fn test_default_action_is_error() {
        let err = Inert
            .run_action("restart", &mut ApplyContext::default())
            .unwrap_err();
        assert!(err.to_string().contains("restart"));
        assert!(err.to_string().contains("inert[x]"));
    }

    #[test]
    fn test_needs_apply_compares_states() {
        assert!(!Inert.needs_apply().unwrap());
    }
}
