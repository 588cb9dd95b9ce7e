//! Convergence plan - ordered resource declarations plus notification edges

use crate::resource::{BoxedResource, ResourceKey};

/// When a notification edge fires relative to the triggering change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTiming {
    /// Run the target action before converging the next resource
    Immediate,
    /// Queue the target action; run once at end of run, de-duplicated
    Delayed,
}

/// An ordering link: when `source` changes, run `action` on `target`
#[derive(Debug, Clone)]
pub struct NotifyEdge {
    pub source: ResourceKey,
    pub target: ResourceKey,
    pub action: String,
    pub timing: NotifyTiming,
}

/// An ordered convergence plan
///
/// Declaration order is execution order. Resource identity is the
/// (kind, name) pair: declaring the same pair again replaces the earlier
/// declaration in place, so a resource is never executed twice.
#[derive(Debug, Default)]
pub struct Plan {
    resources: Vec<BoxedResource>,
    edges: Vec<NotifyEdge>,
}

impl Plan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource
    ///
    /// If a resource with the same (kind, name) was already declared, the new
    /// declaration overwrites it, keeping its original position in the walk.
    /// Returns the resource's key.
    pub fn declare(&mut self, resource: BoxedResource) -> ResourceKey {
        let key = resource.key();
        match self.position(&key) {
            Some(idx) => self.resources[idx] = resource,
            None => self.resources.push(resource),
        }
        key
    }

    /// Declare a notification edge
    ///
    /// The target is resolved when the edge fires; an edge naming a resource
    /// the plan never declares fails the run at validation time.
    pub fn notify(
        &mut self,
        source: ResourceKey,
        target: ResourceKey,
        action: impl Into<String>,
        timing: NotifyTiming,
    ) {
        self.edges.push(NotifyEdge {
            source,
            target,
            action: action.into(),
            timing,
        });
    }

    /// Resources in declaration order
    pub fn resources(&self) -> &[BoxedResource] {
        &self.resources
    }

    /// All declared notification edges
    pub fn edges(&self) -> &[NotifyEdge] {
        &self.edges
    }

    /// Edges whose source is the given resource
    pub fn edges_from<'a>(&'a self, source: &'a ResourceKey) -> impl Iterator<Item = &'a NotifyEdge> {
        self.edges.iter().filter(move |e| &e.source == source)
    }

    /// Position of a resource in the walk
    pub fn position(&self, key: &ResourceKey) -> Option<usize> {
        self.resources.iter().position(|r| &r.key() == key)
    }

    /// Look up a declared resource by key
    pub fn get(&self, key: &ResourceKey) -> Option<&BoxedResource> {
        self.position(key).map(|idx| &self.resources[idx])
    }

    /// Total number of declared resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ApplyContext, Resource};
    use crate::types::{ApplyResult, ResourceState};
    use anyhow::Result;

    #[derive(Debug)]
    struct Marker {
        kind: &'static str,
        name: String,
        label: String,
    }

    impl Resource for Marker {
        fn kind(&self) -> &'static str {
            self.kind
        }
        fn name(&self) -> String {
            self.name.clone()
        }
        fn description(&self) -> String {
            self.label.clone()
        }
        fn current_state(&self) -> Result<ResourceState> {
            Ok(ResourceState::Absent)
        }
        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }
        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::Created)
        }
    }

    fn marker(kind: &'static str, name: &str, label: &str) -> Box<Marker> {
        Box::new(Marker {
            kind,
            name: name.into(),
            label: label.into(),
        })
    }

    #[test]
    fn test_declare_preserves_order() {
        let mut plan = Plan::new();
        plan.declare(marker("package", "identity-server", "a"));
        plan.declare(marker("service", "identity", "b"));
        let kinds: Vec<_> = plan.resources().iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, ["package", "service"]);
    }

    #[test]
    fn test_redeclare_overwrites_in_place() {
        let mut plan = Plan::new();
        plan.declare(marker("file", "/etc/identity.conf", "first"));
        plan.declare(marker("service", "identity", "svc"));
        plan.declare(marker("file", "/etc/identity.conf", "second"));

        assert_eq!(plan.len(), 2);
        let key = ResourceKey::new("file", "/etc/identity.conf");
        assert_eq!(plan.position(&key), Some(0));
        assert_eq!(plan.get(&key).unwrap().description(), "second");
    }

    #[test]
    fn test_edges_from_filters_by_source() {
        let mut plan = Plan::new();
        let tpl = plan.declare(marker("template", "/etc/identity.conf", "t"));
        let svc = plan.declare(marker("service", "identity", "s"));
        plan.notify(tpl.clone(), svc.clone(), "restart", NotifyTiming::Immediate);
        plan.notify(svc.clone(), tpl.clone(), "noop", NotifyTiming::Delayed);

        let from_tpl: Vec<_> = plan.edges_from(&tpl).collect();
        assert_eq!(from_tpl.len(), 1);
        assert_eq!(from_tpl[0].action, "restart");
        assert_eq!(from_tpl[0].target, svc);
    }
}
