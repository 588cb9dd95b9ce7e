//! Diff computation for plan previews

use crate::plan::Plan;
use crate::resource::Resource;
use crate::types::ResourceState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A diff between current and declared state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Resource type category
    pub kind: String,
    /// Resource name within its kind
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub current: ResourceState,
    /// Declared state
    pub desired: ResourceState,
    /// Whether this resource skips the diff and applies on every run
    pub always_runs: bool,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    pub fn from_resource(resource: &dyn Resource) -> Result<Option<Self>> {
        if resource.always_applies() {
            return Ok(Some(Self {
                kind: resource.kind().to_string(),
                name: resource.name(),
                description: resource.description(),
                current: ResourceState::Unknown,
                desired: ResourceState::Unknown,
                always_runs: true,
            }));
        }

        let current = resource.current_state()?;
        let desired = resource.desired_state();
        if current == desired {
            return Ok(None);
        }

        Ok(Some(Self {
            kind: resource.kind().to_string(),
            name: resource.name(),
            description: resource.description(),
            current,
            desired,
            always_runs: false,
        }))
    }

    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Absent, ResourceState::Present { .. })
        )
    }
}

/// Compute diffs for every resource in a plan
///
/// Returns only resources with pending changes (plus always-run resources).
/// State-detection failures propagate; a preview against an unreachable
/// system is an error, not an empty diff.
pub fn compute_diffs(plan: &Plan) -> Result<Vec<ResourceDiff>> {
    let mut diffs = Vec::new();
    for resource in plan.resources() {
        let diff = ResourceDiff::from_resource(resource.as_ref())
            .with_context(|| format!("failed to inspect {}", resource.key()))?;
        if let Some(diff) = diff {
            diffs.push(diff);
        }
    }
    Ok(diffs)
}
