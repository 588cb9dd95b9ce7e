//! Core types for declarative resource convergence

use serde::{Deserialize, Serialize};

/// Current or desired state of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    /// Resource exists/is configured
    Present { details: Option<String> },
    /// Resource does not exist/is not configured
    Absent,
    /// Resource exists but differs from desired
    Modified { from: String, to: String },
    /// State cannot be determined
    Unknown,
}

impl ResourceState {
    /// Check if state represents presence
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Result of applying a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Current state already matched declared state
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified
    Modified,
    /// An always-apply resource ran (e.g. a migration command)
    Executed,
    /// Apply was skipped (dry run)
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents a mutation of system state
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }

    /// Whether this result triggers the resource's outgoing notification edges
    ///
    /// Always-apply resources notify on every run; they only have the edges
    /// the plan explicitly declares for them.
    pub fn fires_notifications(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Executed)
    }
}

/// Summary of a convergence run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub created: usize,
    pub modified: usize,
    pub executed: usize,
    pub no_change: usize,
    pub skipped: usize,
    /// Notification actions invoked (immediate + delayed, after de-duplication)
    pub actions_fired: usize,
}

impl RunSummary {
    /// Mutating applies performed during the run
    ///
    /// Excludes always-apply resources: re-running an identical plan must
    /// drive this to zero, while executed commands re-run by design.
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.executed + self.no_change + self.skipped
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Executed => self.executed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for a convergence run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_result_change() {
        assert!(ApplyResult::Created.is_change());
        assert!(ApplyResult::Modified.is_change());
        assert!(!ApplyResult::Executed.is_change());
        assert!(!ApplyResult::NoChange.is_change());
    }

    #[test]
    fn test_executed_fires_notifications() {
        assert!(ApplyResult::Executed.fires_notifications());
        assert!(!ApplyResult::NoChange.fires_notifications());
        assert!(
            !ApplyResult::Skipped {
                reason: "dry run".into()
            }
            .fires_notifications()
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.add_result(&ApplyResult::Created);
        summary.add_result(&ApplyResult::Executed);
        summary.add_result(&ApplyResult::NoChange);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.total_changes(), 1);
    }
}
