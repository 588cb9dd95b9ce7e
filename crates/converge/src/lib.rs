//! # Converge
//!
//! A framework for declarative resource convergence.
//!
//! Callers declare an ordered list of resources (packages, services, files,
//! database objects, remote registrations), and the engine walks the list once,
//! bringing each resource from its current state to its declared state. Applies
//! are strictly sequential because later resources routinely depend on state
//! mutated by earlier ones.
//!
//! ## Core concepts
//!
//! - **Resource**: something with state that can be inspected and converged
//! - **Plan**: the ordered declaration list plus notification edges
//! - **Notification edge**: "when X changes, run action A on Y", either
//!   immediately or once at the end of the run
//! - **Provider registry**: maps a variant name (SQL engine, platform family)
//!   to the executor that handles it
//!
//! ## Example
//!
//! ```ignore
//! use converge::{Plan, Resource, ResourceState, ApplyResult, ApplyContext, RunOptions};
//!
//! #[derive(Debug)]
//! struct FileResource { path: String, content: String }
//!
//! impl Resource for FileResource {
//!     fn kind(&self) -> &'static str { "file" }
//!     fn name(&self) -> String { self.path.clone() }
//!     fn description(&self) -> String { format!("File: {}", self.path) }
//!
//!     fn current_state(&self) -> anyhow::Result<ResourceState> {
//!         if std::path::Path::new(&self.path).exists() {
//!             Ok(ResourceState::Present { details: None })
//!         } else {
//!             Ok(ResourceState::Absent)
//!         }
//!     }
//!
//!     fn desired_state(&self) -> ResourceState {
//!         ResourceState::Present { details: None }
//!     }
//!
//!     fn apply(&self, _ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
//!         std::fs::write(&self.path, &self.content)?;
//!         Ok(ApplyResult::Created)
//!     }
//! }
//!
//! let mut plan = Plan::new();
//! plan.declare(Box::new(FileResource {
//!     path: "/tmp/test.txt".into(),
//!     content: "hello".into(),
//! }));
//! let summary = converge::run(&plan, &RunOptions::default())?;
//! ```
//!
//! Re-running an unchanged plan performs zero mutating applies: every resource
//! reports `NoChange` on the second pass. A failing resource aborts the run with
//! its identity attached; recovery is re-running the plan.

pub mod diff;
pub mod engine;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use diff::{ResourceDiff, compute_diffs};
pub use engine::run;
pub use plan::{NotifyEdge, NotifyTiming, Plan};
pub use provider::ProviderRegistry;
pub use resource::{ApplyContext, BoxedResource, Resource, ResourceKey};
pub use types::{ApplyResult, ResourceState, RunOptions, RunSummary};
