//! Convergence engine - sequential diff-then-apply walk with notifications
//!
//! The walk is strictly sequential and fail-fast: no resource is evaluated
//! before the previous resource's apply (and its immediate notifications)
//! completed, and the first failure aborts the run with the failing
//! resource's identity attached. Recovery is re-running the plan; resources
//! already converged report no change.

use crate::plan::{NotifyTiming, Plan};
use crate::resource::{ApplyContext, Resource, ResourceKey};
use crate::types::{ApplyResult, RunOptions, RunSummary};
use anyhow::{Context, Result};

/// Run a convergence plan
///
/// For each resource in declaration order: resolve its current state, skip it
/// when the declared state is already met, otherwise apply. Changes fire the
/// resource's outgoing notification edges: immediate edges synchronously,
/// delayed edges through an end-of-run queue de-duplicated on
/// (target, action).
pub fn run(plan: &Plan, opts: &RunOptions) -> Result<RunSummary> {
    validate_edges(plan)?;

    let mut summary = RunSummary::default();
    // Delayed actions in first-trigger order, one entry per (target, action).
    let mut delayed: Vec<(ResourceKey, String)> = Vec::new();

    for resource in plan.resources() {
        let key = resource.key();
        let result = converge_one(resource.as_ref(), opts)
            .with_context(|| format!("failed to converge {key}"))?;

        match &result {
            ApplyResult::NoChange => log::debug!("{key} is up to date"),
            ApplyResult::Skipped { reason } => log::info!("{key}: skipped ({reason})"),
            _ => log::info!("{key}: {}", resource.description()),
        }

        if result.fires_notifications() {
            for edge in plan.edges_from(&key) {
                match edge.timing {
                    NotifyTiming::Immediate => {
                        fire(plan, &edge.target, &edge.action, opts)?;
                        summary.actions_fired += 1;
                    }
                    NotifyTiming::Delayed => {
                        let pending = (edge.target.clone(), edge.action.clone());
                        if !delayed.contains(&pending) {
                            delayed.push(pending);
                        }
                    }
                }
            }
        }

        summary.add_result(&result);
    }

    for (target, action) in delayed {
        fire(plan, &target, &action, opts)?;
        summary.actions_fired += 1;
    }

    Ok(summary)
}

/// Converge a single resource: diff, then apply only if needed
fn converge_one(resource: &dyn Resource, opts: &RunOptions) -> Result<ApplyResult> {
    let mut ctx = ApplyContext::new(opts.dry_run, opts.verbose);

    if resource.always_applies() {
        if opts.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "dry run".into(),
            });
        }
        return resource.apply(&mut ctx);
    }

    if !resource.needs_apply()? {
        return Ok(ApplyResult::NoChange);
    }

    if opts.dry_run {
        return Ok(ApplyResult::Skipped {
            reason: "dry run".into(),
        });
    }

    resource.apply(&mut ctx)
}

/// Invoke a notification action on its target resource
fn fire(plan: &Plan, target: &ResourceKey, action: &str, opts: &RunOptions) -> Result<()> {
    // Targets were validated before the walk started.
    let resource = plan
        .get(target)
        .with_context(|| format!("notification target {target} not declared"))?;

    log::info!("notifying {target}: {action}");
    let mut ctx = ApplyContext::new(opts.dry_run, opts.verbose);
    resource
        .run_action(action, &mut ctx)
        .with_context(|| format!("notification '{action}' on {target} failed"))
}

/// Reject plans whose edges name undeclared resources before mutating anything
fn validate_edges(plan: &Plan) -> Result<()> {
    for edge in plan.edges() {
        if plan.get(&edge.target).is_none() {
            anyhow::bail!(
                "notification edge from {} targets undeclared resource {}",
                edge.source,
                edge.target
            );
        }
    }
    Ok(())
}
