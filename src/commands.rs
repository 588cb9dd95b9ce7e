//! The `apply` and `diff` commands.

use crate::cli::{ApplyArgs, RunArgs};
use crate::config::NodeConfig;
use crate::inventory::Inventory;
use crate::recipe::{self, Deps};
use anyhow::Result;
use colored::Colorize;
use converge::{Plan, ResourceState, RunOptions};

fn load_plan(args: &RunArgs) -> Result<Plan> {
    let config = NodeConfig::load(&args.config)?;
    let inventory = Inventory::load(&args.inventory)?;
    let deps = Deps::production(&config);
    recipe::build_plan(&config, &inventory, &args.state, deps)
}

pub fn apply(args: &ApplyArgs, verbose: bool) -> Result<()> {
    let plan = load_plan(&args.run)?;
    let opts = RunOptions {
        dry_run: args.dry_run,
        verbose,
    };

    if args.dry_run {
        println!("{}", "Dry run: no changes will be made".yellow());
    }

    let summary = converge::run(&plan, &opts)?;

    println!();
    if summary.total_changes() == 0 && summary.skipped == 0 {
        println!("{}", "✓ Node already converged".green());
    } else {
        println!("{}", "✓ Converged".green());
    }
    println!(
        "  {} created, {} modified, {} executed, {} unchanged, {} skipped",
        summary.created.to_string().green(),
        summary.modified.to_string().yellow(),
        summary.executed,
        summary.no_change,
        summary.skipped
    );
    if summary.actions_fired > 0 {
        println!("  {} notification(s) fired", summary.actions_fired);
    }
    Ok(())
}

pub fn diff(args: &RunArgs) -> Result<()> {
    let plan = load_plan(args)?;
    let diffs = converge::compute_diffs(&plan)?;

    if diffs.is_empty() {
        println!("{}", "✓ Node already converged".green());
        return Ok(());
    }

    for diff in &diffs {
        if diff.always_runs {
            println!(
                "{} {}[{}] {}",
                "»".cyan(),
                diff.kind,
                diff.name,
                diff.description.dimmed()
            );
        } else if diff.is_addition() {
            println!(
                "{} {}[{}] {}",
                "+".green(),
                diff.kind,
                diff.name,
                diff.description.dimmed()
            );
        } else {
            println!(
                "{} {}[{}] {}",
                "~".yellow(),
                diff.kind,
                diff.name,
                diff.description.dimmed()
            );
            if let ResourceState::Modified { from, to } = &diff.current {
                print_content_diff(from, to);
            }
        }
    }
    println!();
    println!("{} resource(s) would change", diffs.len());
    Ok(())
}

/// Line-level diff for modified file content
fn print_content_diff(from: &str, to: &str) {
    for line in content_diff_lines(from, to) {
        println!("    {line}");
    }
}

fn content_diff_lines(from: &str, to: &str) -> Vec<String> {
    let diff = similar::TextDiff::from_lines(from, to);
    let mut lines = Vec::new();
    for change in diff.iter_all_changes() {
        let text = change.value().trim_end_matches('\n');
        match change.tag() {
            similar::ChangeTag::Delete => lines.push(format!("- {text}").red().to_string()),
            similar::ChangeTag::Insert => lines.push(format!("+ {text}").green().to_string()),
            similar::ChangeTag::Equal => {}
        }
    }
    lines
}
