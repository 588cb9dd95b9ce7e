use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idnode")]
#[command(version)]
#[command(about = "Converge an identity service node to its declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the node to its declared state
    Apply(ApplyArgs),

    /// Preview what apply would change
    Diff(RunArgs),
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Inspect and report without changing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args)]
pub struct RunArgs {
    /// Node configuration file
    #[arg(short, long, env = "IDNODE_CONFIG", default_value = "/etc/idnode/node.toml")]
    pub config: PathBuf,

    /// Cluster inventory file
    #[arg(short, long, default_value = "/etc/idnode/inventory.toml")]
    pub inventory: PathBuf,

    /// Persisted cluster state file
    #[arg(short, long, default_value = "/var/lib/idnode/state.toml")]
    pub state: PathBuf,
}
