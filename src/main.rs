mod cli;
mod commands;
mod config;
mod db;
mod inventory;
mod recipe;
mod resource;
mod state;
mod system;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Apply(args) => commands::apply(&args, cli.verbose > 0),
        Command::Diff(args) => commands::diff(&args),
    }
}
