//! session-vault CLI
//!
//! Mirrors AI assistant session directories into a git workspace, screens
//! them for secrets and publishes them to a private repository.

mod cli;
mod commands;
mod error;
mod interactive;
mod logging;

use clap::Parser;
use colored::Colorize;
use vault_core::{Engine, SyncConfig};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not initialise logging: {}", "warning".yellow().bold(), e);
    }

    match run(cli.command.unwrap_or_default()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    let engine = Engine::new(SyncConfig::from_env()?)?;
    tracing::debug!(workspace = %engine.config().workspace.display(), "Engine ready");

    match command {
        Commands::Push { daemon } => commands::run_push(&engine, daemon),
        Commands::Restore => commands::run_restore(&engine),
        Commands::Clean { yes } => commands::run_clean(&engine, yes),
        Commands::Status { json } => commands::run_status(&engine, json),
    }
}
