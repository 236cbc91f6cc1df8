//! Restore command implementation

use colored::Colorize;
use vault_core::{BootstrapOutcome, Engine};

use crate::error::Result;

/// Bring the workspace up to date and print where it is
pub fn run_restore(engine: &Engine) -> Result<i32> {
    let report = engine.restore()?;

    if let BootstrapOutcome::Cloned { owner, backup } = &report.bootstrap {
        println!("{} Cloned workspace for {}", "+".green(), owner.cyan());
        if let Some(backup) = backup {
            println!(
                "{} Previous contents moved to {}",
                "!".yellow(),
                backup.display()
            );
        }
    }
    if !report.pulled {
        println!("{}", "Remote has no sessions yet".dimmed());
    }

    println!();
    println!("{}: {}", "Workspace".bold(), report.workspace.display());
    println!("Copy sessions back from there as needed.");
    Ok(0)
}
