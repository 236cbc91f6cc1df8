//! Interactive prompts for CLI commands

use std::io::IsTerminal;
use std::path::PathBuf;

use colored::Colorize;
use dialoguer::Confirm;

use crate::error::{CliError, Result};

/// Ask before wiping `roots`. Refuses when there is no terminal to ask on.
pub fn confirm_clean(roots: &[PathBuf]) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::user(
            "refusing to clean without confirmation; pass --yes",
        ));
    }

    println!("{}", "This permanently deletes:".yellow().bold());
    for root in roots {
        println!("  {} {}/*", "-".red(), root.display());
    }
    println!();

    Ok(Confirm::new()
        .with_prompt("Delete local session data?")
        .default(false)
        .interact()?)
}
