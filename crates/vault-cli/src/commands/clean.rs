//! Clean command implementation

use colored::Colorize;
use vault_core::Engine;

use crate::error::Result;
use crate::interactive::confirm_clean;

/// Delete local session data after confirmation
pub fn run_clean(engine: &Engine, yes: bool) -> Result<i32> {
    if !yes && !confirm_clean(&engine.config().source_roots)? {
        println!("{}", "Aborted".dimmed());
        return Ok(0);
    }

    let report = engine.clean()?;

    for path in &report.removed {
        println!("  {} {}", "-".red(), path.display());
    }
    for path in &report.refused {
        println!(
            "  {} {} (resolves outside its source, skipped)",
            "!".yellow(),
            path.display()
        );
    }
    for path in &report.failed {
        println!("  {} {} (could not delete)", "x".red(), path.display());
    }

    println!(
        "{} Removed {} entries",
        "=>".blue().bold(),
        report.removed.len()
    );
    Ok(if report.failed.is_empty() { 0 } else { 1 })
}
