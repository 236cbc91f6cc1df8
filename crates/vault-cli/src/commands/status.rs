//! Status command implementation

use colored::Colorize;
use vault_core::{AuditLevel, Engine, LockStatus, StatusReport};

use crate::error::Result;

/// Print workspace status, as text or JSON
pub fn run_status(engine: &Engine, json: bool) -> Result<i32> {
    let report = engine.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(0)
}

fn print_report(report: &StatusReport) {
    println!("{}", "Session Vault Status".bold());
    println!();

    println!("{}:  {}", "Workspace".dimmed(), report.workspace.display());
    if report.is_repository {
        let branch = report.branch.as_deref().unwrap_or("(detached)");
        println!("{}:     {}", "Branch".dimmed(), branch.cyan());
        match &report.last_commit {
            Some(commit) => println!(
                "{}:     {} {} ({})",
                "Commit".dimmed(),
                commit.hash.yellow(),
                commit.message,
                commit.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("{}:     {}", "Commit".dimmed(), "none yet".dimmed()),
        }
    } else {
        println!(
            "{}:     {} (run {})",
            "Repository".dimmed(),
            "not set up".yellow(),
            "session-vault restore".cyan()
        );
    }

    let lock = match &report.lock {
        LockStatus::Idle => "idle".green().to_string(),
        LockStatus::Locked { pid, .. } => format!("sync running (pid {})", describe(*pid))
            .yellow()
            .to_string(),
        LockStatus::Stale { pid, .. } => format!("stale lock (pid {})", describe(*pid))
            .red()
            .to_string(),
    };
    println!("{}:       {}", "Lock".dimmed(), lock);
    println!();

    println!("{}:", "Sources".bold());
    for source in &report.sources {
        let marker = if source.exists {
            "+".green()
        } else {
            "-".dimmed()
        };
        println!("  {} {}", marker, source.path.display());
    }
    println!();

    if !report.backups.is_empty() {
        println!("{}:", "Backups".bold());
        for backup in &report.backups {
            println!("  {} {}", "!".yellow(), backup);
        }
        println!();
    }

    println!("{}:", "Recent Events".bold());
    if report.recent_events.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for entry in &report.recent_events {
        let level = match entry.level {
            AuditLevel::Info => entry.level.to_string().normal(),
            AuditLevel::UserAction => entry.level.to_string().cyan(),
            AuditLevel::Error => entry.level.to_string().red(),
            AuditLevel::SecurityBlock => entry.level.to_string().red().bold(),
        };
        println!(
            "  {} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            level,
            entry.message
        );
    }
}

fn describe(pid: Option<u32>) -> String {
    pid.map_or_else(|| "unknown".to_string(), |p| p.to_string())
}
