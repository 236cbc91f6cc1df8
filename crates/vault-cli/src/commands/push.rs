//! Push command implementation

use colored::Colorize;
use vault_core::{Engine, TriggerOutcome, WorkerReport};

use crate::error::Result;

/// Exit code of a worker run stopped by the security gate
pub const EXIT_BLOCKED: i32 = 2;

/// Trigger a background sync, or run it in-process with `daemon`.
pub fn run_push(engine: &Engine, daemon: bool) -> Result<i32> {
    if daemon {
        return Ok(worker_exit_code(&engine.run_worker()));
    }

    match engine.trigger_push()? {
        TriggerOutcome::Scheduled { worker_pid } => {
            println!(
                "{} Sync scheduled (worker pid {})",
                "=>".blue().bold(),
                worker_pid
            );
        }
        TriggerOutcome::Debounced { .. } => {
            println!("{} Sync already running", "=>".blue().bold());
        }
    }
    Ok(0)
}

fn worker_exit_code(report: &WorkerReport) -> i32 {
    match report {
        WorkerReport::Synced { .. } => 0,
        WorkerReport::Blocked { .. } => EXIT_BLOCKED,
        WorkerReport::Failed { .. } => 1,
    }
}
