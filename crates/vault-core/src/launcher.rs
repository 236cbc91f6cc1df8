//! Background worker launch

use std::path::PathBuf;

use vault_process::spawn_detached;

use crate::Result;

/// Arguments that put the binary into worker mode
pub const WORKER_ARGS: [&str; 2] = ["push", "--daemon"];

/// Schedules the push worker without waiting for it.
///
/// The caller only learns whether scheduling succeeded; the worker's
/// outcome is observable through its side effects.
pub trait WorkerLauncher {
    /// Start the worker and return its pid
    fn launch(&self) -> Result<u32>;
}

/// Re-executes a binary as `push --daemon`, detached from the caller.
#[derive(Debug, Clone)]
pub struct DetachedLauncher {
    program: PathBuf,
}

impl DetachedLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Launcher for the running executable
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }
}

impl WorkerLauncher for DetachedLauncher {
    fn launch(&self) -> Result<u32> {
        let pid = spawn_detached(&self.program, WORKER_ARGS)?;
        tracing::info!(pid, program = %self.program.display(), "Scheduled sync worker");
        Ok(pid)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    #[test]
    fn launches_with_worker_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("args");
        let script = dir.path().join("vault");
        fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > '{}'\n", marker.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let pid = DetachedLauncher::new(&script).launch().unwrap();
        assert!(pid > 0);

        for _ in 0..100 {
            if fs::read_to_string(&marker).is_ok_and(|s| s.ends_with('\n')) {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(fs::read_to_string(&marker).unwrap().trim(), "push --daemon");
    }

    #[test]
    fn missing_program_fails_to_launch() {
        assert!(DetachedLauncher::new("/nonexistent/vault").launch().is_err());
    }
}
