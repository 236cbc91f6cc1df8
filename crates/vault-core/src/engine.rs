//! Orchestration of the push, restore, clean and status flows
//!
//! The engine owns the configuration, the audit log and the external
//! collaborators. Each collaborator can be replaced, which is how the tests
//! run the full pipeline against a local bare remote and fake scanners.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use vault_fs::is_backup_name;
use vault_git::{GitClient, current_branch, is_repository, last_commit};
use vault_process::missing_programs;

use crate::audit::{AuditEntry, AuditLog};
use crate::bootstrap::{BootstrapOutcome, Bootstrapper};
use crate::clean::{CleanReport, Cleaner};
use crate::gate::{GateVerdict, SecurityGate};
use crate::hosting::{GhCli, HostingClient};
use crate::launcher::{DetachedLauncher, WorkerLauncher};
use crate::lock::{Acquisition, LockGuard, LockHandle, LockState};
use crate::mirror::{Mirror, MirrorReport};
use crate::scanner::{GitleaksScanner, SecretScanner};
use crate::syncer::{RemoteSyncer, SyncOutcome};
use crate::{Error, Result, SyncConfig};

/// Number of audit entries included in a status report
const STATUS_AUDIT_ENTRIES: usize = 10;

/// What a push trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A worker was started and now owns the lock
    Scheduled { worker_pid: u32 },
    /// A live run holds the lock; nothing was scheduled
    Debounced { owner: Option<u32> },
}

/// Final state of a worker run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReport {
    Synced {
        mirror: MirrorReport,
        outcome: SyncOutcome,
    },
    /// The security gate stopped the run before anything was committed
    Blocked {
        reason: String,
        quarantined: Vec<PathBuf>,
    },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub workspace: PathBuf,
    pub bootstrap: BootstrapOutcome,
    /// False when the remote has no history to pull yet
    pub pulled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastCommit {
    pub hash: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Lock state as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LockStatus {
    Idle,
    Locked {
        pid: Option<u32>,
        since: Option<DateTime<Utc>>,
    },
    Stale {
        pid: Option<u32>,
        since: Option<DateTime<Utc>>,
    },
}

impl From<LockState> for LockStatus {
    fn from(state: LockState) -> Self {
        match state {
            LockState::Idle => Self::Idle,
            LockState::Locked(record) => Self::Locked {
                pid: record.as_ref().map(|r| r.pid),
                since: record.map(|r| r.timestamp),
            },
            LockState::Stale(record) => Self::Stale {
                pid: record.as_ref().map(|r| r.pid),
                since: record.map(|r| r.timestamp),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub path: PathBuf,
    pub exists: bool,
    /// `None` when the source is outside the home directory
    pub destination: Option<PathBuf>,
}

/// Snapshot of the engine's local state
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub workspace: PathBuf,
    pub is_repository: bool,
    pub branch: Option<String>,
    pub last_commit: Option<LastCommit>,
    pub lock: LockStatus,
    pub sources: Vec<SourceStatus>,
    /// Backup snapshot names inside the workspace
    pub backups: Vec<String>,
    pub recent_events: Vec<AuditEntry>,
}

/// The synchronization engine.
pub struct Engine {
    config: SyncConfig,
    audit: AuditLog,
    git: GitClient,
    hosting: Box<dyn HostingClient>,
    scanner: Box<dyn SecretScanner>,
    launcher: Box<dyn WorkerLauncher>,
}

impl Engine {
    /// Engine with the real collaborators (`git`, `gh`, `gitleaks`) and a
    /// launcher that re-executes the running binary.
    pub fn new(config: SyncConfig) -> Result<Self> {
        let git = GitClient::new(&config.git_program).with_timeout(config.command_timeout);
        let hosting = GhCli::from_config(&config);
        let scanner = GitleaksScanner::from_config(&config);
        let launcher = DetachedLauncher::current_exe()?;
        Ok(Self {
            audit: AuditLog::new(config.audit_log_path()),
            git,
            hosting: Box::new(hosting),
            scanner: Box::new(scanner),
            launcher: Box::new(launcher),
            config,
        })
    }

    pub fn with_git_client(mut self, git: GitClient) -> Self {
        self.git = git;
        self
    }

    pub fn with_hosting(mut self, hosting: impl HostingClient + 'static) -> Self {
        self.hosting = Box::new(hosting);
        self
    }

    pub fn with_scanner(mut self, scanner: impl SecretScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    pub fn with_launcher(mut self, launcher: impl WorkerLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    fn lock_guard(&self) -> LockGuard {
        LockGuard::for_config(&self.config)
    }

    /// Fail before any mutation if a required program is not installed.
    fn check_dependencies(&self, with_scanner: bool) -> Result<()> {
        let mut programs: Vec<&Path> = vec![self.git.program()];
        programs.extend(self.hosting.program());
        if with_scanner {
            programs.extend(self.scanner.program());
        }

        let missing = missing_programs(programs);
        if missing.is_empty() {
            Ok(())
        } else {
            tracing::error!(?missing, "Required programs not found");
            Err(Error::DependencyMissing { programs: missing })
        }
    }

    /// Schedule a background sync unless one is already live.
    ///
    /// Returns as soon as the worker is started; its outcome is only
    /// visible through the audit log and the repository.
    pub fn trigger_push(&self) -> Result<TriggerOutcome> {
        self.check_dependencies(true)?;

        let mut handle = match self.lock_guard().try_acquire()? {
            Acquisition::Acquired(handle) => handle,
            Acquisition::Debounced(record) => {
                let owner = record.map(|r| r.pid);
                tracing::info!(?owner, "Sync already running, debounced");
                return Ok(TriggerOutcome::Debounced { owner });
            }
        };

        let worker_pid = match self.launcher.launch() {
            Ok(pid) => pid,
            Err(e) => {
                self.audit.error(format!("Could not start sync worker: {e}"));
                // handle drops here and releases the lock
                return Err(e);
            }
        };
        match handle.set_owner(worker_pid) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(worker_pid, "Worker already took over the lock"),
            Err(e) => {
                tracing::warn!(worker_pid, error = %e, "Could not record worker as lock owner")
            }
        }
        handle.hand_off();

        tracing::info!(worker_pid, "Sync scheduled");
        Ok(TriggerOutcome::Scheduled { worker_pid })
    }

    /// Run the full push pipeline in the current process.
    ///
    /// Never returns an error: failures and panics are logged and reported,
    /// and the lock is removed on every path.
    pub fn run_worker(&self) -> WorkerReport {
        let handle = match self.lock_guard().adopt(std::process::id()) {
            Ok(handle) => handle,
            Err(e) => {
                self.audit.error(format!("Sync worker could not take the lock: {e}"));
                return WorkerReport::Failed {
                    error: e.to_string(),
                };
            }
        };
        tracing::info!(pid = handle.pid(), "Sync worker started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.push_pipeline(&handle)));
        let report = match outcome {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                self.audit.error(format!("Sync failed: {e}"));
                WorkerReport::Failed {
                    error: e.to_string(),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.audit.error(format!("Sync worker crashed: {message}"));
                WorkerReport::Failed { error: message }
            }
        };

        if let Err(e) = handle.release() {
            tracing::warn!(error = %e, "Could not remove lock file");
        }
        report
    }

    fn push_pipeline(&self, lock: &LockHandle) -> Result<WorkerReport> {
        self.check_dependencies(true)?;

        Bootstrapper::new(&self.config, &self.git, self.hosting.as_ref(), &self.audit)
            .ensure_workspace()?;
        heartbeat(lock);

        let mirror = Mirror::new(&self.config, &self.audit).run();
        heartbeat(lock);

        let gate = SecurityGate::new(&self.config, &self.git, self.scanner.as_ref(), &self.audit);
        if let GateVerdict::Blocked {
            reason,
            quarantined,
        } = gate.check()
        {
            return Ok(WorkerReport::Blocked {
                reason,
                quarantined,
            });
        }
        heartbeat(lock);

        let outcome = RemoteSyncer::new(&self.config, &self.git, &self.audit).sync()?;
        if outcome == SyncOutcome::Unchanged {
            tracing::info!("Workspace unchanged, nothing pushed");
        }
        Ok(WorkerReport::Synced { mirror, outcome })
    }

    /// Bring the workspace up to date with the remote without mirroring.
    pub fn restore(&self) -> Result<RestoreReport> {
        self.check_dependencies(false)?;

        let guard = self.lock_guard();
        let _handle = match guard.try_acquire()? {
            Acquisition::Acquired(handle) => handle,
            Acquisition::Debounced(_) => {
                return Err(Error::LockBusy {
                    path: guard.path().to_path_buf(),
                });
            }
        };
        self.audit.user_action("Restore requested");

        let bootstrap =
            Bootstrapper::new(&self.config, &self.git, self.hosting.as_ref(), &self.audit)
                .ensure_workspace()?;

        let workspace = &self.config.workspace;
        let pulled = match self
            .git
            .pull_prefer_remote(workspace, &self.config.remote, &self.config.branch)
        {
            Ok(()) => true,
            Err(e) => {
                if last_commit(workspace)?.is_some() {
                    self.audit.error(format!("Restore pull failed: {e}"));
                    return Err(e.into());
                }
                self.audit
                    .info(format!("Remote has no history to restore yet: {e}"));
                false
            }
        };

        self.audit.user_action(format!(
            "Restore finished, workspace at {}",
            workspace.display()
        ));
        Ok(RestoreReport {
            workspace: workspace.clone(),
            bootstrap,
            pulled,
        })
    }

    /// Permanently delete the contents of every source root.
    pub fn clean(&self) -> Result<CleanReport> {
        Ok(Cleaner::new(&self.config, &self.audit).run())
    }

    /// Describe the workspace, lock and sources without changing anything.
    pub fn status(&self) -> Result<StatusReport> {
        let workspace = &self.config.workspace;
        let is_repository = is_repository(workspace);

        let (branch, commit) = if is_repository {
            let commit = last_commit(workspace)?.map(|c| LastCommit {
                hash: c.hash,
                message: c.message,
                timestamp: c.timestamp,
            });
            (current_branch(workspace)?, commit)
        } else {
            (None, None)
        };

        let sources = self
            .config
            .source_roots
            .iter()
            .map(|path| SourceStatus {
                path: path.clone(),
                exists: path.is_dir(),
                destination: self.config.destination(path).ok(),
            })
            .collect();

        let mut backups: Vec<String> = match fs::read_dir(workspace) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| is_backup_name(name))
                .collect(),
            Err(_) => Vec::new(),
        };
        backups.sort();

        Ok(StatusReport {
            workspace: workspace.clone(),
            is_repository,
            branch,
            last_commit: commit,
            lock: self.lock_guard().inspect().into(),
            sources,
            backups,
            recent_events: self.audit.recent(STATUS_AUDIT_ENTRIES)?,
        })
    }
}

/// Refresh the lock between stages so a long run is not judged stale.
fn heartbeat(lock: &LockHandle) {
    if let Err(e) = lock.touch() {
        tracing::warn!(error = %e, "Could not refresh lock");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn lock_status_from_state() {
        assert_eq!(LockStatus::from(LockState::Idle), LockStatus::Idle);
        assert_eq!(
            LockStatus::from(LockState::Locked(None)),
            LockStatus::Locked {
                pid: None,
                since: None
            }
        );
    }
}
