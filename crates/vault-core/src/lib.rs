//! Synchronization engine for session-vault
//!
//! Consolidates AI assistant session directories into one git-backed
//! workspace and publishes it to a private remote:
//!
//! - **LockGuard**: debounced, crash-safe single-worker execution
//! - **Bootstrapper**: backs the workspace with a clone of the remote
//! - **Mirror**: copies source trees in under a flat naming scheme
//! - **SecurityGate**: secret scan with quarantine on detection
//! - **RemoteSyncer**: commit-if-changed, merge, push
//! - **Cleaner**: irreversible wipe of the local sources
//!
//! # Architecture
//!
//! ```text
//!                 vault-cli
//!                     |
//!                 vault-core
//!                     |
//!      +--------------+--------------+
//!      |              |              |
//!  vault-fs      vault-git     vault-process
//! ```
//!
//! The [`Engine`] composes the pieces for each command. Every external
//! program sits behind a trait ([`HostingClient`], [`SecretScanner`],
//! [`WorkerLauncher`]) or the [`vault_git::GitClient`] so the whole
//! pipeline can run against local fixtures.

pub mod audit;
pub mod bootstrap;
pub mod clean;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod hosting;
pub mod launcher;
pub mod lock;
pub mod mirror;
pub mod scanner;
pub mod syncer;

pub use audit::{AuditEntry, AuditLevel, AuditLog};
pub use bootstrap::{BootstrapOutcome, Bootstrapper, IGNORE_RULES, write_ignore_rules};
pub use clean::{CleanReport, Cleaner};
pub use config::{HOST_ENV, SyncConfig};
pub use engine::{
    Engine, LastCommit, LockStatus, RestoreReport, SourceStatus, StatusReport, TriggerOutcome,
    WorkerReport,
};
pub use error::{Error, Result};
pub use gate::{GateVerdict, SecurityGate};
pub use hosting::{CreateRepoOutcome, GhCli, HostingClient};
pub use launcher::{DetachedLauncher, WORKER_ARGS, WorkerLauncher};
pub use lock::{Acquisition, LockGuard, LockHandle, LockRecord, LockState};
pub use mirror::{Mirror, MirrorReport};
pub use scanner::{GitleaksScanner, ScanVerdict, SecretScanner};
pub use syncer::{MergeOutcome, RemoteSyncer, SyncOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn dependency_error_lists_programs() {
        let error = Error::DependencyMissing {
            programs: vec!["gh".to_string(), "gitleaks".to_string()],
        };
        assert_eq!(error.to_string(), "Missing required programs: gh, gitleaks");
    }

    #[test]
    fn bootstrap_failure_mentions_path() {
        let error = Error::BootstrapFailure {
            path: PathBuf::from("/home/u/.session-vault"),
            reason: "clone failed".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("/home/u/.session-vault"), "got: {display}");
        assert!(display.contains("clone failed"), "got: {display}");
    }
}
