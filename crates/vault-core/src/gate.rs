//! Pre-commit secret screening with non-destructive rollback

use std::path::PathBuf;

use vault_fs::quarantine;
use vault_git::GitClient;

use crate::SyncConfig;
use crate::audit::AuditLog;
use crate::scanner::{ScanVerdict, SecretScanner};

/// Decision of the security gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Pass,
    /// Nothing may be committed this run
    Blocked {
        reason: String,
        /// Snapshots the mirrored trees were moved to
        quarantined: Vec<PathBuf>,
    },
}

impl GateVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

pub struct SecurityGate<'a> {
    config: &'a SyncConfig,
    git: &'a GitClient,
    scanner: &'a dyn SecretScanner,
    audit: &'a AuditLog,
}

impl<'a> SecurityGate<'a> {
    pub fn new(
        config: &'a SyncConfig,
        git: &'a GitClient,
        scanner: &'a dyn SecretScanner,
        audit: &'a AuditLog,
    ) -> Self {
        Self {
            config,
            git,
            scanner,
            audit,
        }
    }

    /// Scan every mirrored tree and roll back on any finding.
    ///
    /// Only the live mirror destinations are scanned; earlier snapshots are
    /// left out so a quarantined finding does not block every later run.
    /// A scanner that fails to run blocks just like a finding.
    pub fn check(&self) -> GateVerdict {
        let targets: Vec<PathBuf> = self
            .config
            .destinations()
            .into_iter()
            .filter(|d| d.symlink_metadata().is_ok_and(|m| m.is_dir()))
            .collect();

        for target in &targets {
            let reason = match self.scanner.scan(target) {
                Ok(ScanVerdict::Clean) => continue,
                Ok(ScanVerdict::Findings { summary }) => {
                    format!("secrets detected in {}: {summary}", target.display())
                }
                Err(e) => format!("scanner failed on {}: {e}", target.display()),
            };
            return self.roll_back(reason, &targets);
        }

        tracing::debug!(scanned = targets.len(), "Security gate passed");
        GateVerdict::Pass
    }

    fn roll_back(&self, reason: String, targets: &[PathBuf]) -> GateVerdict {
        if let Err(e) = self.git.unstage_all(&self.config.workspace) {
            self.audit
                .error(format!("Could not discard staged changes: {e}"));
        }

        let mut quarantined = Vec::new();
        for target in targets {
            match quarantine(target) {
                Ok(snapshot) => quarantined.push(snapshot),
                Err(e) => self
                    .audit
                    .error(format!("Could not quarantine {}: {e}", target.display())),
            }
        }

        let moved: Vec<String> = quarantined
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        self.audit.security_block(format!(
            "Sync blocked, {reason}; quarantined: [{}]",
            moved.join(", ")
        ));

        GateVerdict::Blocked {
            reason,
            quarantined,
        }
    }
}
