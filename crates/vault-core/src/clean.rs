//! Irreversible wipe of local session sources
//!
//! The only place the engine truly deletes anything. Deletion is bounded
//! to the top-level entries of each source root whose resolved path stays
//! inside that root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::SyncConfig;
use crate::audit::AuditLog;

/// What a clean pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    /// Entries resolving outside their source root, or not at all
    pub refused: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub struct Cleaner<'a> {
    config: &'a SyncConfig,
    audit: &'a AuditLog,
}

impl<'a> Cleaner<'a> {
    pub fn new(config: &'a SyncConfig, audit: &'a AuditLog) -> Self {
        Self { config, audit }
    }

    pub fn run(&self) -> CleanReport {
        self.audit
            .user_action("Clean requested for local session sources");

        let mut report = CleanReport::default();
        for root in &self.config.source_roots {
            self.clean_root(root, &mut report);
        }

        self.audit.user_action(format!(
            "Clean finished: {} removed, {} refused, {} failed",
            report.removed.len(),
            report.refused.len(),
            report.failed.len()
        ));
        report
    }

    fn clean_root(&self, root: &Path, report: &mut CleanReport) {
        if root
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
        {
            self.audit.error(format!(
                "Refusing to clean {}: source root is a symlink",
                root.display()
            ));
            report.refused.push(root.to_path_buf());
            return;
        }

        let Ok(real_root) = dunce::canonicalize(root) else {
            tracing::debug!(root = %root.display(), "Source missing, nothing to clean");
            return;
        };
        let entries = match fs::read_dir(&real_root) {
            Ok(entries) => entries,
            Err(e) => {
                self.audit
                    .error(format!("Cannot list {}: {e}", root.display()));
                report.failed.push(root.to_path_buf());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();

            let inside = match dunce::canonicalize(&path) {
                Ok(real) => real != real_root && real.starts_with(&real_root),
                Err(_) => false,
            };
            if !inside {
                self.audit.error(format!(
                    "Refusing to delete {}: resolves outside {}",
                    path.display(),
                    real_root.display()
                ));
                report.refused.push(path);
                continue;
            }

            match remove_entry(&entry) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Deleted");
                    report.removed.push(path);
                }
                Err(e) => {
                    self.audit
                        .error(format!("Cannot delete {}: {e}", path.display()));
                    report.failed.push(path);
                }
            }
        }
    }
}

/// Remove a directory entry without following a symlink at its top.
fn remove_entry(entry: &fs::DirEntry) -> std::io::Result<()> {
    let path = entry.path();
    let file_type = entry.file_type()?;
    if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
