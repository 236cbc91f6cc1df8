//! Replicate source trees into the workspace
//!
//! Sources are processed one after another with an explicit work stack.
//! Symlinks are never followed or copied, and every write target is
//! resolved and checked against the workspace root first. Problems with a
//! single entry are logged and skipped; the rest of the tree still mirrors.

use std::fs;
use std::path::{Path, PathBuf};

use vault_fs::ensure_within;

use crate::SyncConfig;
use crate::audit::AuditLog;

/// Counters and destinations from one mirror pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub sources_mirrored: usize,
    pub sources_missing: usize,
    pub files_copied: usize,
    pub symlinks_skipped: usize,
    /// Entries refused because they would land outside the workspace
    pub rejected: usize,
    pub errors: usize,
    /// Workspace directories that received a source tree
    pub destinations: Vec<PathBuf>,
}

pub struct Mirror<'a> {
    config: &'a SyncConfig,
    audit: &'a AuditLog,
}

impl<'a> Mirror<'a> {
    pub fn new(config: &'a SyncConfig, audit: &'a AuditLog) -> Self {
        Self { config, audit }
    }

    /// Mirror every configured source root.
    pub fn run(&self) -> MirrorReport {
        let mut report = MirrorReport::default();
        for source in &self.config.source_roots {
            self.mirror_source(source, &mut report);
        }
        tracing::info!(
            mirrored = report.sources_mirrored,
            missing = report.sources_missing,
            files = report.files_copied,
            symlinks = report.symlinks_skipped,
            rejected = report.rejected,
            errors = report.errors,
            "Mirror pass finished"
        );
        report
    }

    fn mirror_source(&self, source: &Path, report: &mut MirrorReport) {
        let meta = match source.symlink_metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(source = %source.display(), "Source missing, skipping");
                report.sources_missing += 1;
                return;
            }
            Err(e) => {
                self.audit
                    .error(format!("Cannot read source {}: {e}", source.display()));
                report.errors += 1;
                return;
            }
        };

        if meta.file_type().is_symlink() {
            self.audit
                .info(format!("Skipping symlinked source {}", source.display()));
            report.symlinks_skipped += 1;
            return;
        }
        if !meta.is_dir() {
            self.audit
                .error(format!("Source {} is not a directory", source.display()));
            report.errors += 1;
            return;
        }

        let destination = match self.config.destination(source) {
            Ok(destination) => destination,
            Err(e) => {
                self.audit
                    .error(format!("Refusing to mirror {}: {e}", source.display()));
                report.rejected += 1;
                return;
            }
        };
        if let Err(e) = vault_fs::io::create_private_dir(&self.config.workspace) {
            self.audit.error(format!("Cannot create workspace: {e}"));
            report.errors += 1;
            return;
        }
        if !self.prepare_dir(&destination, report) {
            return;
        }

        let mut stack = vec![(source.to_path_buf(), destination.clone())];
        while let Some((from, to)) = stack.pop() {
            let entries = match fs::read_dir(&from) {
                Ok(entries) => entries,
                Err(e) => {
                    self.audit
                        .error(format!("Cannot list {}: {e}", from.display()));
                    report.errors += 1;
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        self.audit
                            .error(format!("Cannot read entry in {}: {e}", from.display()));
                        report.errors += 1;
                        continue;
                    }
                };
                let path = entry.path();
                let target = to.join(entry.file_name());

                // DirEntry::file_type does not follow symlinks
                let file_type = match entry.file_type() {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        self.audit
                            .error(format!("Cannot stat {}: {e}", path.display()));
                        report.errors += 1;
                        continue;
                    }
                };

                if file_type.is_symlink() {
                    self.audit
                        .info(format!("Skipping symlink {}", path.display()));
                    report.symlinks_skipped += 1;
                } else if file_type.is_dir() {
                    if self.prepare_dir(&target, report) {
                        stack.push((path, target));
                    }
                } else if file_type.is_file() {
                    self.copy_file(&path, &target, report);
                } else {
                    tracing::debug!(path = %path.display(), "Skipping special file");
                }
            }
        }

        report.sources_mirrored += 1;
        report.destinations.push(destination);
    }

    /// Create `dir` unless present, after checking it stays in the
    /// workspace. Returns whether the directory is usable.
    fn prepare_dir(&self, dir: &Path, report: &mut MirrorReport) -> bool {
        if let Ok(meta) = dir.symlink_metadata() {
            if meta.file_type().is_symlink() || !meta.is_dir() {
                self.audit.error(format!(
                    "Refusing to write into {}: not a plain directory",
                    dir.display()
                ));
                report.rejected += 1;
                return false;
            }
            return true;
        }

        if let Err(e) = ensure_within(&self.config.workspace, dir) {
            self.audit.error(format!("Refusing to create directory: {e}"));
            report.rejected += 1;
            return false;
        }
        if let Err(e) = fs::create_dir(dir) {
            self.audit
                .error(format!("Cannot create {}: {e}", dir.display()));
            report.errors += 1;
            return false;
        }
        true
    }

    fn copy_file(&self, from: &Path, to: &Path, report: &mut MirrorReport) {
        if to
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
        {
            self.audit
                .error(format!("Refusing to write through symlink {}", to.display()));
            report.rejected += 1;
            return;
        }
        if let Err(e) = ensure_within(&self.config.workspace, to) {
            self.audit.error(format!("Refusing to write file: {e}"));
            report.rejected += 1;
            return;
        }

        match fs::copy(from, to) {
            Ok(_) => report.files_copied += 1,
            Err(e) => {
                self.audit.error(format!(
                    "Cannot copy {} to {}: {e}",
                    from.display(),
                    to.display()
                ));
                report.errors += 1;
            }
        }
    }
}
