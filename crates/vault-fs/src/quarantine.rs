//! Move-aside snapshots used wherever state would otherwise be deleted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Infix marking a backup snapshot; ignore rules match `/*.bak.*`.
pub const BACKUP_INFIX: &str = ".bak.";

/// Build the snapshot name for `name` at `at`.
pub fn backup_name(name: &str, at: DateTime<Utc>) -> String {
    format!("{}{}{}", name, BACKUP_INFIX, at.format("%Y%m%d-%H%M%S-%3f"))
}

/// Whether `name` is a backup snapshot name
pub fn is_backup_name(name: &str) -> bool {
    name.contains(BACKUP_INFIX)
}

/// Rename `target` to a timestamped sibling and return the new path.
///
/// If a snapshot with the same timestamp already exists a numeric suffix is
/// appended. Nothing is ever deleted.
pub fn quarantine(target: &Path) -> Result<PathBuf> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::io(
                target,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;

    let base = backup_name(&name, Utc::now());
    let mut snapshot = target.with_file_name(&base);
    let mut counter = 1;
    while snapshot.symlink_metadata().is_ok() {
        snapshot = target.with_file_name(format!("{base}-{counter}"));
        counter += 1;
    }

    fs::rename(target, &snapshot).map_err(|e| Error::io(target, e))?;
    tracing::info!(
        from = %target.display(),
        to = %snapshot.display(),
        "Moved aside to backup snapshot"
    );

    Ok(snapshot)
}
