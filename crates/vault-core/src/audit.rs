//! Append-only audit log
//!
//! One JSON object per line in `Workspace/.security-audit.log`. Lines are
//! appended under an exclusive advisory lock so the trigger process and
//! the worker never interleave, and existing lines are never rewritten.
//! Every entry is also mirrored to `tracing`.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use vault_fs::io::{create_private_dir, open_private_append};

use crate::Result;

/// Severity of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditLevel {
    Info,
    Error,
    SecurityBlock,
    UserAction,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::SecurityBlock => "SECURITY_BLOCK",
            Self::UserAction => "USER_ACTION",
        };
        f.write_str(s)
    }
}

/// A single line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub level: AuditLevel,
    pub message: String,
}

/// Handle on the audit log file. The file is created on first append.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an entry. Failures to write are reported through `tracing`
    /// and never abort the caller.
    pub fn append(&self, level: AuditLevel, message: impl Into<String>) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        };

        match level {
            AuditLevel::Info | AuditLevel::UserAction => {
                tracing::info!(level = %level, "{}", entry.message)
            }
            AuditLevel::Error => tracing::error!(level = %level, "{}", entry.message),
            AuditLevel::SecurityBlock => tracing::warn!(level = %level, "{}", entry.message),
        }

        if let Err(e) = self.write_entry(&entry) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write audit entry");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.append(AuditLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.append(AuditLevel::Error, message);
    }

    pub fn security_block(&self, message: impl Into<String>) {
        self.append(AuditLevel::SecurityBlock, message);
    }

    pub fn user_action(&self, message: impl Into<String>) {
        self.append(AuditLevel::UserAction, message);
    }

    fn write_entry(&self, entry: &AuditEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = open_private_append(&self.path)?;
        file.lock_exclusive()?;
        let written = file.write_all(line.as_bytes()).and_then(|()| file.flush());
        let _ = file.unlock();
        written?;
        Ok(())
    }

    /// The last `n` well-formed entries, oldest first.
    ///
    /// A missing log yields an empty list.
    pub fn recent(&self, n: usize) -> Result<Vec<AuditEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<AuditEntry> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(AuditLevel::Info, "INFO")]
    #[case(AuditLevel::Error, "ERROR")]
    #[case(AuditLevel::SecurityBlock, "SECURITY_BLOCK")]
    #[case(AuditLevel::UserAction, "USER_ACTION")]
    fn level_display_matches_serialized_form(#[case] level: AuditLevel, #[case] expected: &str) {
        assert_eq!(level.to_string(), expected);
        assert_eq!(serde_json::to_string(&level).unwrap(), format!("\"{expected}\""));
    }

    #[test]
    fn append_creates_workspace_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("ws").join(".security-audit.log"));

        log.info("first");

        assert!(log.path().exists());
        let entries = log.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, AuditLevel::Info);
        assert_eq!(entries[0].message, "first");
    }

    #[test]
    fn levels_serialize_in_screaming_case() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join(".security-audit.log"));

        log.security_block("blocked");
        log.user_action("wiped");

        let raw = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"level\":\"SECURITY_BLOCK\""));
        assert!(lines[1].contains("\"level\":\"USER_ACTION\""));
    }

    #[test]
    fn appends_never_rewrite_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join(".security-audit.log"));

        log.info("one");
        let before = fs::read_to_string(log.path()).unwrap();
        log.error("two");
        let after = fs::read_to_string(log.path()).unwrap();

        assert!(after.starts_with(&before));
    }

    #[test]
    fn recent_returns_tail_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join(".security-audit.log"));

        log.info("a");
        fs::OpenOptions::new()
            .append(true)
            .open(log.path())
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();
        log.info("b");
        log.info("c");

        let messages: Vec<_> = log
            .recent(2)
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn recent_on_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("missing.log"));
        assert!(log.recent(5).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn log_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join(".security-audit.log"));
        log.info("x");

        let mode = fs::metadata(log.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
