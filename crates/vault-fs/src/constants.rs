//! Engine-owned names inside the workspace.

use std::path::Path;

/// Well-known entries the engine keeps at the workspace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspacePath {
    /// Append-only audit log
    AuditLog,
    /// Lock record of the running worker
    LockFile,
    /// The `.git` directory
    GitDir,
    /// Ignore rules keeping engine state out of commits
    GitIgnore,
}

impl WorkspacePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuditLog => ".security-audit.log",
            Self::LockFile => ".sync.lock",
            Self::GitDir => ".git",
            Self::GitIgnore => ".gitignore",
        }
    }

    /// Entries that belong to the engine rather than to mirrored content.
    ///
    /// These survive a workspace being moved aside during bootstrap.
    pub fn engine_state() -> [WorkspacePath; 2] {
        [Self::AuditLog, Self::LockFile]
    }

    /// Returns true for names of engine state files, including the
    /// temporary files left by atomic writes.
    pub fn is_engine_state(name: &str) -> bool {
        Self::engine_state().iter().any(|p| p.as_str() == name)
            || (name.starts_with('.') && name.ends_with(".tmp"))
    }
}

impl AsRef<Path> for WorkspacePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for WorkspacePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for WorkspacePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
