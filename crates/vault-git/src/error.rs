//! Error types for vault-git

use std::path::PathBuf;

/// Result type for vault-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Process(#[from] vault_process::ProcessError),

    #[error("git {operation} failed (exit code {code}): {stderr}")]
    OperationFailed {
        operation: String,
        code: i32,
        stderr: String,
    },

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },
}
