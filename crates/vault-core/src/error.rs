//! Error types for vault-core

use std::path::PathBuf;

/// Result type for vault-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required external programs are not installed
    #[error("Missing required programs: {}", programs.join(", "))]
    DependencyMissing { programs: Vec<String> },

    /// The hosting CLI could not tell us who is logged in
    #[error("Authentication with the hosting service failed: {reason}")]
    AuthenticationFailure { reason: String },

    /// The workspace could not be backed by a clone of the remote
    #[error("Could not bootstrap workspace at {path}: {reason}")]
    BootstrapFailure { path: PathBuf, reason: String },

    /// Another run holds the workspace lock
    #[error("Workspace is locked by another run ({path})")]
    LockBusy { path: PathBuf },

    /// The home directory could not be determined
    #[error("Could not determine the home directory")]
    HomeNotFound,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from vault-fs
    #[error(transparent)]
    Fs(#[from] vault_fs::Error),

    /// Git error from vault-git
    #[error(transparent)]
    Git(#[from] vault_git::Error),

    /// Subprocess error from vault-process
    #[error(transparent)]
    Process(#[from] vault_process::ProcessError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
