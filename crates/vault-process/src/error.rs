//! Error types for subprocess operations

use std::time::Duration;

/// Errors that can occur while running external programs
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The program could not be found
    #[error("Program '{program}' not found")]
    NotFound {
        /// Program that was invoked
        program: String,
    },

    /// The program ran longer than allowed and was killed
    #[error("'{program}' timed out after {}s", timeout.as_secs())]
    TimedOut {
        /// Program that was invoked
        program: String,
        /// Configured limit
        timeout: Duration,
    },

    /// Subprocess exited with non-zero status
    #[error("'{program}' failed (exit code {code}): {stderr}")]
    CommandFailed {
        /// Program that was invoked
        program: String,
        /// Exit code from the subprocess, -1 when killed by a signal
        code: i32,
        /// Captured stderr output
        stderr: String,
    },

    /// I/O error while spawning or waiting
    #[error("I/O error running '{program}': {source}")]
    Io {
        /// Program that was invoked
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for subprocess operations
pub type Result<T> = std::result::Result<T, ProcessError>;
