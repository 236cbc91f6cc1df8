//! Secret-scanner collaborator

use std::path::{Path, PathBuf};
use std::time::Duration;

use vault_process::Invocation;

use crate::{Result, SyncConfig};

/// What the scanner found in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    /// Secrets were detected; `summary` is already redacted
    Findings { summary: String },
}

/// Scans a directory tree for leaked credentials.
pub trait SecretScanner {
    /// Executable this scanner depends on, checked before any mutation
    fn program(&self) -> Option<&Path> {
        None
    }

    /// Scan `target`. An `Err` means the scan itself could not be trusted.
    fn scan(&self, target: &Path) -> Result<ScanVerdict>;
}

/// [`SecretScanner`] backed by `gitleaks`.
///
/// Runs `gitleaks detect --no-git --redact` so findings never echo the
/// secret itself. Exit status 1 means findings; any other non-zero status
/// is a scanner failure.
#[derive(Debug, Clone)]
pub struct GitleaksScanner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl GitleaksScanner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.scanner_program).with_timeout(config.command_timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SecretScanner for GitleaksScanner {
    fn program(&self) -> Option<&Path> {
        Some(&self.program)
    }

    fn scan(&self, target: &Path) -> Result<ScanVerdict> {
        let output = Invocation::new(&self.program)
            .arg("detect")
            .arg("--source")
            .arg(target)
            .args(["--no-git", "--redact", "--no-banner", "--exit-code", "1"])
            .timeout(self.timeout)
            .output()?;

        match output.code {
            Some(0) => Ok(ScanVerdict::Clean),
            Some(1) => {
                let summary = last_line(&output.stderr)
                    .or_else(|| last_line(&output.stdout))
                    .unwrap_or("secrets detected")
                    .to_string();
                tracing::warn!(target = %target.display(), %summary, "Scanner reported findings");
                Ok(ScanVerdict::Findings { summary })
            }
            code => Err(vault_process::ProcessError::CommandFailed {
                program: "gitleaks".to_string(),
                code: code.unwrap_or(-1),
                stderr: output.stderr.trim().to_string(),
            }
            .into()),
        }
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|l| !l.is_empty())
}
