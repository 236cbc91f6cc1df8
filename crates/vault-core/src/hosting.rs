//! Hosting-platform collaborator (identity lookup, repository creation)

use std::path::{Path, PathBuf};
use std::time::Duration;

use vault_process::Invocation;

use crate::{Error, Result, SyncConfig};

/// Result of asking the hosting service for a new repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRepoOutcome {
    Created,
    /// Creation failed; usually because the repository exists already
    MayAlreadyExist { reason: String },
}

/// Operations the engine needs from the hosting platform.
pub trait HostingClient {
    /// Executable this client depends on, checked before any mutation
    fn program(&self) -> Option<&Path> {
        None
    }

    /// Login of the authenticated user
    fn authenticated_user(&self) -> Result<String>;

    /// Create a private repository named `name` owned by the user
    fn create_private_repo(&self, name: &str) -> CreateRepoOutcome;

    /// URL to clone `owner/name` from
    fn clone_url(&self, owner: &str, name: &str) -> String;
}

/// [`HostingClient`] backed by the `gh` CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
    host: String,
    timeout: Option<Duration>,
}

impl GhCli {
    pub fn new(program: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            host: host.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.hosting_program, &config.host).with_timeout(config.command_timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.program)
            .env("GH_HOST", &self.host)
            .env("GH_PROMPT_DISABLED", "1")
            .timeout(self.timeout)
    }
}

impl HostingClient for GhCli {
    fn program(&self) -> Option<&Path> {
        Some(&self.program)
    }

    fn authenticated_user(&self) -> Result<String> {
        let output = self
            .invocation()
            .args(["api", "user", "--jq", ".login"])
            .output()
            .map_err(|e| Error::AuthenticationFailure {
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(Error::AuthenticationFailure {
                reason: output.stderr.trim().to_string(),
            });
        }
        output
            .first_line()
            .map(str::to_string)
            .ok_or_else(|| Error::AuthenticationFailure {
                reason: "hosting CLI returned no login".to_string(),
            })
    }

    fn create_private_repo(&self, name: &str) -> CreateRepoOutcome {
        let result = self
            .invocation()
            .args(["repo", "create", name, "--private"])
            .run_checked();
        match result {
            Ok(_) => CreateRepoOutcome::Created,
            Err(e) => CreateRepoOutcome::MayAlreadyExist {
                reason: e.to_string(),
            },
        }
    }

    fn clone_url(&self, owner: &str, name: &str) -> String {
        format!("https://{}/{}/{}.git", self.host, owner, name)
    }
}
