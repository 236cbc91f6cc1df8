//! Immutable engine configuration
//!
//! Built once at startup and passed by reference to every component, so
//! tests can point the engine at a temporary home, a local bare remote and
//! a short debounce window.

use std::path::{Path, PathBuf};
use std::time::Duration;

use vault_fs::{WorkspacePath, map_source};

use crate::{Error, Result};

/// Environment variable selecting the hosting domain
pub const HOST_ENV: &str = "SESSION_VAULT_HOST";

/// Hosting domain used when [`HOST_ENV`] is unset
pub const DEFAULT_HOST: &str = "github.com";

/// Workspace directory name under the home directory
pub const WORKSPACE_DIR: &str = ".session-vault";

/// Name of the private remote repository
pub const REPO_NAME: &str = "ai-session-vault";

/// Session directories of the supported assistant CLIs, relative to home
pub const SOURCE_DIRS: [&str; 3] = [".claude/projects", ".claude/sessions", ".copilot/sessions"];

/// A live lock younger than this suppresses new runs
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(10);

/// Upper bound on any single external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything the engine needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub home: PathBuf,
    pub workspace: PathBuf,
    pub source_roots: Vec<PathBuf>,
    pub debounce_window: Duration,
    /// Hosting domain, forwarded to the hosting CLI
    pub host: String,
    pub repo_name: String,
    pub remote: String,
    pub branch: String,
    /// `None` disables the timeout
    pub command_timeout: Option<Duration>,
    pub git_program: PathBuf,
    pub hosting_program: PathBuf,
    pub scanner_program: PathBuf,
}

impl SyncConfig {
    /// Default layout rooted at `home`.
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            workspace: home.join(WORKSPACE_DIR),
            source_roots: SOURCE_DIRS.iter().map(|dir| home.join(dir)).collect(),
            home,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            host: DEFAULT_HOST.to_string(),
            repo_name: REPO_NAME.to_string(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
            git_program: PathBuf::from("git"),
            hosting_program: PathBuf::from("gh"),
            scanner_program: PathBuf::from("gitleaks"),
        }
    }

    /// Configuration for the current user, honouring [`HOST_ENV`].
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::HomeNotFound)?;
        let mut config = Self::for_home(home);
        if let Some(host) = std::env::var(HOST_ENV)
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
        {
            config.host = host;
        }
        Ok(config)
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_source_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.source_roots = roots;
        self
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_scanner_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.scanner_program = program.into();
        self
    }

    pub fn with_hosting_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.hosting_program = program.into();
        self
    }

    /// Absolute path of an engine-owned entry in the workspace
    pub fn workspace_path(&self, entry: WorkspacePath) -> PathBuf {
        self.workspace.join(entry.as_str())
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.workspace_path(WorkspacePath::AuditLog)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.workspace_path(WorkspacePath::LockFile)
    }

    /// Workspace destination of `source`
    pub fn destination(&self, source: &Path) -> Result<PathBuf> {
        Ok(map_source(&self.home, &self.workspace, source)?)
    }

    /// Destinations of every source root that maps into the workspace.
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.source_roots
            .iter()
            .filter_map(|source| self.destination(source).ok())
            .collect()
    }
}
