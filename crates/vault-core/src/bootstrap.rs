//! Make sure the workspace is a clone of the remote repository
//!
//! Prior state that is not a repository is never deleted: it is moved
//! aside to a backup snapshot, keeping only the engine's own files.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vault_fs::io::{create_private_dir, write_atomic};
use vault_fs::{WorkspacePath, quarantine};
use vault_git::{GitClient, is_repository};

use crate::audit::AuditLog;
use crate::hosting::{CreateRepoOutcome, HostingClient};
use crate::{Error, Result, SyncConfig};

/// Patterns the workspace repository must always ignore.
///
/// Anchored to the workspace root: mirrored trees may legitimately hold
/// files whose names look like engine state.
pub const IGNORE_RULES: [&str; 4] = [
    "/.security-audit.log",
    "/.sync.lock",
    "/.*.tmp",
    "/*.bak.*",
];

/// What [`Bootstrapper::ensure_workspace`] had to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The workspace was already a repository
    AlreadyPresent,
    /// The workspace was freshly cloned
    Cloned {
        owner: String,
        /// Where unexplained prior state was moved, if there was any
        backup: Option<PathBuf>,
    },
}

pub struct Bootstrapper<'a> {
    config: &'a SyncConfig,
    git: &'a GitClient,
    hosting: &'a dyn HostingClient,
    audit: &'a AuditLog,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(
        config: &'a SyncConfig,
        git: &'a GitClient,
        hosting: &'a dyn HostingClient,
        audit: &'a AuditLog,
    ) -> Self {
        Self {
            config,
            git,
            hosting,
            audit,
        }
    }

    /// Idempotently back the workspace with a clone of the remote.
    pub fn ensure_workspace(&self) -> Result<BootstrapOutcome> {
        let workspace = &self.config.workspace;

        if is_repository(workspace) {
            write_ignore_rules(workspace)?;
            return Ok(BootstrapOutcome::AlreadyPresent);
        }

        let backup = self.set_aside_prior_state()?;

        let owner = self.hosting.authenticated_user()?;
        tracing::info!(%owner, "Resolved hosting identity");

        match self.hosting.create_private_repo(&self.config.repo_name) {
            CreateRepoOutcome::Created => self
                .audit
                .info(format!("Created private repository {}", self.config.repo_name)),
            CreateRepoOutcome::MayAlreadyExist { reason } => self.audit.info(format!(
                "Repository {} not created, assuming it exists: {}",
                self.config.repo_name, reason
            )),
        }

        let url = self.hosting.clone_url(&owner, &self.config.repo_name);
        self.clone_into_workspace(&url)?;
        write_ignore_rules(workspace)?;

        self.audit
            .info(format!("Bootstrapped workspace {} from {}", workspace.display(), url));
        Ok(BootstrapOutcome::Cloned { owner, backup })
    }

    /// Move a non-repository workspace aside, keeping the engine files.
    fn set_aside_prior_state(&self) -> Result<Option<PathBuf>> {
        let workspace = &self.config.workspace;
        if workspace.symlink_metadata().is_err() {
            return Ok(None);
        }

        let unexplained = fs::read_dir(workspace)
            .map_err(|e| vault_fs::Error::io(workspace, e))?
            .flatten()
            .any(|entry| !WorkspacePath::is_engine_state(&entry.file_name().to_string_lossy()));
        if !unexplained {
            return Ok(None);
        }

        let backup = quarantine(workspace)?;
        create_private_dir(workspace)?;
        for entry in WorkspacePath::engine_state() {
            let kept = backup.join(entry.as_str());
            if kept.symlink_metadata().is_ok() {
                fs::rename(&kept, workspace.join(entry.as_str()))
                    .map_err(|e| vault_fs::Error::io(&kept, e))?;
            }
        }

        self.audit.info(format!(
            "Workspace was not a repository; moved prior state to {}",
            backup.display()
        ));
        Ok(Some(backup))
    }

    /// Clone next to the workspace, then move the clone's contents in.
    ///
    /// git refuses to clone into a non-empty directory, and the workspace
    /// may already hold the audit log and the lock. The staging directory is
    /// a fresh uniquely named sibling, so nothing the user owns is touched.
    fn clone_into_workspace(&self, url: &str) -> Result<()> {
        let workspace = &self.config.workspace;
        let failure = |reason: String| Error::BootstrapFailure {
            path: workspace.clone(),
            reason,
        };

        let staging = staging_dir(workspace).map_err(|e| {
            self.audit.error(format!("Could not create staging directory: {e}"));
            failure(e.to_string())
        })?;

        if let Err(e) = self.git.clone_repo(url, staging.path()) {
            self.audit.error(format!("Clone of {url} failed: {e}"));
            return Err(failure(e.to_string()));
        }

        adopt_entries(staging.path(), workspace).map_err(|e| {
            self.audit.error(format!("Could not populate workspace: {e}"));
            failure(e.to_string())
        })?;

        let leftover = staging.path().to_path_buf();
        if let Err(e) = staging.close() {
            tracing::warn!(path = %leftover.display(), error = %e, "Could not remove staging directory");
        }
        Ok(())
    }
}

/// Prefix of the staging directories created next to the workspace
fn staging_prefix(workspace: &Path) -> String {
    let name = workspace
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{name}.clone-")
}

/// Create an empty, uniquely named sibling of the workspace to clone into
fn staging_dir(workspace: &Path) -> std::io::Result<TempDir> {
    let parent = workspace.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "workspace has no parent")
    })?;
    fs::create_dir_all(parent)?;
    tempfile::Builder::new()
        .prefix(&staging_prefix(workspace))
        .tempdir_in(parent)
}

fn adopt_entries(staging: &Path, workspace: &Path) -> Result<()> {
    create_private_dir(workspace)?;
    for entry in fs::read_dir(staging).map_err(|e| vault_fs::Error::io(staging, e))? {
        let entry = entry.map_err(|e| vault_fs::Error::io(staging, e))?;
        let target = workspace.join(entry.file_name());
        if target.symlink_metadata().is_ok() {
            quarantine(&target)?;
        }
        fs::rename(entry.path(), &target).map_err(|e| vault_fs::Error::io(&target, e))?;
    }
    Ok(())
}

/// Ensure the workspace `.gitignore` lists every engine-owned pattern.
///
/// Existing rules are kept and missing ones are appended. An unanchored
/// engine rule is rewritten to its anchored form.
pub fn write_ignore_rules(workspace: &Path) -> Result<()> {
    let path = workspace.join(WorkspacePath::GitIgnore.as_str());
    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(vault_fs::Error::io(&path, e).into()),
    };

    let mut changed = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            match IGNORE_RULES
                .iter()
                .find(|rule| line.trim() == rule.trim_start_matches('/'))
            {
                Some(rule) => {
                    changed = true;
                    (*rule).to_string()
                }
                None => line.to_string(),
            }
        })
        .collect();

    for rule in IGNORE_RULES {
        if !lines.iter().any(|line| line.trim() == rule) {
            lines.push(rule.to_string());
            changed = true;
        }
    }
    if !changed {
        return Ok(());
    }

    let mut content = lines.join("\n");
    content.push('\n');
    write_atomic(&path, content.as_bytes())?;
    tracing::debug!(path = %path.display(), "Updated ignore rules");
    Ok(())
}
