//! Stage, commit, merge and publish the workspace
//!
//! Steps run in a fixed order because each depends on the repository
//! state left by the previous one: stage, check diff, commit, merge, push,
//! compact.

use chrono::{SecondsFormat, Utc};
use vault_git::GitClient;

use crate::audit::AuditLog;
use crate::{Result, SyncConfig};

/// How incoming remote history was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged,
    /// The merge did not happen; the local commit is pushed anyway
    Skipped { reason: String },
}

/// Result of a sync attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The staged tree matched the last commit; nothing was committed
    Unchanged,
    Pushed { merge: MergeOutcome },
}

pub struct RemoteSyncer<'a> {
    config: &'a SyncConfig,
    git: &'a GitClient,
    audit: &'a AuditLog,
}

impl<'a> RemoteSyncer<'a> {
    pub fn new(config: &'a SyncConfig, git: &'a GitClient, audit: &'a AuditLog) -> Self {
        Self { config, git, audit }
    }

    /// Commit the workspace if it changed and push it.
    ///
    /// Only staging, committing and pushing can fail the run.
    pub fn sync(&self) -> Result<SyncOutcome> {
        let repo = &self.config.workspace;

        self.git.add_all(repo)?;
        if !self.git.has_staged_changes(repo)? {
            tracing::info!("No changes to commit");
            return Ok(SyncOutcome::Unchanged);
        }

        let message = format!(
            "Sync sessions {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        self.git.commit(repo, &message)?;
        tracing::info!(%message, "Committed workspace");

        // Remote content wins every conflicting hunk
        let merge = match self
            .git
            .pull_prefer_remote(repo, &self.config.remote, &self.config.branch)
        {
            Ok(()) => MergeOutcome::Merged,
            Err(e) => {
                let reason = e.to_string();
                self.audit
                    .info(format!("Merge of remote history skipped: {reason}"));
                MergeOutcome::Skipped { reason }
            }
        };

        if let Err(e) = self
            .git
            .push(repo, &self.config.remote, &self.config.branch)
        {
            self.audit.error(format!("Push failed: {e}"));
            return Err(e.into());
        }
        self.audit.info(format!(
            "Pushed to {}/{}",
            self.config.remote, self.config.branch
        ));

        if let Err(e) = self.git.gc_auto(repo) {
            tracing::debug!(error = %e, "Repository compaction failed");
        }

        Ok(SyncOutcome::Pushed { merge })
    }
}
