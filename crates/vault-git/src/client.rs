//! `git` executable wrapper for repository mutations

use std::path::{Path, PathBuf};
use std::time::Duration;

use vault_process::{CommandOutput, Invocation};

use crate::{Error, Result};

/// Thin client around the `git` executable.
///
/// Every call runs as a separate subprocess in the repository directory,
/// bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct GitClient {
    program: PathBuf,
    timeout: Option<Duration>,
    /// `-c key=value` overrides passed to every invocation
    overrides: Vec<(String, String)>,
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitClient {
    /// Create a client using `program` as the git executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
            overrides: Vec::new(),
        }
    }

    /// Bound every invocation by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pass `-c key=value` to every invocation
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Path or name of the git executable
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn invocation(&self, dir: &Path) -> Invocation {
        let mut invocation = Invocation::new(&self.program)
            .current_dir(dir)
            .timeout(self.timeout)
            .env("GIT_TERMINAL_PROMPT", "0");
        for (key, value) in &self.overrides {
            invocation = invocation.arg("-c").arg(format!("{key}={value}"));
        }
        invocation
    }

    /// Run `git <args>` in `dir`, mapping a non-zero exit to an error
    fn run(&self, dir: &Path, operation: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.invocation(dir).args(args).output()?;
        if output.success() {
            Ok(output)
        } else {
            tracing::debug!(
                operation,
                code = ?output.code,
                stderr = %output.stderr.trim(),
                "git command failed"
            );
            Err(Error::OperationFailed {
                operation: operation.to_string(),
                code: output.code.unwrap_or(-1),
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Clone `url` into `dest`, which must not exist or be empty
    pub fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let dest = dest.to_string_lossy();
        self.run(parent, "clone", &["clone", "--quiet", url, dest.as_ref()])?;
        Ok(())
    }

    /// Stage every change in the working tree, deletions included
    pub fn add_all(&self, repo: &Path) -> Result<()> {
        self.run(repo, "add", &["add", "--all"])?;
        Ok(())
    }

    /// Whether the index differs from the last commit
    pub fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        let output = self
            .invocation(repo)
            .args(["diff", "--cached", "--quiet"])
            .output()?;
        match output.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(Error::OperationFailed {
                operation: "diff".to_string(),
                code: code.unwrap_or(-1),
                stderr: output.stderr.trim().to_string(),
            }),
        }
    }

    /// Commit the index with `message`
    pub fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        self.run(repo, "commit", &["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Merge `remote/branch` into HEAD, taking the remote side of every
    /// conflicting hunk.
    pub fn pull_prefer_remote(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.run(
            repo,
            "pull",
            &[
                "pull",
                "--quiet",
                "--no-rebase",
                "--no-edit",
                "--allow-unrelated-histories",
                "-X",
                "theirs",
                remote,
                branch,
            ],
        )?;
        Ok(())
    }

    /// Push HEAD to `remote` as `branch`
    pub fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.run(repo, "push", &["push", "--quiet", remote, &refspec])?;
        Ok(())
    }

    /// Let git decide whether housekeeping is due
    pub fn gc_auto(&self, repo: &Path) -> Result<()> {
        self.run(repo, "gc", &["gc", "--auto", "--quiet"])?;
        Ok(())
    }

    /// Drop everything from the index without touching the working tree
    pub fn unstage_all(&self, repo: &Path) -> Result<()> {
        self.run(repo, "reset", &["reset", "--quiet"])?;
        Ok(())
    }
}
