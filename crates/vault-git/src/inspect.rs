//! Read-only repository inspection through git2.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{ErrorCode, Repository};

use crate::Result;

/// Information about a single commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Short commit hash (7 characters)
    pub hash: String,

    /// First line of the commit message
    pub message: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

/// Whether `path` is the working directory of a usable repository.
///
/// Does not search parent directories, and a bare or corrupt repository
/// does not count.
pub fn is_repository(path: &Path) -> bool {
    Repository::open(path)
        .map(|repo| !repo.is_bare())
        .unwrap_or(false)
}

/// Get the current branch name.
///
/// Returns `None` if HEAD is detached. An unborn branch (no commits yet)
/// is still reported by name.
pub fn current_branch(path: &Path) -> Result<Option<String>> {
    let repo = Repository::open(path)?;
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let target = repo
                .find_reference("HEAD")?
                .symbolic_target()
                .map(|t| t.trim_start_matches("refs/heads/").to_string());
            return Ok(target);
        }
        Err(e) => return Err(e.into()),
    };

    if head.is_branch() {
        Ok(head.shorthand().map(str::to_string))
    } else {
        Ok(None)
    }
}

/// The commit HEAD points at, if any.
pub fn last_commit(path: &Path) -> Result<Option<CommitInfo>> {
    let repo = Repository::open(path)?;
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let commit = head.peel_to_commit()?;

    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default();
    let message = commit
        .message()
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .to_string();

    Ok(Some(CommitInfo {
        hash: commit.id().to_string().chars().take(7).collect(),
        message,
        timestamp,
    }))
}
