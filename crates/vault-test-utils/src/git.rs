//! Git fixtures.

use std::path::Path;

use git2::{Repository, RepositoryInitOptions};
use vault_git::GitClient;

/// Initialise a bare repository whose HEAD points at `main`.
///
/// Stands in for the hosted remote; clone it with its filesystem path.
///
/// # Panics
/// Panics if the repository cannot be created.
pub fn bare_remote(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    Repository::init_opts(path, &opts).unwrap_or_else(|e| {
        panic!(
            "bare_remote: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Number of commits reachable from `branch` in the repository at `path`.
///
/// Returns 0 when the branch does not exist yet.
///
/// # Panics
/// Panics if the repository cannot be opened or walked.
pub fn commit_count(path: &Path, branch: &str) -> usize {
    let repo = Repository::open(path)
        .unwrap_or_else(|e| panic!("commit_count: cannot open {}: {e}", path.display()));
    let Ok(reference) = repo.find_reference(&format!("refs/heads/{branch}")) else {
        return 0;
    };
    let tip = reference
        .peel_to_commit()
        .unwrap_or_else(|e| panic!("commit_count: cannot peel {branch}: {e}"));

    let mut walk = repo.revwalk().expect("commit_count: revwalk");
    walk.push(tip.id()).expect("commit_count: push tip");
    walk.count()
}

/// Names of the entries in the tree at the tip of `branch`.
///
/// # Panics
/// Panics if the branch or its tree cannot be read.
pub fn tree_entries(path: &Path, branch: &str) -> Vec<String> {
    let repo = Repository::open(path)
        .unwrap_or_else(|e| panic!("tree_entries: cannot open {}: {e}", path.display()));
    let commit = repo
        .find_reference(&format!("refs/heads/{branch}"))
        .and_then(|r| r.peel_to_commit())
        .unwrap_or_else(|e| panic!("tree_entries: no commit on {branch}: {e}"));
    let tree = commit.tree().expect("tree_entries: commit tree");
    tree.iter()
        .filter_map(|entry| entry.name().map(str::to_string))
        .collect()
}

/// Whether `relative` (at any depth) exists in the tree at the tip of `branch`.
///
/// # Panics
/// Panics if the branch or its tree cannot be read.
pub fn tree_has_path(path: &Path, branch: &str, relative: &str) -> bool {
    let repo = Repository::open(path)
        .unwrap_or_else(|e| panic!("tree_has_path: cannot open {}: {e}", path.display()));
    let commit = repo
        .find_reference(&format!("refs/heads/{branch}"))
        .and_then(|r| r.peel_to_commit())
        .unwrap_or_else(|e| panic!("tree_has_path: no commit on {branch}: {e}"));
    let tree = commit.tree().expect("tree_has_path: commit tree");
    tree.get_path(Path::new(relative)).is_ok()
}

/// A git client that can commit on machines without a configured identity.
pub fn test_git_client() -> GitClient {
    GitClient::default()
        .with_config("user.name", "Session Vault Test")
        .with_config("user.email", "test@example.com")
        .with_config("commit.gpgsign", "false")
        .with_config("init.defaultBranch", "main")
}
