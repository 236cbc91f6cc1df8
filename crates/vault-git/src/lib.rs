//! Git client for session-vault
//!
//! Repository mutations (clone, add, commit, pull, push, gc, reset) go
//! through the `git` executable so they honour the user's credential
//! helpers and merge strategies; read-only inspection uses `git2`.

pub mod client;
pub mod error;
pub mod inspect;

pub use client::GitClient;
pub use error::{Error, Result};
pub use inspect::{CommitInfo, current_branch, is_repository, last_commit};
