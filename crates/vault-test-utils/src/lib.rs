//! Shared test utilities for the session-vault workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: bare remotes, commit counting and a git client with a fixed identity
//! - [`home`]: [`TestHome`] builder for a throwaway home directory with session sources

pub mod git;
pub mod home;

pub use home::TestHome;
