//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// session-vault - Back up AI assistant sessions to a private repository
#[derive(Parser, Debug)]
#[command(name = "session-vault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run (defaults to push)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Mirror, screen and publish sessions in the background
    ///
    /// Returns immediately. Triggers arriving while a sync is running are
    /// ignored.
    Push {
        /// Run the sync in this process (used by the background worker)
        #[arg(long, hide = true)]
        daemon: bool,
    },

    /// Clone or update the workspace from the remote and print its path
    Restore,

    /// Permanently delete local session directories
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show workspace, lock and source status
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Push { daemon: false }
    }
}
