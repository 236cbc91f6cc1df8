//! Subprocess plumbing for session-vault
//!
//! Every external collaborator (git, the hosting CLI, the secret scanner)
//! is driven through this crate:
//!
//! - [`subprocess`]: run a command to completion under a timeout
//! - [`discovery`]: locate programs on `PATH` before any mutation happens
//! - [`process`]: pid liveness checks and detached background spawns

pub mod discovery;
pub mod error;
pub mod process;
pub mod subprocess;

pub use discovery::{find_program, missing_programs};
pub use error::{ProcessError, Result};
pub use process::{is_process_alive, spawn_detached};
pub use subprocess::{CommandOutput, Invocation};
