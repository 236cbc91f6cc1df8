//! Filesystem layer for session-vault
//!
//! Provides the source-to-workspace path mapping, resolved-path containment
//! checks, atomic writes and the move-aside quarantine used in place of
//! deletion.

pub mod constants;
pub mod error;
pub mod io;
pub mod path;
pub mod quarantine;

pub use constants::WorkspacePath;
pub use error::{Error, Result};
pub use path::{JOINER, ensure_within, flatten_relative, map_source, normalize_lexical};
pub use quarantine::{BACKUP_INFIX, backup_name, is_backup_name, quarantine};
