//! Command implementations

pub mod clean;
pub mod push;
pub mod restore;
pub mod status;

pub use clean::run_clean;
pub use push::run_push;
pub use restore::run_restore;
pub use status::run_status;
