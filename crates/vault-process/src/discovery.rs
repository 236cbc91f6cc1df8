//! Locate external programs before they are needed

use std::path::{Path, PathBuf};

/// Resolve `program` to an executable path.
///
/// A value containing a path separator is checked as-is; a bare name is
/// searched for on `PATH`.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Names of the programs in `programs` that cannot be found.
pub fn missing_programs<'a, I>(programs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Path>,
{
    programs
        .into_iter()
        .filter(|p| find_program(p).is_none())
        .map(|p| p.display().to_string())
        .collect()
}
