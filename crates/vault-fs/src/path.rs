//! Source-to-workspace path mapping and containment checks.
//!
//! A source root under the home directory is mapped to a single flat
//! directory name directly under the workspace: `~/.claude/sessions`
//! becomes `~__claude__sessions`. The mapping is deterministic but not
//! proven collision-free (`~/.claude` and `~/claude` both flatten to
//! `~__claude`).

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Literal joiner replacing runs of path separators.
pub const JOINER: &str = "__";

/// Marker standing in for the home directory in flattened names.
const HOME_MARKER: &str = "~";

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path. Leading `..` of a
/// relative path are kept so callers can still see the traversal.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Flatten a home-relative path into a single directory name.
///
/// Every run of separators, together with the leading dots of the component
/// that follows it, becomes [`JOINER`].
pub fn flatten_relative(relative: &Path) -> String {
    let raw = format!("{}/{}", HOME_MARKER, relative.to_string_lossy());
    let mut flattened = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if is_separator(c) {
            while chars.peek().is_some_and(|&n| is_separator(n)) {
                chars.next();
            }
            while chars.peek() == Some(&'.') {
                chars.next();
            }
            flattened.push_str(JOINER);
        } else {
            flattened.push(c);
        }
    }

    flattened
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Map an absolute source path to its destination directory in `workspace`.
///
/// Fails with [`Error::OutOfScope`] when `source` is not strictly below
/// `home`, and with [`Error::PathEscape`] if the flattened name would not
/// land directly inside the workspace.
pub fn map_source(home: &Path, workspace: &Path, source: &Path) -> Result<PathBuf> {
    let home = normalize_lexical(home);
    let source = normalize_lexical(source);

    let out_of_scope = || Error::OutOfScope {
        path: source.clone(),
        root: home.clone(),
    };

    if !home.is_absolute() || !source.is_absolute() {
        return Err(out_of_scope());
    }

    let relative = source.strip_prefix(&home).map_err(|_| out_of_scope())?;
    if relative.as_os_str().is_empty()
        || matches!(relative.components().next(), Some(Component::ParentDir))
    {
        return Err(out_of_scope());
    }

    let name = flatten_relative(relative);
    let workspace = normalize_lexical(workspace);
    let destination = workspace.join(&name);

    let mut components = destination.strip_prefix(&workspace).map_or_else(
        |_| Vec::new(),
        |rest| rest.components().collect::<Vec<_>>(),
    );
    match components.pop() {
        Some(Component::Normal(_)) if components.is_empty() => Ok(destination),
        _ => Err(Error::PathEscape {
            path: destination,
            root: workspace,
        }),
    }
}

/// Resolve `candidate` and verify it lies strictly inside the resolved `root`.
///
/// An existing candidate is fully resolved (symlinks included). A candidate
/// that does not exist yet is resolved through its parent directory, which
/// must exist. Returns the resolved path.
pub fn ensure_within(root: &Path, candidate: &Path) -> Result<PathBuf> {
    let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;

    let resolved = if candidate.symlink_metadata().is_ok() {
        dunce::canonicalize(candidate).map_err(|e| Error::io(candidate, e))?
    } else {
        let parent = candidate.parent().ok_or_else(|| Error::PathEscape {
            path: candidate.to_path_buf(),
            root: root.clone(),
        })?;
        let file_name = candidate.file_name().ok_or_else(|| Error::PathEscape {
            path: candidate.to_path_buf(),
            root: root.clone(),
        })?;
        dunce::canonicalize(parent)
            .map_err(|e| Error::io(parent, e))?
            .join(file_name)
    };

    if resolved != root && resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(Error::PathEscape {
            path: resolved,
            root,
        })
    }
}
