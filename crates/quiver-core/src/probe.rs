//! Filesystem probe used by guard clauses in the loaders.

use std::path::Path;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// Probe `path`, following symlinks. `None` if nothing is there.
pub fn exists(path: &Path) -> Option<EntryKind> {
    let meta = std::fs::metadata(path).ok()?;
    Some(if meta.is_file() {
        EntryKind::File
    } else if meta.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::Other
    })
}

pub fn is_file(path: &Path) -> bool {
    exists(path) == Some(EntryKind::File)
}

pub fn is_dir(path: &Path) -> bool {
    exists(path) == Some(EntryKind::Dir)
}

/// A path given as the empty string (or only whitespace).
pub fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}
