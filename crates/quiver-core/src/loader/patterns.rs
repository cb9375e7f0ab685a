//! File-name patterns and the recursive directory walk used by discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{LoadError, LoadResult};

/// Include/exclude globs matched against file names.
///
/// A pattern starting with `!` excludes. A file matches when it matches at
/// least one include (or there are none) and no exclude.
#[derive(Debug, Clone, Default)]
pub struct FilePatterns {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FilePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> LoadResult<Self> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for raw in patterns {
            let raw = raw.as_ref().trim();
            let (target, expr) = match raw.strip_prefix('!') {
                Some(rest) => (&mut exclude, rest),
                None => (&mut include, raw),
            };
            let pattern = Pattern::new(expr).map_err(|e| LoadError::InvalidPattern {
                pattern: raw.to_string(),
                message: e.to_string(),
            })?;
            target.push(pattern);
        }

        Ok(Self { include, exclude })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(file_name));
        included && !self.exclude.iter().any(|p| p.matches(file_name))
    }
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Every file below `dir`, recursively, sorted by path. Entries whose name
/// starts with a dot are skipped, directories included.
///
/// Each directory is read once, keyed by its canonical path, so symlinked
/// directory cycles end.
pub fn walk(dir: &Path) -> LoadResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let canonical = current.canonicalize().unwrap_or_else(|_| current.clone());
        if !visited.insert(canonical) {
            tracing::debug!(dir = %current.display(), "Directory already walked, skipping");
            continue;
        }
        let entries = std::fs::read_dir(&current).map_err(|source| LoadError::ReadDir {
            path: current.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| LoadError::ReadDir {
                path: current.clone(),
                source,
            })?;
            let path = entry.path();
            if is_dotfile(&path) {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Files below `dir` whose names match `patterns`.
pub fn find_files(dir: &Path, patterns: &FilePatterns) -> LoadResult<Vec<PathBuf>> {
    Ok(walk(dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| patterns.matches(&name.to_string_lossy()))
        })
        .collect())
}
