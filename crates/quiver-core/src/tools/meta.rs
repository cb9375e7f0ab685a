//! Information about the running CLI itself.

use std::path::{Path, PathBuf};

use crate::config::{find_manifest, PartialConfig};

/// Name, version and location of the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    name: String,
    version: Option<String>,
    cwd: PathBuf,
    /// The main plugin directory, if one was loaded.
    src: Option<PathBuf>,
}

impl Meta {
    pub fn new(name: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            cwd: cwd.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_src(mut self, src: Option<PathBuf>) -> Self {
        self.src = src;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn src(&self) -> Option<&Path> {
        self.src.as_deref()
    }

    /// Project manifest above the main plugin, else above the working directory.
    pub fn manifest(&self) -> Option<PathBuf> {
        find_manifest(self.src.as_deref().unwrap_or(&self.cwd))
    }

    /// Configured version, else the manifest's, else `"unknown"`.
    pub fn version(&self) -> String {
        if let Some(version) = &self.version {
            return version.clone();
        }

        self.manifest()
            .and_then(|path| PartialConfig::from_file(&path).ok())
            .and_then(|config| config.version)
            .unwrap_or_else(|| "unknown".to_string())
    }
}
