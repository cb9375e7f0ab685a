//! Project configuration from `quiver.toml`.
//!
//! The manifest is parsed into a [`PartialConfig`] where every field is
//! optional, then [`resolve`] fills in defaults and anchors relative paths.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::loader::{DiscoveryPolicy, LoadStrategy};

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "quiver.toml";

/// How many parent directories the manifest search climbs.
pub const MAX_MANIFEST_DEPTH: usize = 5;

/// Command run when no command name is given.
pub const DEFAULT_COMMAND: &str = "help";

/// Environment variable names.
pub mod env_vars {
    /// Overrides `default_command`.
    pub const DEFAULT_COMMAND: &str = "QUIVER_DEFAULT_COMMAND";
    /// `true` switches log output to JSON.
    pub const LOG_JSON: &str = "QUIVER_LOG_JSON";
}

/// Default command-file patterns.
pub fn default_command_patterns() -> Vec<String> {
    vec![
        "*.toml".to_string(),
        "*.json".to_string(),
        "!*.test.*".to_string(),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// A directory whose sub-directories are each a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginDirConfig {
    pub path: PathBuf,
    /// Glob on sub-directory names, e.g. `quiver-*`.
    #[serde(default)]
    pub matching: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

/// `quiver.toml` as written, nothing filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartialConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub default_command: Option<String>,
    /// The application's own plugin directory.
    pub src: Option<PathBuf>,
    /// Extra single-plugin directories.
    pub plugins: Option<Vec<PathBuf>>,
    pub plugin_dirs: Option<Vec<PluginDirConfig>>,
    pub command_patterns: Option<Vec<String>>,
    pub load_strategy: Option<LoadStrategy>,
    pub discovery_policy: Option<DiscoveryPolicy>,
}

impl PartialConfig {
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(command) = lookup(env_vars::DEFAULT_COMMAND).filter(|c| !c.trim().is_empty()) {
            self.default_command = Some(command);
        }
        self
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub name: String,
    pub version: Option<semver::Version>,
    pub default_command: String,
    pub src: Option<PathBuf>,
    pub plugins: Vec<PathBuf>,
    pub plugin_dirs: Vec<PluginDirConfig>,
    pub command_patterns: Vec<String>,
    pub load_strategy: LoadStrategy,
    pub discovery_policy: DiscoveryPolicy,
    /// Directory relative paths were resolved against.
    pub root: PathBuf,
    /// Manifest the configuration came from, if any.
    pub manifest: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "quiver".to_string(),
            version: None,
            default_command: DEFAULT_COMMAND.to_string(),
            src: None,
            plugins: Vec::new(),
            plugin_dirs: Vec::new(),
            command_patterns: default_command_patterns(),
            load_strategy: LoadStrategy::default(),
            discovery_policy: DiscoveryPolicy::default(),
            root: PathBuf::from("."),
            manifest: None,
        }
    }
}

/// Fill in defaults and make paths absolute against `root`.
pub fn resolve(partial: PartialConfig, root: &Path) -> Result<RuntimeConfig, ConfigError> {
    let defaults = RuntimeConfig::default();

    let version = partial
        .version
        .map(|v| {
            semver::Version::parse(v.trim()).map_err(|source| ConfigError::InvalidVersion {
                version: v,
                source,
            })
        })
        .transpose()?;

    let anchor = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };

    Ok(RuntimeConfig {
        name: partial.name.unwrap_or(defaults.name),
        version,
        default_command: partial.default_command.unwrap_or(defaults.default_command),
        src: partial.src.map(anchor),
        plugins: partial.plugins.unwrap_or_default().into_iter().map(anchor).collect(),
        plugin_dirs: partial
            .plugin_dirs
            .unwrap_or_default()
            .into_iter()
            .map(|d| PluginDirConfig {
                path: anchor(d.path),
                ..d
            })
            .collect(),
        command_patterns: partial.command_patterns.unwrap_or(defaults.command_patterns),
        load_strategy: partial.load_strategy.unwrap_or(defaults.load_strategy),
        discovery_policy: partial.discovery_policy.unwrap_or(defaults.discovery_policy),
        root: root.to_path_buf(),
        manifest: None,
    })
}

/// Find `quiver.toml` in `start` or one of its parents.
///
/// Climbs at most [`MAX_MANIFEST_DEPTH`] levels and stops early at a
/// directory containing `.git`.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    for _ in 0..=MAX_MANIFEST_DEPTH {
        let current = dir?;
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if current.join(".git").exists() {
            return None;
        }
        dir = current.parent();
    }
    None
}

/// Load configuration for a project rooted at or above `start`.
///
/// Without a manifest the defaults apply, anchored at `start`.
pub fn load<F>(start: &Path, env: F) -> Result<RuntimeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match find_manifest(start) {
        Some(manifest) => {
            let root = manifest.parent().unwrap_or(start).to_path_buf();
            let partial = PartialConfig::from_file(&manifest)?.with_env(env);
            tracing::debug!(manifest = %manifest.display(), "Loaded project manifest");
            let mut config = resolve(partial, &root)?;
            config.manifest = Some(manifest);
            Ok(config)
        }
        None => resolve(PartialConfig::default().with_env(env), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_defaults() {
        let config = resolve(PartialConfig::default(), Path::new("/proj")).unwrap();
        assert_eq!(config.name, "quiver");
        assert_eq!(config.default_command, "help");
        assert_eq!(config.command_patterns, default_command_patterns());
        assert_eq!(config.load_strategy, LoadStrategy::Blocking);
        assert_eq!(config.discovery_policy, DiscoveryPolicy::Abort);
        assert!(config.version.is_none());
    }

    #[test]
    fn test_parse_and_resolve_manifest() {
        let content = r#"
name = "movie"
version = "1.2.3"
default_command = "three"
src = "src"
load_strategy = "async"
discovery_policy = "skip-and-warn"

[[plugin_dirs]]
path = "node_modules"
matching = "movie-*"
hidden = true
"#;
        let partial = PartialConfig::parse(Path::new("quiver.toml"), content).unwrap();
        let config = resolve(partial, Path::new("/proj")).unwrap();

        assert_eq!(config.name, "movie");
        assert_eq!(config.version, Some(semver::Version::new(1, 2, 3)));
        assert_eq!(config.default_command, "three");
        assert_eq!(config.src, Some(PathBuf::from("/proj/src")));
        assert_eq!(config.load_strategy, LoadStrategy::Async);
        assert_eq!(config.discovery_policy, DiscoveryPolicy::SkipAndWarn);
        assert_eq!(config.plugin_dirs[0].path, PathBuf::from("/proj/node_modules"));
        assert_eq!(config.plugin_dirs[0].matching.as_deref(), Some("movie-*"));
        assert!(config.plugin_dirs[0].hidden);
    }

    #[test]
    fn test_invalid_version_rejected() {
        let partial = PartialConfig {
            version: Some("one".to_string()),
            ..Default::default()
        };
        let err = resolve(partial, Path::new("/")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVersion { .. }));
    }

    #[test]
    fn test_env_override() {
        let partial = PartialConfig::default().with_env(|key| {
            (key == env_vars::DEFAULT_COMMAND).then(|| "three".to_string())
        });
        assert_eq!(partial.default_command.as_deref(), Some("three"));
        assert!(PartialConfig::default().with_env(no_env).default_command.is_none());
    }

    #[test]
    fn test_find_manifest_walks_up_and_stops_at_git() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "name = \"up\"").unwrap();

        assert_eq!(find_manifest(&nested), Some(dir.path().join(MANIFEST_FILE)));

        std::fs::create_dir(dir.path().join("a/.git")).unwrap();
        assert_eq!(find_manifest(&nested), None);
    }

    #[test]
    fn test_find_manifest_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("1/2/3/4/5/6");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "").unwrap();

        assert!(find_manifest(&deep).is_none());
        assert!(find_manifest(&dir.path().join("1/2/3/4/5")).is_some());
    }

    #[test]
    fn test_load_without_manifest_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let config = load(dir.path(), no_env).unwrap();
        assert_eq!(config.root, dir.path());
        assert!(config.manifest.is_none());
    }
}
