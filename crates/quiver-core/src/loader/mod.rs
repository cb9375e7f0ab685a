//! Loading commands, extensions and plugins from disk.

pub mod command;
pub mod extension;
pub mod host;
pub mod module;
pub mod patterns;

use serde::Deserialize;

pub use command::{derive_command_path, load_command_from_file, CommandLoader};
pub use extension::{load_extension_from_file, ExtensionLoader};
pub use host::ModuleHost;
pub use module::load as load_module;
pub use patterns::{find_files, FilePatterns};

use crate::config::{default_command_patterns, RuntimeConfig};
use crate::error::LoadResult;

/// How module files are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadStrategy {
    /// `std::fs`, one file at a time.
    #[default]
    Blocking,
    /// `tokio::fs`; directory loads read all files concurrently.
    Async,
}

/// What a directory load does with a file that fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryPolicy {
    /// Stop at the first bad file. Files before it stay registered.
    #[default]
    Abort,
    /// Log a warning and keep going.
    SkipAndWarn,
}

/// Options for loading one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Use this path instead of deriving one from the file's location.
    pub command_path: Option<Vec<String>>,
    pub strategy: LoadStrategy,
}

/// Options for loading a directory of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Force every loaded command hidden.
    pub hidden: bool,
    pub patterns: Vec<String>,
    pub strategy: LoadStrategy,
    pub policy: DiscoveryPolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            hidden: false,
            patterns: default_command_patterns(),
            strategy: LoadStrategy::default(),
            policy: DiscoveryPolicy::default(),
        }
    }
}

impl LoaderOptions {
    /// Compiled `patterns`; an empty list means the default command patterns.
    pub fn file_patterns(&self) -> LoadResult<FilePatterns> {
        if self.patterns.is_empty() {
            FilePatterns::new(&default_command_patterns())
        } else {
            FilePatterns::new(&self.patterns)
        }
    }
}

/// Options for loading one plugin directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOptions {
    /// Overrides the name from `plugin.toml` or the directory.
    pub name: Option<String>,
    pub hidden: bool,
    pub loader: LoaderOptions,
}

impl PluginOptions {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            name: None,
            hidden: false,
            loader: LoaderOptions {
                hidden: false,
                patterns: config.command_patterns.clone(),
                strategy: config.load_strategy,
                policy: config.discovery_policy,
            },
        }
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Options for loading every plugin under a parent directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginsOptions {
    /// Glob on sub-directory names. All sub-directories when unset.
    pub matching: Option<String>,
    pub plugin: PluginOptions,
}

/// Short description of a value's shape for error messages.
pub(crate) fn describe_shape(value: Option<&serde_json::Value>) -> String {
    use serde_json::Value;

    match value {
        None | Some(Value::Null) => "nothing".to_string(),
        Some(Value::Bool(_)) => "a boolean".to_string(),
        Some(Value::Number(_)) => "a number".to_string(),
        Some(Value::String(_)) => "a string".to_string(),
        Some(Value::Array(_)) => "an array".to_string(),
        Some(Value::Object(map)) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("an object with keys [{}]", keys.join(", "))
        }
    }
}
