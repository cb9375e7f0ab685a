//! Turning command manifests into [`Command`]s.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::args::{truthy, OptionDefinition};
use crate::domain::command::Command;
use crate::error::{LoadError, LoadResult, ModuleError};
use crate::loader::host::ModuleHost;
use crate::loader::patterns::{find_files, FilePatterns};
use crate::loader::{module, DiscoveryPolicy, FileOptions, LoadStrategy, LoaderOptions};
use crate::probe;
use crate::runtime::Runtime;

/// Name of the directory command paths are measured from.
const COMMANDS_DIR: &str = "commands";

/// File name up to the first dot: `three.test.toml` gives `three`.
pub(crate) fn file_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name,
    }
}

/// Command path from a file's location below its nearest `commands`
/// directory, e.g. `commands/thing/foo.toml` gives `["thing", "foo"]`.
///
/// A file named like its parent directory collapses into it, so
/// `commands/foo/foo.toml` gives `["foo"]`. Without a `commands` ancestor
/// the path is just the stem.
pub fn derive_command_path(path: &Path) -> Vec<String> {
    let stem = file_stem(path);
    let segments: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let parents = &segments[..segments.len().saturating_sub(1)];
    let Some(index) = parents.iter().rposition(|s| s == COMMANDS_DIR) else {
        return vec![stem];
    };

    let mut command_path: Vec<String> = parents[index + 1..].to_vec();
    command_path.push(stem);

    let len = command_path.len();
    if len >= 2 && command_path[len - 1] == command_path[len - 2] {
        command_path.pop();
    }
    command_path
}

/// `alias` may be one string or a list; `null` entries are dropped.
fn normalize_aliases(manifest: &Map<String, Value>) -> Vec<String> {
    let collect = |value: &Value| -> Vec<String> {
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    };

    let mut aliases: Vec<String> = ["alias", "aliases"]
        .iter()
        .filter_map(|key| manifest.get(*key))
        .flat_map(collect)
        .collect();
    aliases.dedup();
    aliases
}

fn parse_args(path: &Path, manifest: &Map<String, Value>) -> LoadResult<Vec<OptionDefinition>> {
    let invalid = |message: String| -> LoadError {
        ModuleError::Evaluation {
            path: path.to_path_buf(),
            message: format!("invalid \"args\": {}", message),
        }
        .into()
    };

    let definitions: Vec<OptionDefinition> = match manifest.get("args") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(args) => serde_json::from_value(args.clone()).map_err(|e| invalid(e.to_string()))?,
    };
    for definition in &definitions {
        definition.validate().map_err(invalid)?;
    }
    Ok(definitions)
}

/// Load a single command manifest.
pub async fn load_command_from_file(
    path: &Path,
    host: &ModuleHost,
    options: &FileOptions,
) -> LoadResult<Command> {
    if probe::is_blank(path) {
        return Err(LoadError::BlankPath {
            kind: "command",
            path: path.display().to_string(),
        });
    }
    if !probe::is_file(path) {
        return Err(LoadError::CommandNotAFile(path.to_path_buf()));
    }

    let default_name = file_stem(path);
    let command_path = options
        .command_path
        .clone()
        .unwrap_or_else(|| derive_command_path(path));

    let value = module::load(path, options.strategy).await?;
    let Some(manifest) = value.as_ref().and_then(Value::as_object) else {
        return Err(LoadError::InvalidCommand { name: default_name });
    };
    let Some(run) = manifest.get("run").and_then(Value::as_str) else {
        return Err(LoadError::InvalidCommand { name: default_name });
    };
    let handler = host
        .handler(run)
        .ok_or_else(|| ModuleError::DependencyNotFound {
            path: path.to_path_buf(),
            dependency: run.to_string(),
        })?;

    let name = manifest
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .or_else(|| command_path.last().cloned())
        .unwrap_or(default_name);

    Ok(Command {
        name,
        description: manifest
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        aliases: normalize_aliases(manifest),
        hidden: manifest.get("hidden").is_some_and(truthy),
        handler: Some(handler),
        source_file: Some(path.to_path_buf()),
        args: parse_args(path, manifest)?,
        metadata: Value::Object(manifest.clone()),
        command_path,
    })
}

/// Loads every command file in a directory tree.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    dir: PathBuf,
    options: LoaderOptions,
    patterns: FilePatterns,
}

impl CommandLoader {
    pub fn new(dir: impl Into<PathBuf>, options: LoaderOptions) -> LoadResult<Self> {
        let dir = dir.into();
        if !probe::is_dir(&dir) {
            return Err(LoadError::NotADirectory {
                kind: "command",
                path: dir,
            });
        }
        let patterns = options.file_patterns()?;
        Ok(Self {
            dir,
            options,
            patterns,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the commands without registering them. Results are in path
    /// order; with [`DiscoveryPolicy::Abort`] the first error ends the list.
    pub async fn load(&self, host: &ModuleHost) -> LoadResult<Vec<LoadResult<Command>>> {
        let files = find_files(&self.dir, &self.patterns)?;
        let file_options = FileOptions {
            command_path: None,
            strategy: self.options.strategy,
        };

        let results = match self.options.strategy {
            LoadStrategy::Async => {
                join_all(
                    files
                        .iter()
                        .map(|file| load_command_from_file(file, host, &file_options)),
                )
                .await
            }
            LoadStrategy::Blocking => {
                let mut results = Vec::with_capacity(files.len());
                for file in &files {
                    let result = load_command_from_file(file, host, &file_options).await;
                    let failed = result.is_err();
                    results.push(result);
                    if failed && self.options.policy == DiscoveryPolicy::Abort {
                        break;
                    }
                }
                results
            }
        };
        Ok(results)
    }

    /// Load and register every command, in path order.
    ///
    /// Returns the commands that were registered. Duplicates rejected by
    /// the registry are left out.
    pub async fn run(&self, runtime: &Runtime) -> LoadResult<Vec<Arc<Command>>> {
        let mut registered = Vec::new();

        for result in self.load(runtime.host()).await? {
            match result {
                Ok(mut command) => {
                    if self.options.hidden {
                        command.hidden = true;
                    }
                    if let Some(command) = runtime.add_command(command) {
                        registered.push(command);
                    }
                }
                Err(e) if self.options.policy == DiscoveryPolicy::SkipAndWarn => {
                    runtime.logger().warning(&format!("Skipping command: {}", e), None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(registered)
    }
}
