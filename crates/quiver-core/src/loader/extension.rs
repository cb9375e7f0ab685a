//! Turning extension manifests into [`Extension`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::domain::extension::Extension;
use crate::error::{LoadError, LoadResult, ModuleError};
use crate::loader::command::file_stem;
use crate::loader::host::ModuleHost;
use crate::loader::patterns::{find_files, FilePatterns};
use crate::loader::{describe_shape, module, DiscoveryPolicy, LoadStrategy, LoaderOptions};
use crate::probe;
use crate::runtime::Runtime;

/// Load a single extension manifest.
///
/// The manifest needs a string `name` and a string `execute` naming a
/// setup registered with the host.
pub async fn load_extension_from_file(
    path: &Path,
    host: &ModuleHost,
    strategy: LoadStrategy,
) -> LoadResult<Extension> {
    if probe::is_blank(path) {
        return Err(LoadError::BlankPath {
            kind: "extension",
            path: path.display().to_string(),
        });
    }
    if !probe::is_file(path) {
        return Err(LoadError::ExtensionNotAFile(path.to_path_buf()));
    }

    let value = module::load(path, strategy).await?;
    let manifest = value.as_ref().and_then(Value::as_object);
    let name = manifest
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty());
    let execute = manifest.and_then(|m| m.get("execute")).and_then(Value::as_str);

    let (Some(manifest), Some(name), Some(execute)) = (manifest, name, execute) else {
        return Err(LoadError::InvalidExtension {
            name: file_stem(path),
            found: describe_shape(value.as_ref()),
        });
    };

    let setup = host
        .setup(execute)
        .ok_or_else(|| ModuleError::DependencyNotFound {
            path: path.to_path_buf(),
            dependency: execute.to_string(),
        })?;

    Ok(Extension {
        name: name.to_string(),
        description: manifest
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        setup: Some(setup),
        source_file: Some(path.to_path_buf()),
        metadata: Value::Object(manifest.clone()),
    })
}

/// Loads every extension file in a directory tree.
#[derive(Debug, Clone)]
pub struct ExtensionLoader {
    dir: PathBuf,
    strategy: LoadStrategy,
    policy: DiscoveryPolicy,
    patterns: FilePatterns,
}

impl ExtensionLoader {
    pub fn new(dir: impl Into<PathBuf>, options: LoaderOptions) -> LoadResult<Self> {
        let dir = dir.into();
        if !probe::is_dir(&dir) {
            return Err(LoadError::NotADirectory {
                kind: "extension",
                path: dir,
            });
        }
        // `hidden` has no meaning for extensions
        let patterns = options.file_patterns()?;
        Ok(Self {
            dir,
            strategy: options.strategy,
            policy: options.policy,
            patterns,
        })
    }

    /// Load and register every extension, in path order.
    pub async fn run(&self, runtime: &Runtime) -> LoadResult<Vec<Arc<Extension>>> {
        let files = find_files(&self.dir, &self.patterns)?;
        let host = runtime.host();

        let results = match self.strategy {
            LoadStrategy::Async => {
                join_all(
                    files
                        .iter()
                        .map(|file| load_extension_from_file(file, host, self.strategy)),
                )
                .await
            }
            LoadStrategy::Blocking => {
                let mut results = Vec::with_capacity(files.len());
                for file in &files {
                    let result = load_extension_from_file(file, host, self.strategy).await;
                    let failed = result.is_err();
                    results.push(result);
                    if failed && self.policy == DiscoveryPolicy::Abort {
                        break;
                    }
                }
                results
            }
        };

        let mut registered = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(extension) => registered.push(runtime.add_extension(extension)),
                Err(e) if self.policy == DiscoveryPolicy::SkipAndWarn => {
                    runtime.logger().warning(&format!("Skipping extension: {}", e), None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(registered)
    }
}
