//! Plugin discovery on top of the command and extension loaders.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::plugin::Plugin;
use crate::error::{LoadError, LoadResult};
use crate::loader::{CommandLoader, ExtensionLoader, PluginOptions, PluginsOptions};
use crate::probe;
use crate::runtime::Runtime;

/// Optional per-plugin manifest.
pub const PLUGIN_MANIFEST: &str = "plugin.toml";

#[derive(Debug, Default, Deserialize)]
struct PluginManifest {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    hidden: bool,
}

fn read_plugin_manifest(dir: &Path) -> PluginManifest {
    let path = dir.join(PLUGIN_MANIFEST);
    if !probe::is_file(&path) {
        return PluginManifest::default();
    }

    match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|content| toml::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(manifest) => manifest,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "Ignoring unreadable plugin manifest");
            PluginManifest::default()
        }
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Runtime {
    /// Load the plugin in `dir`: commands from `dir/commands`, extensions
    /// from `dir/extensions`.
    ///
    /// A blank path, missing directory or file yields `Ok(None)`. Bad
    /// command or extension files fail according to the discovery policy.
    pub async fn add_plugin(
        &self,
        dir: impl AsRef<Path>,
        options: PluginOptions,
    ) -> LoadResult<Option<Arc<Plugin>>> {
        let dir = dir.as_ref();
        if probe::is_blank(dir) || !probe::is_dir(dir) {
            tracing::debug!(dir = %dir.display(), "Not a plugin directory, skipping");
            return Ok(None);
        }

        let manifest = read_plugin_manifest(dir);
        let hidden = options.hidden || manifest.hidden;
        let mut plugin = Plugin {
            name: options
                .name
                .or(manifest.name)
                .unwrap_or_else(|| dir_name(dir)),
            description: manifest.description,
            root: dir.to_path_buf(),
            hidden,
            ..Default::default()
        };

        let mut loader_options = options.loader;
        loader_options.hidden = loader_options.hidden || hidden;

        let commands_dir = dir.join("commands");
        if probe::is_dir(&commands_dir) {
            plugin.commands = CommandLoader::new(commands_dir, loader_options.clone())?
                .run(self)
                .await?;
        }

        let extensions_dir = dir.join("extensions");
        if probe::is_dir(&extensions_dir) {
            plugin.extensions = ExtensionLoader::new(extensions_dir, loader_options)?
                .run(self)
                .await?;
        }

        tracing::debug!(
            plugin = %plugin.name,
            commands = plugin.commands.len(),
            extensions = plugin.extensions.len(),
            "Loaded plugin"
        );

        let plugin = Arc::new(plugin);
        self.inner.plugins.write().push(plugin.clone());
        Ok(Some(plugin))
    }

    /// Load every sub-directory of `parent` whose name matches
    /// `options.matching` as a plugin, in name order.
    ///
    /// A `parent` that is not a directory yields no plugins.
    pub async fn add_plugins(
        &self,
        parent: impl AsRef<Path>,
        options: PluginsOptions,
    ) -> LoadResult<Vec<Arc<Plugin>>> {
        let parent = parent.as_ref();
        if probe::is_blank(parent) || !probe::is_dir(parent) {
            tracing::debug!(dir = %parent.display(), "Not a plugins directory, skipping");
            return Ok(Vec::new());
        }

        let matcher = options
            .matching
            .as_deref()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| LoadError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let entries = std::fs::read_dir(parent).map_err(|source| LoadError::ReadDir {
            path: parent.to_path_buf(),
            source,
        })?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .filter(|path| {
                let name = dir_name(path);
                !name.starts_with('.') && matcher.as_ref().map_or(true, |m| m.matches(&name))
            })
            .collect();
        dirs.sort();

        let mut plugins = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if let Some(plugin) = self.add_plugin(&dir, options.plugin.clone()).await? {
                plugins.push(plugin);
            }
        }
        Ok(plugins)
    }

    /// Load the application's own plugin from `dir` and remember it as the
    /// main plugin. Uses the runtime's configured patterns and policy.
    pub async fn load_modules(&self, dir: impl AsRef<Path>) -> LoadResult<Option<Arc<Plugin>>> {
        let options = PluginOptions::from_config(&self.config());
        let plugin = self.add_plugin(dir, options).await?;
        if let Some(plugin) = &plugin {
            *self.inner.main_plugin.write() = Some(plugin.clone());
        }
        Ok(plugin)
    }
}
