//! Plugins group the commands and extensions found under one directory.

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::command::Command;
use crate::domain::extension::Extension;

/// A directory of commands and extensions.
#[derive(Debug, Clone, Default)]
pub struct Plugin {
    pub name: String,
    pub description: Option<String>,
    /// Directory the plugin was loaded from.
    pub root: PathBuf,
    pub commands: Vec<Arc<Command>>,
    pub extensions: Vec<Arc<Extension>>,
    /// Every command of a hidden plugin is hidden.
    pub hidden: bool,
}

impl Plugin {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            ..Default::default()
        }
    }

    /// Whether this plugin owns `command` (compared by identity).
    pub fn owns(&self, command: &Arc<Command>) -> bool {
        self.commands.iter().any(|c| Arc::ptr_eq(c, command))
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }
}
