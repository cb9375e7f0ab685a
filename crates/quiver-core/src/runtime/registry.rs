//! Command registry keyed by name and alias.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::command::Command;

/// Outcome of [`CommandRegistry::register`].
#[derive(Debug, Clone)]
pub enum Registration {
    Added {
        command: Arc<Command>,
        /// Aliases another command already held.
        dropped_aliases: Vec<String>,
    },
    NameTaken { name: String },
}

impl Registration {
    pub fn command(self) -> Option<Arc<Command>> {
        match self {
            Registration::Added { command, .. } => Some(command),
            Registration::NameTaken { .. } => None,
        }
    }
}

/// Write-once map from names and aliases to commands.
///
/// The first command registered under a key keeps it. Keys remember their
/// registration order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    by_key: HashMap<String, Arc<Command>>,
    keys: Vec<String>,
    commands: Vec<Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` under its name and aliases.
    ///
    /// A taken name rejects the whole command. A taken alias is dropped
    /// from the command. The returned [`Registration`] says which.
    pub fn register(&mut self, mut command: Command) -> Registration {
        if self.by_key.contains_key(&command.name) {
            return Registration::NameTaken { name: command.name };
        }

        let mut accepted = Vec::with_capacity(command.aliases.len());
        let mut dropped_aliases = Vec::new();
        for alias in std::mem::take(&mut command.aliases) {
            if alias == command.name || accepted.contains(&alias) {
                continue;
            }
            if self.by_key.contains_key(&alias) {
                dropped_aliases.push(alias);
                continue;
            }
            accepted.push(alias);
        }
        command.aliases = accepted;

        let command = Arc::new(command);
        for key in std::iter::once(&command.name).chain(command.aliases.iter()) {
            self.by_key.insert(key.clone(), command.clone());
            self.keys.push(key.clone());
        }
        self.commands.push(command.clone());
        Registration::Added {
            command,
            dropped_aliases,
        }
    }

    /// [`CommandRegistry::register`], keeping only the registered command.
    pub fn add(&mut self, command: Command) -> Option<Arc<Command>> {
        self.register(command).command()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Command>> {
        self.by_key.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Every name and alias, in registration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Each command once, in registration order.
    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
