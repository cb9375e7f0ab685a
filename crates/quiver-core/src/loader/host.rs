//! Handler table that module manifests refer to by name.
//!
//! A command manifest's `run` and an extension manifest's `execute` are
//! looked up here. The host comes with a few `builtin:` entries so that a
//! plugin made only of manifests can still do useful work.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::command::{CommandHandler, DynCommandHandler};
use crate::domain::extension::{DynExtensionSetup, Extension, ExtensionSetup};
use crate::domain::toolbox::Toolbox;
use crate::tools::Print;

pub const BUILTIN_VALUE: &str = "builtin:value";
pub const BUILTIN_PRINT: &str = "builtin:print";
pub const BUILTIN_EXEC: &str = "builtin:exec";
pub const BUILTIN_SLOT: &str = "builtin:slot";

#[derive(Default)]
struct HostTables {
    handlers: HashMap<String, DynCommandHandler>,
    setups: HashMap<String, DynExtensionSetup>,
}

/// Named command handlers and extension setups.
///
/// Cloning is cheap; clones share the same tables.
#[derive(Clone, Default)]
pub struct ModuleHost {
    tables: Arc<RwLock<HostTables>>,
}

impl ModuleHost {
    /// An empty host with no builtins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A host with the `builtin:` handlers registered.
    pub fn new() -> Self {
        let host = Self::empty();
        host.register_handler(BUILTIN_VALUE, Arc::new(ValueHandler));
        host.register_handler(BUILTIN_PRINT, Arc::new(PrintHandler));
        host.register_handler(BUILTIN_EXEC, Arc::new(ExecHandler));
        host.register_setup(BUILTIN_SLOT, Arc::new(SlotSetup));
        host
    }

    /// Register a command handler. Replaces any handler of the same name.
    pub fn register_handler(&self, name: impl Into<String>, handler: DynCommandHandler) {
        let name = name.into();
        if self.tables.write().handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(handler = %name, "Replaced command handler");
        }
    }

    /// Register an extension setup. Replaces any setup of the same name.
    pub fn register_setup(&self, name: impl Into<String>, setup: DynExtensionSetup) {
        let name = name.into();
        if self.tables.write().setups.insert(name.clone(), setup).is_some() {
            tracing::debug!(setup = %name, "Replaced extension setup");
        }
    }

    pub fn handler(&self, name: &str) -> Option<DynCommandHandler> {
        self.tables.read().handlers.get(name).cloned()
    }

    pub fn setup(&self, name: &str) -> Option<DynExtensionSetup> {
        self.tables.read().setups.get(name).cloned()
    }

    pub fn handler_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ModuleHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("ModuleHost")
            .field("handlers", &tables.handlers.len())
            .field("setups", &tables.setups.len())
            .finish()
    }
}

fn manifest_field<'a>(toolbox: &'a Toolbox, key: &str) -> Option<&'a Value> {
    toolbox.command.as_ref().and_then(|c| c.metadata.get(key))
}

/// Returns the manifest's `value`.
struct ValueHandler;

#[async_trait]
impl CommandHandler for ValueHandler {
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value> {
        Ok(manifest_field(toolbox, "value").cloned().unwrap_or(Value::Null))
    }
}

/// Prints the manifest's `message`.
struct PrintHandler;

#[async_trait]
impl CommandHandler for PrintHandler {
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value> {
        let message = manifest_field(toolbox, "message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Print::for_toolbox(toolbox).info(&message);
        Ok(Value::String(message))
    }
}

/// Runs the manifest's `exec` through the system tool, positional
/// arguments appended.
struct ExecHandler;

#[async_trait]
impl CommandHandler for ExecHandler {
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value> {
        let exec = manifest_field(toolbox, "exec")
            .and_then(Value::as_str)
            .context("\"exec\" must be a command line")?;
        let system = toolbox
            .system
            .clone()
            .context("the system extension is not loaded")?;

        let mut line = exec.to_string();
        for arg in &toolbox.parameters.array {
            line.push(' ');
            line.push_str(arg);
        }

        let output = system.run(&line).await?;
        let output = output.trim_end().to_string();
        if !output.is_empty() {
            Print::for_toolbox(toolbox).info(&output);
        }
        Ok(Value::String(output))
    }
}

/// Stores the manifest's `value` in a slot named after the extension.
struct SlotSetup;

#[async_trait]
impl ExtensionSetup for SlotSetup {
    async fn setup(&self, toolbox: &mut Toolbox, extension: &Extension) -> anyhow::Result<()> {
        let value = extension.metadata.get("value").cloned().unwrap_or(Value::Null);
        toolbox.set_slot(extension.name.clone(), value);
        Ok(())
    }
}
