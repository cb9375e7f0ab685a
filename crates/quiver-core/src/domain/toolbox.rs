//! The per-invocation context handed to extensions and the command handler.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::{Map, Value};

use crate::domain::command::Command;
use crate::domain::plugin::Plugin;
use crate::logger::Logger;
use crate::runtime::{Runtime, RuntimeInner};
use crate::tools::{Meta, Print, System};

/// Parsed invocation arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    /// Parsed options keyed by long name. Boolean flags only appear when set.
    pub options: Map<String, Value>,
    /// The tokens the invocation started from.
    pub raw: Vec<String>,
    /// Name of the resolved command.
    pub command: Option<String>,
    /// Tokens left after the command path was consumed.
    pub argv: Vec<String>,
    /// Positional arguments not claimed by a default option.
    pub array: Vec<String>,
}

impl Parameters {
    pub fn first(&self) -> Option<&str> {
        self.array.first().map(String::as_str)
    }

    /// Positional arguments joined by a single space.
    pub fn string(&self) -> String {
        self.array.join(" ")
    }

    /// Whether an option is present and truthy.
    pub fn flag(&self, name: &str) -> bool {
        self.options.get(name).is_some_and(crate::args::truthy)
    }
}

/// Everything a command gets to work with.
///
/// Starts empty at the beginning of a run. Extensions fill it in order,
/// then the command handler receives it and its result is stored here.
#[derive(Default)]
pub struct Toolbox {
    pub result: Option<Value>,
    pub parameters: Parameters,
    pub command: Option<Arc<Command>>,
    /// Plugin that owns the resolved command.
    pub plugin: Option<Arc<Plugin>>,

    pub meta: Option<Arc<Meta>>,
    pub print: Option<Arc<Print>>,
    pub system: Option<Arc<System>>,
    pub logger: Option<Arc<dyn Logger>>,

    runtime: Weak<RuntimeInner>,
    slots: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Toolbox {
    /// A toolbox attached to no runtime.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn for_runtime(runtime: &Arc<RuntimeInner>) -> Self {
        Self {
            runtime: Arc::downgrade(runtime),
            ..Default::default()
        }
    }

    /// The runtime this toolbox was built by, if it is still alive.
    pub fn runtime(&self) -> Option<Runtime> {
        self.runtime.upgrade().map(Runtime::from_inner)
    }

    /// Store a value under `name`. An existing slot of that name is replaced.
    pub fn set_slot<T>(&mut self, name: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.slots.insert(name.into(), Box::new(value));
    }

    /// Typed read of a slot. `None` if missing or of another type.
    pub fn slot<T: Any>(&self, name: &str) -> Option<&T> {
        self.slots.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn slot_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.slots.get_mut(name).and_then(|v| v.downcast_mut::<T>())
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn slot_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbox")
            .field("result", &self.result)
            .field("parameters", &self.parameters)
            .field("command", &self.command.as_ref().map(|c| c.name.as_str()))
            .field("plugin", &self.plugin.as_ref().map(|p| p.name.as_str()))
            .field("meta", &self.meta.is_some())
            .field("print", &self.print.is_some())
            .field("system", &self.system.is_some())
            .field("logger", &self.logger.is_some())
            .field("slots", &self.slot_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_toolbox() {
        let toolbox = Toolbox::empty();
        assert!(toolbox.result.is_none());
        assert!(toolbox.command.is_none());
        assert!(toolbox.runtime().is_none());
        assert!(toolbox.slot_names().is_empty());
    }

    #[test]
    fn test_slots_are_typed_and_last_write_wins() {
        let mut toolbox = Toolbox::empty();
        toolbox.set_slot("greeting", "hi".to_string());
        assert_eq!(toolbox.slot::<String>("greeting").map(String::as_str), Some("hi"));
        assert!(toolbox.slot::<u32>("greeting").is_none());

        toolbox.set_slot("greeting", 7_u32);
        assert_eq!(toolbox.slot::<u32>("greeting"), Some(&7));
        assert!(toolbox.slot::<String>("greeting").is_none());

        if let Some(n) = toolbox.slot_mut::<u32>("greeting") {
            *n += 1;
        }
        assert_eq!(toolbox.slot::<u32>("greeting"), Some(&8));
    }

    #[test]
    fn test_parameter_helpers() {
        let mut params = Parameters {
            array: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        params.options.insert("force".into(), json!(true));
        params.options.insert("name".into(), json!(""));

        assert_eq!(params.first(), Some("a"));
        assert_eq!(params.string(), "a b");
        assert!(params.flag("force"));
        assert!(!params.flag("name"));
        assert!(!params.flag("missing"));
    }
}
