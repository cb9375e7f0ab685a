//! Core domain entities.

pub mod alternatives;
pub mod command;
pub mod extension;
pub mod plugin;
pub mod toolbox;

pub use alternatives::{find_alternatives, levenshtein, not_available_message};
pub use command::{handler_fn, Command, CommandHandler, DynCommandHandler, FnHandler};
pub use extension::{setup_fn, DynExtensionSetup, Extension, ExtensionSetup, FnSetup};
pub use plugin::Plugin;
pub use toolbox::{Parameters, Toolbox};
