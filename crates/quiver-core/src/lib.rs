//! Quiver core: build command-line apps out of plugin directories.
//!
//! A [`Runtime`] discovers commands and extensions from plugin directories,
//! resolves an invocation to a command (by name, alias or nested path),
//! assembles a [`Toolbox`] by running every extension in order and hands it
//! to the command's handler.
//!
//! ```no_run
//! use quiver_core::prelude::*;
//! use serde_json::json;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let runtime = Runtime::new("movie");
//! runtime.add_core_extensions();
//! runtime.add_default_commands();
//! runtime.add_command(Command::new("three").with_run(|_| Ok(json!([1, 2, 3]))));
//!
//! let toolbox = runtime.run("three").await?;
//! assert_eq!(toolbox.and_then(|t| t.result), Some(json!([1, 2, 3])));
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod extensions;
pub mod loader;
pub mod logger;
pub mod probe;
pub mod runtime;
pub mod tools;

pub use args::{OptionDefinition, OptionKind, RawCommand};
pub use config::{PartialConfig, RuntimeConfig};
pub use domain::{
    find_alternatives, handler_fn, setup_fn, Command, CommandHandler, Extension, ExtensionSetup,
    Parameters, Plugin, Toolbox,
};
pub use error::{LoadError, ModuleError, RuntimeError};
pub use loader::{
    DiscoveryPolicy, LoadStrategy, LoaderOptions, ModuleHost, PluginOptions, PluginsOptions,
};
pub use logger::{BufferedLogger, Level, Logger, TracingLogger, Verbosity};
pub use runtime::{Runtime, RuntimeBuilder};

/// Commonly used types.
pub mod prelude {
    pub use crate::args::{OptionDefinition, OptionKind, RawCommand};
    pub use crate::domain::{
        handler_fn, setup_fn, Command, CommandHandler, Extension, ExtensionSetup, Plugin, Toolbox,
    };
    pub use crate::error::{LoadError, ModuleError, RuntimeError};
    pub use crate::loader::{ModuleHost, PluginOptions, PluginsOptions};
    pub use crate::logger::{Logger, Verbosity};
    pub use crate::runtime::Runtime;
}
