//! Built-in commands.

mod help;
mod version;

use std::sync::Arc;

use crate::domain::command::Command;

pub use help::{command_help, general_help, HelpHandler};
pub use version::VersionHandler;

pub const HELP: &str = "help";
pub const VERSION: &str = "version";

pub fn help_command() -> Command {
    Command::new(HELP)
        .with_description("Show help for the CLI or one of its commands")
        .with_alias("h")
        .with_handler(Arc::new(HelpHandler))
}

pub fn version_command() -> Command {
    Command::new(VERSION)
        .with_description("Output the version number")
        .with_aliases(["v", "V"])
        .with_handler(Arc::new(VersionHandler))
}
