//! Error types for module loading, discovery and dispatch.
//!
//! The split mirrors where a failure is raised:
//! - [`ModuleError`] comes out of reading a single manifest file
//! - [`LoadError`] comes out of turning a manifest into a command/extension,
//!   or out of a loader pointed at something that is not a directory
//! - [`RuntimeError`] is everything `Runtime::run` lets escape to its caller

use std::path::PathBuf;

/// Errors raised while reading a module manifest from disk.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("path is required")]
    PathRequired,

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest itself is broken (syntax error and the like).
    #[error("{}: {message}", .path.display())]
    Evaluation { path: PathBuf, message: String },

    /// The manifest refers to something that does not exist.
    #[error("{}: cannot find dependency '{dependency}'", .path.display())]
    DependencyNotFound { path: PathBuf, dependency: String },
}

/// Errors raised while loading commands and extensions.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("couldn't load {kind} (file is blank): {path}")]
    BlankPath { kind: &'static str, path: String },

    #[error("couldn't load command (this isn't a file): {}", .0.display())]
    CommandNotAFile(PathBuf),

    #[error("couldn't load extension (not a file): {}", .0.display())]
    ExtensionNotAFile(PathBuf),

    #[error("couldn't load {kind} folder (not a directory): {}", .path.display())]
    NotADirectory { kind: &'static str, path: PathBuf },

    #[error("Couldn't load command {name} -- needs a \"run\" property with a function.")]
    InvalidCommand { name: String },

    #[error(
        "couldn't load {name}. Expected an object with \"name\" as string and \"execute\" as function, got {found}."
    )]
    InvalidExtension { name: String, found: String },

    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// Errors propagated out of `Runtime::run`.
///
/// Unknown commands and commands without a handler are *not* errors: they
/// are logged and `run` returns `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("{} command not found.", capitalize(.0))]
    MissingCommand(&'static str),

    #[error("invalid arguments for '{command}': {source}")]
    Arguments {
        command: String,
        #[source]
        source: clap::Error,
    },

    #[error("extension '{name}' failed: {error:#}")]
    Extension { name: String, error: anyhow::Error },

    #[error(transparent)]
    Command(anyhow::Error),
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result type for module loading.
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// Result type for loaders.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Result type for the runtime.
pub type Result<T> = std::result::Result<T, RuntimeError>;
