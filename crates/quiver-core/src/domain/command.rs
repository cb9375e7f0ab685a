//! Commands: named, invokable units of CLI behavior.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::args::OptionDefinition;
use crate::domain::toolbox::Toolbox;

/// The code behind a command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value>;
}

/// Shared handler reference.
pub type DynCommandHandler = Arc<dyn CommandHandler>;

/// Adapter turning a synchronous closure into a [`CommandHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&mut Toolbox) -> anyhow::Result<Value> + Send + Sync,
{
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value> {
        (self.0)(toolbox)
    }
}

/// Wrap a closure as a shared command handler.
pub fn handler_fn<F>(f: F) -> DynCommandHandler
where
    F: Fn(&mut Toolbox) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// A user-callable command.
#[derive(Clone, Default)]
pub struct Command {
    /// Name used to invoke the command.
    pub name: String,
    /// A tweet-sized summary.
    pub description: Option<String>,
    /// Other names the command answers to.
    pub aliases: Vec<String>,
    /// How to reach the command through nested directories, e.g. `["thing", "foo"]`.
    pub command_path: Vec<String>,
    /// Left out of listings, still runnable.
    pub hidden: bool,
    pub handler: Option<DynCommandHandler>,
    /// The manifest the command was loaded from, if any.
    pub source_file: Option<PathBuf>,
    /// Command-specific option definitions.
    pub args: Vec<OptionDefinition>,
    /// Raw manifest contents (`Null` for commands built in code).
    pub metadata: Value,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            command_path: vec![name.clone()],
            name,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_command_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_handler(mut self, handler: DynCommandHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Shorthand for `with_handler(handler_fn(f))`.
    pub fn with_run<F>(self, f: F) -> Self
    where
        F: Fn(&mut Toolbox) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.with_handler(handler_fn(f))
    }

    pub fn with_arg(mut self, arg: OptionDefinition) -> Self {
        self.args.push(arg);
        self
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn has_alias(&self) -> bool {
        !self.aliases.is_empty()
    }

    /// Whether any of `names` is this command's name or one of its aliases.
    pub fn matches_alias<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().any(|n| {
            let n = n.as_ref();
            self.name == n || self.aliases.iter().any(|a| a == n)
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("command_path", &self.command_path)
            .field("hidden", &self.hidden)
            .field("has_handler", &self.handler.is_some())
            .field("source_file", &self.source_file)
            .finish()
    }
}
