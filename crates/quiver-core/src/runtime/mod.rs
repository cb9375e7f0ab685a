//! The runtime: registries, resolution and dispatch.
//!
//! A [`Runtime`] is a cheap handle; clones share state. Registration methods
//! take `&self` so discovery can run against a shared runtime. Registry
//! locks are never held across an `.await`.

mod discovery;
pub mod registry;
pub mod resolve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::args::{
    global_arguments, merge_arguments, parse_options, parse_raw_command, truthy, RawCommand,
};
use crate::commands;
use crate::config::RuntimeConfig;
use crate::domain::alternatives::not_available_message;
use crate::domain::command::Command;
use crate::domain::extension::Extension;
use crate::domain::plugin::Plugin;
use crate::domain::toolbox::{Parameters, Toolbox};
use crate::error::{Result, RuntimeError};
use crate::extensions;
use crate::loader::ModuleHost;
use crate::logger::{Logger, TracingLogger};

pub use registry::{CommandRegistry, Registration};
pub use resolve::{resolve, Resolution};

/// Logged when no command name was given and no default command exists.
pub const NO_DEFAULT_COMMAND: &str = "Couldn't find that command, and no default command set.";

pub(crate) struct RuntimeInner {
    config: RwLock<RuntimeConfig>,
    cwd: PathBuf,
    logger: Arc<dyn Logger>,
    host: ModuleHost,
    commands: RwLock<CommandRegistry>,
    extensions: RwLock<Vec<Arc<Extension>>>,
    plugins: RwLock<Vec<Arc<Plugin>>>,
    main_plugin: RwLock<Option<Arc<Plugin>>>,
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    cwd: Option<PathBuf>,
    logger: Option<Arc<dyn Logger>>,
    host: Option<ModuleHost>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.config.default_command = name.into();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Handler table for manifests. Defaults to [`ModuleHost::new`].
    pub fn host(mut self, host: ModuleHost) -> Self {
        self.host = Some(host);
        self
    }

    pub fn build(self) -> Runtime {
        let cwd = self
            .cwd
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| self.config.root.clone());

        Runtime::from_inner(Arc::new(RuntimeInner {
            config: RwLock::new(self.config),
            cwd,
            logger: self
                .logger
                .unwrap_or_else(|| Arc::new(TracingLogger::default())),
            host: self.host.unwrap_or_else(ModuleHost::new),
            commands: RwLock::new(CommandRegistry::new()),
            extensions: RwLock::new(Vec::new()),
            plugins: RwLock::new(Vec::new()),
            main_plugin: RwLock::new(None),
        }))
    }
}

/// Owns the registries and runs invocations.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// A runtime named `name` with default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder {
            config: RuntimeConfig::default(),
            cwd: None,
            logger: None,
            host: None,
        }
    }

    pub(crate) fn from_inner(inner: Arc<RuntimeInner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> String {
        self.inner.config.read().name.clone()
    }

    /// Configured version, if any.
    pub fn version(&self) -> Option<String> {
        self.inner.config.read().version.as_ref().map(ToString::to_string)
    }

    pub fn cwd(&self) -> &Path {
        &self.inner.cwd
    }

    pub fn config(&self) -> RuntimeConfig {
        self.inner.config.read().clone()
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        self.inner.logger.clone()
    }

    pub fn host(&self) -> &ModuleHost {
        &self.inner.host
    }

    pub fn default_command(&self) -> String {
        self.inner.config.read().default_command.clone()
    }

    /// Command run when an invocation names none.
    pub fn set_default_command(&self, name: impl Into<String>) {
        self.inner.config.write().default_command = name.into();
    }

    /// Register a command. See [`CommandRegistry::add`] for collisions.
    pub fn add_command(&self, command: Command) -> Option<Arc<Command>> {
        let registration = self.inner.commands.write().register(command);
        let logger = self.logger();
        match registration {
            Registration::Added {
                command,
                dropped_aliases,
            } => {
                for alias in &dropped_aliases {
                    logger.warning(
                        &format!(
                            "Ignoring alias \"{}\" of \"{}\", a command already uses it.",
                            alias, command.name
                        ),
                        None,
                    );
                }
                tracing::debug!(command = %command.name, aliases = ?command.aliases, "Registered command");
                Some(command)
            }
            Registration::NameTaken { name } => {
                logger.warning(
                    &format!("Ignoring command \"{}\", one with that name is registered.", name),
                    None,
                );
                None
            }
        }
    }

    /// Append an extension. Extensions set up in registration order.
    pub fn add_extension(&self, extension: Extension) -> Arc<Extension> {
        let extension = Arc::new(extension);
        tracing::debug!(extension = %extension.name, "Registered extension");
        self.inner.extensions.write().push(extension.clone());
        extension
    }

    /// Put the `meta`, `print`, `system` and `logger` extensions first.
    ///
    /// Extensions already registered under those names are left alone.
    pub fn add_core_extensions(&self) {
        let mut registered = self.inner.extensions.write();
        let core: Vec<Arc<Extension>> = extensions::core_extensions()
            .into_iter()
            .filter(|core| !registered.iter().any(|e| e.name == core.name))
            .map(Arc::new)
            .collect();
        registered.splice(0..0, core);
    }

    /// Register the built-in `help` and `version` commands.
    pub fn add_default_commands(&self) {
        self.add_command(commands::help_command());
        self.add_command(commands::version_command());
    }

    pub fn find_command(&self, key: &str) -> Option<Arc<Command>> {
        self.inner.commands.read().get(key)
    }

    /// Each command once, in registration order.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.inner.commands.read().commands().to_vec()
    }

    /// Every registered name and alias.
    pub fn command_keys(&self) -> Vec<String> {
        self.inner.commands.read().keys().to_vec()
    }

    pub fn extensions(&self) -> Vec<Arc<Extension>> {
        self.inner.extensions.read().clone()
    }

    pub fn plugins(&self) -> Vec<Arc<Plugin>> {
        self.inner.plugins.read().clone()
    }

    /// The application's own plugin, set by [`Runtime::load_modules`].
    pub fn plugin(&self) -> Option<Arc<Plugin>> {
        self.inner.main_plugin.read().clone()
    }

    /// Match invocation tokens against the registered commands.
    pub fn resolve(&self, tokens: &[String]) -> Resolution {
        resolve(&self.inner.commands.read(), tokens)
    }

    /// Plugin owning `command`, if it came from one.
    pub fn plugin_for(&self, command: &Arc<Command>) -> Option<Arc<Plugin>> {
        self.inner
            .plugins
            .read()
            .iter()
            .find(|p| p.owns(command))
            .cloned()
    }

    /// Run an invocation.
    ///
    /// `Ok(None)` means nothing ran: the command was unknown, there was no
    /// default command, or the command has no handler. The reason is
    /// logged. Errors are argument errors, missing `help`/`version`
    /// commands, and failures raised by extensions or the handler.
    pub async fn run(&self, raw: impl Into<RawCommand>) -> Result<Option<Toolbox>> {
        self.run_with_options(raw, Map::new()).await
    }

    /// [`Runtime::run`] with extra options merged over the parsed ones.
    pub async fn run_with_options(
        &self,
        raw: impl Into<RawCommand>,
        extra_options: Map<String, Value>,
    ) -> Result<Option<Toolbox>> {
        let raw_tokens = parse_raw_command(&raw.into());
        let logger = self.logger();

        let (command, consumed, explicit) = match self.resolve(&raw_tokens) {
            Resolution::Found { command, consumed } => (command, consumed, true),
            Resolution::Default => match self.find_command(&self.default_command()) {
                Some(command) => (command, 0, false),
                None => {
                    logger.error(NO_DEFAULT_COMMAND, None);
                    return Ok(None);
                }
            },
            Resolution::NotFound { token } => {
                let message = not_available_message(&token, &self.command_keys());
                logger.error(&message, None);
                return Ok(None);
            }
        };

        let argv = raw_tokens[consumed..].to_vec();
        let definitions = merge_arguments(&command.args, &global_arguments());
        let parsed = parse_options(&command.name, &definitions, &argv).map_err(|source| {
            RuntimeError::Arguments {
                command: command.name.clone(),
                source,
            }
        })?;

        let mut options = parsed.options;
        options.extend(extra_options);

        let command = if options.get("help").is_some_and(truthy) {
            let help = self
                .find_command(commands::HELP)
                .ok_or(RuntimeError::MissingCommand(commands::HELP))?;
            if explicit && !Arc::ptr_eq(&help, &command) {
                options.insert("command".to_string(), Value::String(command.name.clone()));
            }
            help
        } else if options.get("version").is_some_and(truthy) {
            self.find_command(commands::VERSION)
                .ok_or(RuntimeError::MissingCommand(commands::VERSION))?
        } else {
            command
        };

        let Some(handler) = command.handler.clone() else {
            logger.error(
                &format!("Command \"{}\" has no function to execute.", command.name),
                None,
            );
            return Ok(None);
        };

        tracing::debug!(command = %command.name, argv = ?argv, "Dispatching command");

        let mut toolbox = Toolbox::for_runtime(&self.inner);
        toolbox.parameters = Parameters {
            options,
            raw: raw_tokens,
            command: Some(command.name.clone()),
            argv,
            array: parsed.array,
        };
        toolbox.plugin = self.plugin_for(&command);
        toolbox.command = Some(command);

        for extension in self.extensions() {
            let Some(setup) = extension.setup.clone() else {
                logger.warning(
                    &format!("Extension \"{}\" has no setup, skipping.", extension.name),
                    None,
                );
                continue;
            };
            setup
                .setup(&mut toolbox, &extension)
                .await
                .map_err(|error| RuntimeError::Extension {
                    name: extension.name.clone(),
                    error,
                })?;
        }

        let result = handler.run(&mut toolbox).await.map_err(RuntimeError::Command)?;
        toolbox.result = Some(result);
        Ok(Some(toolbox))
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("name", &self.name())
            .field("commands", &self.command_keys())
            .field(
                "extensions",
                &self
                    .extensions()
                    .iter()
                    .map(|e| e.name.clone())
                    .collect::<Vec<_>>(),
            )
            .field("plugins", &self.plugins().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{BufferedLogger, Level, Verbosity};
    use serde_json::json;

    fn runtime_with_logger() -> (Runtime, Arc<BufferedLogger>) {
        let logger = Arc::new(BufferedLogger::new(Verbosity::Normal));
        let runtime = Runtime::builder()
            .name("movie")
            .cwd("/")
            .logger(logger.clone())
            .build();
        (runtime, logger)
    }

    #[tokio::test]
    async fn test_run_returns_result() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("three").with_run(|_| Ok(json!([1, 2, 3]))));

        let toolbox = runtime.run("three").await.unwrap().unwrap();
        assert_eq!(toolbox.result, Some(json!([1, 2, 3])));
        assert_eq!(toolbox.parameters.command.as_deref(), Some("three"));
        assert!(toolbox.runtime().is_some());
    }

    #[tokio::test]
    async fn test_unknown_command_logs_and_returns_none() {
        let (runtime, logger) = runtime_with_logger();
        runtime.add_command(Command::new("three").with_run(|_| Ok(Value::Null)));

        assert!(runtime.run("thre").await.unwrap().is_none());
        assert!(logger.contains(Level::Error, "\"thre\" is not an available command."));
        assert!(logger.contains(Level::Error, "    - three"));
    }

    #[tokio::test]
    async fn test_missing_default_command() {
        let (runtime, logger) = runtime_with_logger();
        assert!(runtime.run("").await.unwrap().is_none());
        assert!(logger.contains(Level::Error, NO_DEFAULT_COMMAND));
    }

    #[tokio::test]
    async fn test_default_command_runs_without_name() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("home").with_run(|_| Ok(json!("home"))));
        runtime.set_default_command("home");

        let toolbox = runtime.run(Vec::<String>::new()).await.unwrap().unwrap();
        assert_eq!(toolbox.result, Some(json!("home")));
    }

    #[tokio::test]
    async fn test_command_without_handler() {
        let (runtime, logger) = runtime_with_logger();
        runtime.add_command(Command::new("empty"));

        assert!(runtime.run("empty").await.unwrap().is_none());
        assert!(logger.contains(Level::Error, "Command \"empty\" has no function to execute."));
    }

    #[tokio::test]
    async fn test_help_flag_without_help_command() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("three").with_run(|_| Ok(Value::Null)));

        let err = runtime.run("three --help").await.unwrap_err();
        assert_eq!(err.to_string(), "Help command not found.");
        let err = runtime.run("three -V").await.unwrap_err();
        assert_eq!(err.to_string(), "Version command not found.");
    }

    #[tokio::test]
    async fn test_help_flag_redirects_with_command_name() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("three").with_run(|_| Ok(Value::Null)));
        runtime.add_command(Command::new("help").with_run(|toolbox| {
            Ok(toolbox
                .parameters
                .options
                .get("command")
                .cloned()
                .unwrap_or(Value::Null))
        }));

        let toolbox = runtime.run("three -h").await.unwrap().unwrap();
        assert_eq!(toolbox.result, Some(json!("three")));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("boom").with_run(|_| anyhow::bail!("kaboom")));

        let err = runtime.run("boom").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Command(_)));
        assert_eq!(err.to_string(), "kaboom");
    }

    #[tokio::test]
    async fn test_argument_error_propagates() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("three").with_run(|_| Ok(Value::Null)));

        let err = runtime.run("three --nope").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Arguments { .. }));
    }

    #[tokio::test]
    async fn test_extensions_run_in_order_before_handler() {
        let (runtime, logger) = runtime_with_logger();
        runtime.add_extension(Extension::new("first").with_setup_fn(|toolbox, _| {
            toolbox.set_slot("order", vec!["first".to_string()]);
            Ok(())
        }));
        runtime.add_extension(Extension::new("no-setup"));
        runtime.add_extension(Extension::new("second").with_setup_fn(|toolbox, _| {
            if let Some(order) = toolbox.slot_mut::<Vec<String>>("order") {
                order.push("second".to_string());
            }
            Ok(())
        }));
        runtime.add_command(Command::new("order").with_run(|toolbox| {
            Ok(json!(toolbox.slot::<Vec<String>>("order").cloned().unwrap_or_default()))
        }));

        let toolbox = runtime.run("order").await.unwrap().unwrap();
        assert_eq!(toolbox.result, Some(json!(["first", "second"])));
        assert!(logger.contains(Level::Warning, "no-setup"));
    }

    #[tokio::test]
    async fn test_extension_error_propagates() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_extension(
            Extension::new("broken").with_setup_fn(|_, _| anyhow::bail!("no way")),
        );
        runtime.add_command(Command::new("three").with_run(|_| Ok(Value::Null)));

        let err = runtime.run("three").await.unwrap_err();
        assert_eq!(err.to_string(), "extension 'broken' failed: no way");
    }

    #[tokio::test]
    async fn test_core_extensions_are_prepended_once() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_extension(Extension::new("custom"));
        runtime.add_core_extensions();
        runtime.add_core_extensions();

        let names: Vec<String> = runtime.extensions().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["meta", "print", "system", "logger", "custom"]);
    }

    #[tokio::test]
    async fn test_extra_options_and_positionals() {
        let (runtime, _) = runtime_with_logger();
        runtime.add_command(Command::new("echo").with_run(|toolbox| {
            Ok(json!({
                "array": toolbox.parameters.array,
                "flag": toolbox.parameters.options.get("injected"),
            }))
        }));

        let mut extra = Map::new();
        extra.insert("injected".to_string(), json!(true));
        let toolbox = runtime
            .run_with_options(vec!["echo", "a", "b"], extra)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(toolbox.result, Some(json!({"array": ["a", "b"], "flag": true})));
        assert_eq!(toolbox.parameters.raw, vec!["echo", "a", "b"]);
        assert_eq!(toolbox.parameters.argv, vec!["a", "b"]);
    }

    #[test]
    fn test_registration_collisions_log_warnings() {
        let (runtime, logger) = runtime_with_logger();
        assert!(runtime.add_command(Command::new("three")).is_some());
        assert!(runtime.add_command(Command::new("three")).is_none());
        let other = runtime
            .add_command(Command::new("other").with_alias("three"))
            .unwrap();

        assert!(other.aliases.is_empty());
        let warnings = logger.lines_at(Level::Warning);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Ignoring command \"three\""));
        assert!(warnings[1].contains("Ignoring alias \"three\" of \"other\""));
    }
}
