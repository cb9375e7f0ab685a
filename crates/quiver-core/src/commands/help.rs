use async_trait::async_trait;
use serde_json::Value;

use crate::args::{global_arguments, merge_arguments, OptionDefinition};
use crate::domain::alternatives::not_available_message;
use crate::domain::command::{Command, CommandHandler};
use crate::domain::toolbox::Toolbox;
use crate::runtime::{Resolution, Runtime};
use crate::tools::{format_columns, Print};

/// Prints the command listing, or help for one command.
///
/// The command comes from the `command` option (set when `--help` was
/// passed to another command) or from the positional arguments.
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value> {
        let runtime = toolbox
            .runtime()
            .ok_or_else(|| anyhow::anyhow!("toolbox is not attached to a runtime"))?;

        let requested = toolbox
            .parameters
            .options
            .get("command")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                (!toolbox.parameters.array.is_empty()).then(|| toolbox.parameters.string())
            });

        let text = match requested {
            Some(name) => command_help(&runtime, &name),
            None => {
                let version = match &toolbox.meta {
                    Some(meta) => meta.version(),
                    None => runtime.version().unwrap_or_else(|| "unknown".to_string()),
                };
                general_help(&runtime, &version)
            }
        };

        Print::for_toolbox(toolbox).info(&text);
        Ok(Value::String(text))
    }
}

fn listing_name(command: &Command) -> String {
    let path = command.command_path.join(" ");
    if command.aliases.is_empty() {
        path
    } else {
        format!("{} ({})", path, command.aliases.join(", "))
    }
}

fn option_rows(definitions: &[OptionDefinition]) -> Vec<(String, String)> {
    definitions
        .iter()
        .map(|d| (d.usage(), d.description.clone().unwrap_or_default()))
        .collect()
}

/// Listing of every visible command and the global options.
pub fn general_help(runtime: &Runtime, version: &str) -> String {
    let mut commands: Vec<_> = runtime
        .commands()
        .into_iter()
        .filter(|c| !c.hidden)
        .collect();
    commands.sort_by(|a, b| a.command_path.cmp(&b.command_path));

    let rows: Vec<(String, String)> = commands
        .iter()
        .map(|c| (listing_name(c), c.description.clone().unwrap_or_default()))
        .collect();

    format!(
        "{} version {}\n\nCommands:\n{}\n\nOptions:\n{}",
        runtime.name(),
        version,
        format_columns(&rows, 2),
        format_columns(&option_rows(&global_arguments()), 2)
    )
}

/// Usage, aliases and options of the command `name` resolves to.
///
/// Unknown names produce the "not an available command" message.
pub fn command_help(runtime: &Runtime, name: &str) -> String {
    let words: Vec<String> = name.split_whitespace().map(str::to_string).collect();
    let command = match runtime.resolve(&words) {
        Resolution::Found { command, .. } => command,
        Resolution::Default | Resolution::NotFound { .. } => {
            return not_available_message(name, &runtime.command_keys());
        }
    };

    let mut sections = vec![format!(
        "Usage: {} {} [options]",
        runtime.name(),
        command.command_path.join(" ")
    )];
    if let Some(description) = &command.description {
        sections.push(description.clone());
    }
    if command.has_alias() {
        sections.push(format!("Aliases: {}", command.aliases.join(", ")));
    }
    let definitions = merge_arguments(&command.args, &global_arguments());
    sections.push(format!(
        "Options:\n{}",
        format_columns(&option_rows(&definitions), 2)
    ));

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::OptionKind;

    fn runtime() -> Runtime {
        let runtime = Runtime::builder().name("movie").cwd("/").build();
        runtime.add_default_commands();
        runtime.add_command(
            Command::new("three")
                .with_description("Returns 1, 2, 3")
                .with_aliases(["o", "one"])
                .with_arg(
                    OptionDefinition::new("name", OptionKind::String)
                        .with_alias('n')
                        .with_description("Who to greet"),
                ),
        );
        runtime.add_command(Command::new("secret").with_hidden(true));
        runtime.add_command(Command::new("foo").with_command_path(["thing", "foo"]));
        runtime
    }

    #[test]
    fn test_general_help_lists_visible_commands() {
        let text = general_help(&runtime(), "1.0.0");

        assert!(text.starts_with("movie version 1.0.0\n\nCommands:\n"));
        assert!(text.contains("three (o, one)"));
        assert!(text.contains("Returns 1, 2, 3"));
        assert!(text.contains("version (v, V)"));
        assert!(text.contains("thing foo"));
        assert!(text.contains("--help, -h"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_command_help() {
        let runtime = runtime();
        let text = command_help(&runtime, "o");

        assert!(text.starts_with("Usage: movie three [options]"));
        assert!(text.contains("Aliases: o, one"));
        assert!(text.contains("--name, -n"));
        assert!(text.contains("Who to greet"));

        let text = command_help(&runtime, "thing foo");
        assert!(text.starts_with("Usage: movie thing foo [options]"));
    }

    #[test]
    fn test_command_help_unknown_suggests() {
        let text = command_help(&runtime(), "thre");
        assert!(text.starts_with("\"thre\" is not an available command. Did you mean:"));
        assert!(text.contains("    - three"));
    }

    #[tokio::test]
    async fn test_help_via_flag_and_positional() {
        let runtime = runtime();

        let toolbox = runtime.run("three --help --quiet").await.unwrap().unwrap();
        let text = toolbox.result.unwrap();
        assert!(text.as_str().unwrap().starts_with("Usage: movie three"));

        let toolbox = runtime.run("help three --quiet").await.unwrap().unwrap();
        let text = toolbox.result.unwrap();
        assert!(text.as_str().unwrap().starts_with("Usage: movie three"));

        let toolbox = runtime.run("--help --quiet").await.unwrap().unwrap();
        let text = toolbox.result.unwrap();
        assert!(text.as_str().unwrap().starts_with("movie version unknown"));
    }
}
