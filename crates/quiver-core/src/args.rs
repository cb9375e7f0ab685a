//! Option definitions and the argument parser built on clap's builder API.
//!
//! Commands declare their options as data. A parser is assembled per
//! invocation from the command's definitions merged with the global ones.

use std::collections::HashSet;

use clap::{Arg, ArgAction, ArgMatches};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Id of the catch-all positional collecting unclaimed arguments.
const REST_ID: &str = "__rest";

/// Group tag of the options every command accepts.
pub const GLOBAL_GROUP: &str = "global";

/// How an option's value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[default]
    Boolean,
    String,
    Number,
    List,
}

/// One option a command accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    #[serde(default)]
    pub alias: Option<char>,
    #[serde(default, rename = "type")]
    pub kind: OptionKind,
    /// Receives the first positional argument.
    #[serde(default)]
    pub default_option: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl OptionDefinition {
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Boolean)
    }

    pub fn with_alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn as_default_option(mut self) -> Self {
        self.default_option = true;
        self
    }

    /// Check the definition can become a command-line option.
    ///
    /// Names must be non-empty, must not start with `-` and must not contain
    /// whitespace. A short alias must not be `-` or whitespace.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("option name is empty".to_string());
        }
        if self.name.starts_with('-') {
            return Err(format!("option \"{}\" must not start with '-'", self.name));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(format!("option \"{}\" must not contain whitespace", self.name));
        }
        if self.name == REST_ID {
            return Err(format!("option name \"{}\" is reserved", REST_ID));
        }
        if let Some(alias) = self.alias {
            if alias == '-' || alias.is_whitespace() {
                return Err(format!("option \"{}\" has an invalid alias {:?}", self.name, alias));
            }
        }
        Ok(())
    }

    /// `--name, -a` as shown in help listings.
    pub fn usage(&self) -> String {
        match self.alias {
            Some(alias) => format!("--{}, -{}", self.name, alias),
            None => format!("--{}", self.name),
        }
    }
}

/// Options accepted by every command.
pub fn global_arguments() -> Vec<OptionDefinition> {
    let global = |def: OptionDefinition| def.with_group(GLOBAL_GROUP);
    vec![
        global(OptionDefinition::flag("help").with_alias('h').with_description("Show help")),
        global(
            OptionDefinition::flag("version")
                .with_alias('V')
                .with_description("Show the version"),
        ),
        global(
            OptionDefinition::flag("quiet")
                .with_alias('q')
                .with_description("Only print errors"),
        ),
        global(
            OptionDefinition::flag("verbose")
                .with_alias('v')
                .with_description("Print more output"),
        ),
        global(OptionDefinition::flag("very-verbose").with_description("Print even more output")),
        global(OptionDefinition::flag("debug").with_description("Print debug output")),
    ]
}

/// Command definitions followed by the globals they do not shadow.
///
/// A global is dropped when a command definition reuses its name or its
/// short alias. Neither input is modified.
pub fn merge_arguments(
    command_args: &[OptionDefinition],
    globals: &[OptionDefinition],
) -> Vec<OptionDefinition> {
    let names: HashSet<&str> = command_args.iter().map(|d| d.name.as_str()).collect();
    let aliases: HashSet<char> = command_args.iter().filter_map(|d| d.alias).collect();

    let shadowed = |g: &OptionDefinition| {
        names.contains(g.name.as_str()) || g.alias.is_some_and(|a| aliases.contains(&a))
    };

    command_args
        .iter()
        .cloned()
        .chain(globals.iter().filter(|g| !shadowed(g)).cloned())
        .collect()
}

/// Raw invocation input: either a whole line or pre-split tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCommand {
    Line(String),
    Tokens(Vec<String>),
}

impl From<&str> for RawCommand {
    fn from(line: &str) -> Self {
        RawCommand::Line(line.to_string())
    }
}

impl From<String> for RawCommand {
    fn from(line: String) -> Self {
        RawCommand::Line(line)
    }
}

impl From<Vec<String>> for RawCommand {
    fn from(tokens: Vec<String>) -> Self {
        RawCommand::Tokens(tokens)
    }
}

impl From<Vec<&str>> for RawCommand {
    fn from(tokens: Vec<&str>) -> Self {
        RawCommand::Tokens(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for RawCommand {
    fn from(tokens: &[&str]) -> Self {
        RawCommand::Tokens(tokens.iter().map(|t| t.to_string()).collect())
    }
}

/// Tokens of a raw command. Lines are split on whitespace.
pub fn parse_raw_command(raw: &RawCommand) -> Vec<String> {
    match raw {
        RawCommand::Line(line) => line.split_whitespace().map(str::to_string).collect(),
        RawCommand::Tokens(tokens) => tokens.clone(),
    }
}

/// Result of parsing a command's arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub options: Map<String, Value>,
    /// Positional arguments not claimed by a default option.
    pub array: Vec<String>,
}

/// Parse `tokens` against `definitions`.
///
/// Unknown options and malformed values are reported as clap errors.
pub fn parse_options(
    command: &str,
    definitions: &[OptionDefinition],
    tokens: &[String],
) -> Result<ParsedArgs, clap::Error> {
    let accepted = dedup_definitions(definitions);
    let matches = build_parser(command, &accepted).try_get_matches_from(tokens)?;
    Ok(collect(&accepted, &matches))
}

/// Drop definitions whose name or alias an earlier one already claimed.
fn dedup_definitions(definitions: &[OptionDefinition]) -> Vec<&OptionDefinition> {
    let mut names = HashSet::new();
    let mut aliases = HashSet::new();
    let mut positional_taken = false;
    let mut accepted = Vec::with_capacity(definitions.len());

    for def in definitions {
        if let Err(reason) = def.validate() {
            tracing::warn!(option = %def.name, %reason, "Skipping invalid option definition");
            continue;
        }
        if !names.insert(def.name.as_str()) {
            tracing::warn!(option = %def.name, "Skipping duplicate option definition");
            continue;
        }
        if let Some(alias) = def.alias {
            if !aliases.insert(alias) {
                tracing::warn!(option = %def.name, alias = %alias, "Short alias already taken");
                continue;
            }
        }
        if def.default_option {
            if positional_taken {
                tracing::warn!(option = %def.name, "Only one default option is allowed");
                continue;
            }
            positional_taken = true;
        }
        accepted.push(def);
    }
    accepted
}

fn build_parser(command: &str, definitions: &[&OptionDefinition]) -> clap::Command {
    let mut cmd = clap::Command::new(command.to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .allow_negative_numbers(true);

    let mut index = 1;
    for def in definitions {
        let mut arg = Arg::new(def.name.clone());
        if def.default_option {
            arg = arg.index(index).action(ArgAction::Set).required(false);
            index += 1;
        } else {
            arg = arg.long(def.name.clone());
            if let Some(alias) = def.alias {
                arg = arg.short(alias);
            }
            arg = match def.kind {
                OptionKind::Boolean => arg.action(ArgAction::SetTrue),
                OptionKind::String | OptionKind::Number => arg.action(ArgAction::Set),
                OptionKind::List => arg.action(ArgAction::Append),
            };
        }
        if def.kind == OptionKind::Number {
            arg = arg.value_parser(clap::value_parser!(f64));
        }
        if let Some(description) = &def.description {
            arg = arg.help(description.clone());
        }
        cmd = cmd.arg(arg);
    }

    cmd.arg(
        Arg::new(REST_ID)
            .index(index)
            .num_args(0..)
            .action(ArgAction::Append),
    )
}

fn collect(definitions: &[&OptionDefinition], matches: &ArgMatches) -> ParsedArgs {
    let mut options = Map::new();

    for def in definitions {
        let id = def.name.as_str();
        let value = match (def.kind, def.default_option) {
            (OptionKind::Boolean, false) => matches
                .try_get_one::<bool>(id)
                .ok()
                .flatten()
                .filter(|set| **set)
                .map(|_| Value::Bool(true)),
            (OptionKind::Number, _) => matches
                .try_get_one::<f64>(id)
                .ok()
                .flatten()
                .map(|n| number_value(*n)),
            (OptionKind::List, false) => matches
                .try_get_many::<String>(id)
                .ok()
                .flatten()
                .map(|values| Value::Array(values.cloned().map(Value::String).collect())),
            (OptionKind::List, true) => matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .map(|v| Value::Array(vec![Value::String(v.clone())])),
            _ => matches
                .try_get_one::<String>(id)
                .ok()
                .flatten()
                .map(|v| Value::String(v.clone())),
        };
        if let Some(value) = value {
            options.insert(def.name.clone(), value);
        }
    }

    let array = matches
        .try_get_many::<String>(REST_ID)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    ParsedArgs { options, array }
}

/// Integral values become JSON integers, everything else a float.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

/// Truthiness of an option value: `null`, `false`, `0` and `""` are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
