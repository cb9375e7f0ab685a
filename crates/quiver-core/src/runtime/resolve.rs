//! Finding the command an invocation asks for.

use std::sync::Arc;

use crate::domain::command::Command;
use crate::runtime::registry::CommandRegistry;

/// Outcome of matching invocation tokens against the registry.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A command matched, using the first `consumed` tokens.
    Found {
        command: Arc<Command>,
        consumed: usize,
    },
    /// No command name was given.
    Default,
    /// The first token names no command.
    NotFound { token: String },
}

fn is_option(token: &str) -> bool {
    token.starts_with('-')
}

/// Resolve `tokens` to a command.
///
/// Tried in order:
/// 1. the longest nested command path of two or more segments (the last
///    segment may be an alias)
/// 2. a name or alias on the first token
/// 3. a single-segment command path
pub fn resolve(registry: &CommandRegistry, tokens: &[String]) -> Resolution {
    let words: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .take_while(|t| !is_option(t))
        .collect();

    let Some(first) = words.first().copied() else {
        return Resolution::Default;
    };

    for len in (2..=words.len()).rev() {
        if let Some(command) = find_by_path(registry, &words[..len]) {
            return Resolution::Found {
                command,
                consumed: len,
            };
        }
    }

    if let Some(command) = registry.get(first) {
        return Resolution::Found {
            command,
            consumed: 1,
        };
    }

    if let Some(command) = registry
        .commands()
        .iter()
        .find(|c| c.command_path.len() == 1 && c.command_path[0] == first)
    {
        return Resolution::Found {
            command: command.clone(),
            consumed: 1,
        };
    }

    Resolution::NotFound {
        token: first.to_string(),
    }
}

/// A command whose path equals `words`, allowing an alias as the last word.
pub fn find_by_path(registry: &CommandRegistry, words: &[&str]) -> Option<Arc<Command>> {
    let (last, parents) = words.split_last()?;

    registry
        .commands()
        .iter()
        .find(|c| {
            let Some((path_last, path_parents)) = c.command_path.split_last() else {
                return false;
            };
            path_parents.len() == parents.len()
                && path_parents.iter().zip(parents).all(|(a, b)| a == b)
                && (path_last == last || c.aliases.iter().any(|a| a == last))
        })
        .cloned()
}
