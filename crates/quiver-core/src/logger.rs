//! Diagnostic logger used by the runtime and exposed to commands.
//!
//! Verbosity is a plain value handed to a logger when it is built. Nothing
//! here reads or writes process-wide state.

use std::fmt;

use parking_lot::Mutex;

/// Output verbosity for a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    VeryVerbose,
    Debug,
}

impl Verbosity {
    /// Derive verbosity from raw invocation tokens.
    ///
    /// `--quiet`/`-q` silences output unless a louder flag is also present.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let has = |flags: &[&str]| args.iter().any(|a| flags.contains(&a.as_ref()));

        if has(&["--verbose", "-v"]) {
            Verbosity::Verbose
        } else if has(&["--very-verbose", "-vv"]) {
            Verbosity::VeryVerbose
        } else if has(&["--debug", "-vvv"]) {
            Verbosity::Debug
        } else if has(&["--quiet", "-q"]) {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    /// Whether messages of `level` are shown at this verbosity.
    pub fn allows(self, level: Level) -> bool {
        match level {
            Level::Debug => self == Verbosity::Debug,
            Level::Info | Level::Warning | Level::Error => self != Verbosity::Quiet,
        }
    }

    /// Default `tracing` directive for this verbosity.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose | Verbosity::VeryVerbose => "debug",
            Verbosity::Debug => "trace",
        }
    }
}

/// Message level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// Logger capability.
///
/// Every method returns the line it produced, or an empty string when the
/// message was filtered out. Implementations must never panic.
pub trait Logger: Send + Sync {
    /// Emit a message at `level`.
    fn log(&self, level: Level, message: &str, label: Option<&str>) -> String;

    /// Verbosity this logger was built with.
    fn verbosity(&self) -> Verbosity;

    fn debug(&self, message: &str, label: Option<&str>) -> String {
        self.log(Level::Debug, message, label)
    }

    fn info(&self, message: &str, label: Option<&str>) -> String {
        self.log(Level::Info, message, label)
    }

    fn warning(&self, message: &str, label: Option<&str>) -> String {
        self.log(Level::Warning, message, label)
    }

    fn error(&self, message: &str, label: Option<&str>) -> String {
        self.log(Level::Error, message, label)
    }
}

fn format_line(message: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("[{}] {}", label, message),
        _ => message.to_string(),
    }
}

/// Logger that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger {
    verbosity: Verbosity,
}

impl TracingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str, label: Option<&str>) -> String {
        if !self.verbosity.allows(level) {
            return String::new();
        }

        let line = format_line(message, label);
        match level {
            Level::Debug => tracing::debug!(target: "quiver", "{}", line),
            Level::Info => tracing::info!(target: "quiver", "{}", line),
            Level::Warning => tracing::warn!(target: "quiver", "{}", line),
            Level::Error => tracing::error!(target: "quiver", "{}", line),
        }
        line
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Logger that keeps every emitted line in memory.
///
/// Useful when embedding a runtime and in tests that assert on diagnostics.
#[derive(Debug, Default)]
pub struct BufferedLogger {
    verbosity: Verbosity,
    lines: Mutex<Vec<(Level, String)>>,
}

impl BufferedLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// All captured lines, oldest first.
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().clone()
    }

    /// Captured lines at `level`.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Whether any captured line at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|(l, line)| *l == level && line.contains(needle))
    }
}

impl Logger for BufferedLogger {
    fn log(&self, level: Level, message: &str, label: Option<&str>) -> String {
        if !self.verbosity.allows(level) {
            return String::new();
        }

        let line = format_line(message, label);
        self.lines.lock().push((level, line.clone()));
        line
    }

    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}
