//! Line-oriented stdout output for commands.

use std::io::Write;
use std::sync::Arc;

use crate::domain::toolbox::Toolbox;
use crate::logger::{Level, Verbosity};

/// Two aligned columns, left column padded to the widest entry.
///
/// Rows are indented by `indent` spaces; trailing whitespace is trimmed.
pub fn format_columns<L, R>(rows: &[(L, R)], indent: usize) -> String
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    let width = rows
        .iter()
        .map(|(left, _)| left.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    let pad = " ".repeat(indent);

    rows.iter()
        .map(|(left, right)| {
            let line = format!(
                "{}{:<width$}    {}",
                pad,
                left.as_ref(),
                right.as_ref(),
                width = width
            );
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Verbosity-aware printer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Print {
    verbosity: Verbosity,
}

impl Print {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// The toolbox's printer, or one built from the invocation's flags.
    pub fn for_toolbox(toolbox: &Toolbox) -> Arc<Print> {
        toolbox.print.clone().unwrap_or_else(|| {
            Arc::new(Print::new(Verbosity::from_args(&toolbox.parameters.raw)))
        })
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn emit(&self, level: Level, message: &str) -> bool {
        if !self.verbosity.allows(level) {
            return false;
        }
        let written = match level {
            Level::Warning | Level::Error => writeln!(std::io::stderr().lock(), "{}", message),
            Level::Debug | Level::Info => writeln!(std::io::stdout().lock(), "{}", message),
        };
        written.is_ok()
    }

    /// Print to stdout. Returns whether anything was written.
    pub fn info(&self, message: &str) -> bool {
        self.emit(Level::Info, message)
    }

    pub fn debug(&self, message: &str) -> bool {
        self.emit(Level::Debug, message)
    }

    /// Print to stderr.
    pub fn warning(&self, message: &str) -> bool {
        self.emit(Level::Warning, message)
    }

    pub fn error(&self, message: &str) -> bool {
        self.emit(Level::Error, message)
    }

    pub fn newline(&self) -> bool {
        self.emit(Level::Info, "")
    }

    /// Print rows as two aligned columns.
    pub fn columns<L, R>(&self, rows: &[(L, R)]) -> bool
    where
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.emit(Level::Info, &format_columns(rows, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_columns_aligns() {
        let rows = [("three (o, one)", "Returns 1, 2, 3"), ("help (h)", "Show help"), ("x", "")];
        let text = format_columns(&rows, 2);
        assert_eq!(
            text,
            "  three (o, one)    Returns 1, 2, 3\n  help (h)          Show help\n  x"
        );
    }

    #[test]
    fn test_format_columns_empty() {
        let rows: [(&str, &str); 0] = [];
        assert_eq!(format_columns(&rows, 2), "");
    }

    #[test]
    fn test_quiet_print_writes_nothing() {
        let print = Print::new(Verbosity::Quiet);
        assert!(!print.info("hidden"));
        assert!(!print.error("hidden"));
        assert!(!Print::new(Verbosity::Normal).debug("hidden"));
    }

    #[test]
    fn test_for_toolbox_reads_flags() {
        let mut toolbox = Toolbox::empty();
        toolbox.parameters.raw = vec!["three".into(), "--quiet".into()];
        assert_eq!(Print::for_toolbox(&toolbox).verbosity(), Verbosity::Quiet);

        toolbox.print = Some(Arc::new(Print::new(Verbosity::Debug)));
        assert_eq!(Print::for_toolbox(&toolbox).verbosity(), Verbosity::Debug);
    }
}
