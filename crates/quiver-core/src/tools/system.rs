//! Shelling out: program lookup and command execution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tokio::process::Command;

/// Runs commands from a fixed working directory.
#[derive(Debug, Clone)]
pub struct System {
    cwd: PathBuf,
}

impl System {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Full path of `program` on `PATH`.
    pub fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    /// Run `line` through the platform shell and return its stdout.
    ///
    /// A non-zero exit is an error carrying the command's stderr.
    pub async fn run(&self, line: &str) -> anyhow::Result<String> {
        tracing::debug!(command = %line, cwd = %self.cwd.display(), "Running shell command");

        let output = shell(line)
            .current_dir(&self.cwd)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to start `{}`", line))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` exited with {}: {}",
                line,
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(windows)]
fn shell(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

#[cfg(not(windows))]
fn shell(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}
