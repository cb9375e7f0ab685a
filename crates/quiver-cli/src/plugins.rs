//! The `plugins` command: lists the plugins this app loaded.

use anyhow::Context;
use quiver_core::tools::Print;
use quiver_core::Command;
use serde_json::{json, Value};

pub fn plugins_command() -> Command {
    Command::new("plugins")
        .with_description("List the loaded plugins")
        .with_run(|toolbox| {
            let runtime = toolbox
                .runtime()
                .context("toolbox is not attached to a runtime")?;
            let plugins = runtime.plugins();
            let print = Print::for_toolbox(toolbox);

            if plugins.is_empty() {
                print.info("No plugins loaded.");
                return Ok(json!([]));
            }

            let rows: Vec<(String, String)> = plugins
                .iter()
                .map(|p| {
                    let name = if p.hidden {
                        format!("{} (hidden)", p.name)
                    } else {
                        p.name.clone()
                    };
                    (name, p.root.display().to_string())
                })
                .collect();
            print.columns(&rows);

            Ok(Value::Array(
                plugins.iter().map(|p| Value::String(p.name.clone())).collect(),
            ))
        })
}
