//! Command-line entry point for Quiver apps.
//!
//! Reads `quiver.toml` from the working directory (or a parent), loads the
//! project's plugins and runs the requested command.

mod plugins;

use std::sync::Arc;

use anyhow::Result;
use quiver_core::config::{self, env_vars, RuntimeConfig};
use quiver_core::loader::{PluginOptions, PluginsOptions};
use quiver_core::{Runtime, TracingLogger, Verbosity};

fn init_logging(verbosity: Verbosity) {
    // Check if JSON logging is requested (for machine consumption)
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.filter_directive()));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .without_time()
            .compact()
            .with_level(false)
            .init();
    }
}

async fn build_runtime(config: RuntimeConfig, verbosity: Verbosity) -> Result<Runtime> {
    let cwd = std::env::current_dir()?;
    let runtime = Runtime::builder()
        .config(config.clone())
        .cwd(cwd)
        .logger(Arc::new(TracingLogger::new(verbosity)))
        .build();

    runtime.add_core_extensions();
    runtime.add_default_commands();
    runtime.add_command(plugins::plugins_command());

    if let Some(src) = &config.src {
        runtime.load_modules(src).await?;
    }

    let plugin_options = PluginOptions::from_config(&config);
    for dir in &config.plugins {
        runtime.add_plugin(dir, plugin_options.clone()).await?;
    }
    for dir in &config.plugin_dirs {
        let options = PluginsOptions {
            matching: dir.matching.clone(),
            plugin: plugin_options.clone().hidden(dir.hidden),
        };
        runtime.add_plugins(&dir.path, options).await?;
    }

    Ok(runtime)
}

#[tokio::main]
async fn main() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let verbosity = Verbosity::from_args(&argv);
    init_logging(verbosity);

    let cwd = std::env::current_dir()?;
    let config = config::load(&cwd, |key| std::env::var(key).ok())?;
    tracing::debug!(name = %config.name, manifest = ?config.manifest, "Configuration loaded");

    let runtime = build_runtime(config, verbosity).await?;

    match runtime.run(argv).await? {
        Some(_) => Ok(()),
        // nothing ran; the reason has been logged
        None => std::process::exit(1),
    }
}
