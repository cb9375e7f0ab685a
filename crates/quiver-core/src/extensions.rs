//! The core extensions: `meta`, `print`, `system` and `logger`.

use std::sync::Arc;

use anyhow::Context;

use crate::domain::extension::Extension;
use crate::domain::toolbox::Toolbox;
use crate::logger::Verbosity;
use crate::runtime::Runtime;
use crate::tools::{Meta, Print, System};

pub const META: &str = "meta";
pub const PRINT: &str = "print";
pub const SYSTEM: &str = "system";
pub const LOGGER: &str = "logger";

fn attached_runtime(toolbox: &Toolbox) -> anyhow::Result<Runtime> {
    toolbox
        .runtime()
        .context("toolbox is not attached to a runtime")
}

/// Core extensions in setup order.
pub fn core_extensions() -> Vec<Extension> {
    vec![
        Extension::new(META)
            .with_description("Name, version and location of the CLI")
            .with_setup_fn(|toolbox, _| {
                let runtime = attached_runtime(toolbox)?;
                let meta = Meta::new(runtime.name(), runtime.cwd())
                    .with_version(runtime.version())
                    .with_src(runtime.plugin().map(|p| p.root.clone()));
                toolbox.meta = Some(Arc::new(meta));
                Ok(())
            }),
        Extension::new(PRINT)
            .with_description("Verbosity-aware output")
            .with_setup_fn(|toolbox, _| {
                let verbosity = Verbosity::from_args(&toolbox.parameters.raw);
                toolbox.print = Some(Arc::new(Print::new(verbosity)));
                Ok(())
            }),
        Extension::new(SYSTEM)
            .with_description("Program lookup and shell commands")
            .with_setup_fn(|toolbox, _| {
                let runtime = attached_runtime(toolbox)?;
                toolbox.system = Some(Arc::new(System::new(runtime.cwd())));
                Ok(())
            }),
        Extension::new(LOGGER)
            .with_description("The runtime's logger")
            .with_setup_fn(|toolbox, _| {
                let runtime = attached_runtime(toolbox)?;
                toolbox.logger = Some(runtime.logger());
                Ok(())
            }),
    ]
}
