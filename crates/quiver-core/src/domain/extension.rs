//! Extensions add capabilities to the toolbox before a command runs.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::toolbox::Toolbox;

/// Setup code of an extension. Runs once per invocation.
#[async_trait]
pub trait ExtensionSetup: Send + Sync {
    async fn setup(&self, toolbox: &mut Toolbox, extension: &Extension) -> anyhow::Result<()>;
}

pub type DynExtensionSetup = Arc<dyn ExtensionSetup>;

/// Adapter turning a synchronous closure into an [`ExtensionSetup`].
pub struct FnSetup<F>(F);

#[async_trait]
impl<F> ExtensionSetup for FnSetup<F>
where
    F: Fn(&mut Toolbox, &Extension) -> anyhow::Result<()> + Send + Sync,
{
    async fn setup(&self, toolbox: &mut Toolbox, extension: &Extension) -> anyhow::Result<()> {
        (self.0)(toolbox, extension)
    }
}

/// Wrap a closure as a shared extension setup.
pub fn setup_fn<F>(f: F) -> DynExtensionSetup
where
    F: Fn(&mut Toolbox, &Extension) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnSetup(f))
}

/// A named toolbox extension.
#[derive(Clone, Default)]
pub struct Extension {
    pub name: String,
    pub description: Option<String>,
    pub setup: Option<DynExtensionSetup>,
    pub source_file: Option<PathBuf>,
    /// Raw manifest contents (`Null` for extensions built in code).
    pub metadata: Value,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_setup(mut self, setup: DynExtensionSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn with_setup_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut Toolbox, &Extension) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_setup(setup_fn(f))
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("has_setup", &self.setup.is_some())
            .field("source_file", &self.source_file)
            .finish()
    }
}
