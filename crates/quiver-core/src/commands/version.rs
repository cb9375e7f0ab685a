use async_trait::async_trait;
use serde_json::Value;

use crate::domain::command::CommandHandler;
use crate::domain::toolbox::Toolbox;
use crate::tools::Print;

/// Prints the CLI version.
pub struct VersionHandler;

#[async_trait]
impl CommandHandler for VersionHandler {
    async fn run(&self, toolbox: &mut Toolbox) -> anyhow::Result<Value> {
        let version = match (&toolbox.meta, toolbox.runtime()) {
            (Some(meta), _) => meta.version(),
            (None, Some(runtime)) => runtime.version().unwrap_or_else(|| "unknown".to_string()),
            (None, None) => "unknown".to_string(),
        };
        Print::for_toolbox(toolbox).info(&version);
        Ok(Value::String(version))
    }
}
