//! The [`Tool`] trait.

use async_trait::async_trait;
use serde_json::Value;

use mica_core::ToolDefinition;

/// A tool the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments object.
    fn parameters(&self) -> Value;

    /// Whether this tool delivers output directly to the end user
    /// (e.g. sends a chat message), bypassing the normal reply path.
    ///
    /// After a delivery tool runs, an empty model response means "already
    /// answered", not "try again".
    fn is_delivery(&self) -> bool {
        false
    }

    /// Execute the tool. Errors are turned into textual error results by
    /// the registry — they never abort a turn.
    async fn execute(&self, arguments: Value) -> anyhow::Result<String>;

    /// The schema entry sent to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters(),
        }
    }
}
