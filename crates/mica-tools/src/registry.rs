//! Tool registry — name → schema + executable.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use mica_core::ToolDefinition;

use crate::traits::Tool;

/// Registry of available tools.
///
/// Execution is infallible from the caller's perspective: missing tools and
/// tool failures come back as textual error content so the model can react,
/// per the turn engine's error policy.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let _ = self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schema entries for every registered tool.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        // Stable order keeps prompts reproducible across runs.
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Whether the named tool delivers output directly to the user.
    #[must_use]
    pub fn is_delivery(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|t| t.is_delivery())
    }

    /// Execute a tool by name, turning every failure into textual error
    /// content.
    pub async fn execute(&self, name: &str, arguments: Value) -> String {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "unknown tool requested");
            return format!("Error: unknown tool: {name}");
        };
        debug!(tool = name, "executing tool");
        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                format!("Error: {e}")
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
