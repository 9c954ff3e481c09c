//! The [`ChatProvider`] trait and its request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mica_core::{Message, ToolCallRequest, ToolDefinition};

use crate::errors::ProviderError;

/// Per-call options for a chat completion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Model override; `None` uses the provider default.
    pub model: Option<String>,
    /// Output token budget.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// One chat completion from the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Text content, if any.
    pub content: Option<String>,
    /// Requested tool calls, if any.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Reasoning trace from thinking models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl ChatResponse {
    /// Whether the model requested any tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Trimmed text content, or `None` when absent or blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A chat model the agent can call.
///
/// Implementations own their HTTP client, auth, and timeouts. A `chat` call
/// either returns a well-formed [`ChatResponse`] or raises a
/// [`ProviderError`] — partial responses are the implementation's problem.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one chat completion.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError>;

    /// The model used when [`ChatOptions::model`] is `None`.
    fn default_model(&self) -> &str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
