//! The turn engine: one inbound message's model-call/tool-call cycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use mica_core::truncation::truncate_tool_result;
use mica_core::Message;
use mica_llm::{ChatOptions, ChatProvider};
use mica_tools::ToolRegistry;

use crate::errors::RuntimeError;

/// Backoff ceiling for empty-response retries, in seconds.
const MAX_BACKOFF_SECS: f64 = 10.0;

/// Knobs for [`TurnEngine::run_turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnEngineConfig {
    /// Maximum model-call iterations per turn.
    pub max_iterations: usize,
    /// Character budget applied to every raw tool result.
    pub tool_result_max_chars: usize,
    /// Retries allowed when the model returns neither text nor tool calls.
    pub empty_response_retries: u32,
}

impl Default for TurnEngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tool_result_max_chars: 3_000,
            empty_response_retries: 2,
        }
    }
}

/// Drives the repeated model-call → tool-dispatch cycle for one turn.
pub struct TurnEngine {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<ToolRegistry>,
    model: Option<String>,
    config: TurnEngineConfig,
}

impl TurnEngine {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<ToolRegistry>,
        model: Option<String>,
    ) -> Self {
        Self::with_config(provider, tools, model, TurnEngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    #[must_use]
    pub fn with_config(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<ToolRegistry>,
        model: Option<String>,
        config: TurnEngineConfig,
    ) -> Self {
        Self { provider, tools, model, config }
    }

    /// Run the model/tool loop until the model produces a final text
    /// reply, or until the iteration cap or empty-response budget runs
    /// out (`None`).
    ///
    /// Tool failures come back to the model as textual results; only
    /// provider transport errors propagate.
    #[instrument(skip_all, fields(messages = messages.len()))]
    pub async fn run_turn(
        &self,
        mut messages: Vec<Message>,
    ) -> Result<Option<String>, RuntimeError> {
        let definitions = self.tools.definitions();
        let tools = (!definitions.is_empty()).then_some(definitions.as_slice());
        let options = ChatOptions { model: self.model.clone(), ..ChatOptions::default() };

        let mut empty_retries: u32 = 0;
        let mut last_used_delivery = false;

        for iteration in 0..self.config.max_iterations {
            let response = self.provider.chat(&messages, tools, &options).await?;

            if response.has_tool_calls() {
                let calls = response.tool_calls.clone();
                messages.push(Message::assistant_with_tools(
                    response.content.clone().unwrap_or_default(),
                    calls.clone(),
                    response.reasoning_content.clone(),
                ));
                last_used_delivery = false;
                for call in &calls {
                    debug!(iteration, tool = %call.name, "dispatching tool call");
                    let raw = self.tools.execute(&call.name, call.arguments.clone()).await;
                    let result = truncate_tool_result(&raw, self.config.tool_result_max_chars);
                    messages.push(Message::tool_result(&call.id, result));
                    if self.tools.is_delivery(&call.name) {
                        last_used_delivery = true;
                    }
                }
                continue;
            }

            if let Some(text) = response.text() {
                return Ok(Some(text.to_owned()));
            }

            // Empty response: after a delivery tool the user already has
            // their answer, so stop quietly instead of retrying.
            if last_used_delivery {
                debug!(iteration, "empty response after delivery tool");
                return Ok(None);
            }
            if empty_retries >= self.config.empty_response_retries {
                warn!(iteration, "empty-response retries exhausted");
                return Ok(None);
            }
            let delay = empty_backoff(empty_retries);
            debug!(iteration, retry = empty_retries, delay_secs = delay, "empty response, backing off");
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            empty_retries += 1;
        }

        warn!(max_iterations = self.config.max_iterations, "iteration cap reached");
        Ok(None)
    }
}

/// Exponential backoff with jitter, capped.
fn empty_backoff(retry: u32) -> f64 {
    let base = 2.0_f64.powi(i32::try_from(retry).unwrap_or(i32::MAX));
    (base + rand::random::<f64>()).min(MAX_BACKOFF_SECS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
