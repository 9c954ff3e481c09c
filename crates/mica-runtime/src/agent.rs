//! The agent: one inbound message in, at most one outbound message out.
//!
//! Turns for different inbound messages are serialized behind one async
//! lock so model calls, tool dispatch, and session writes never
//! interleave. Fact extraction runs after the reply as a detached task
//! so it never delays the visible response.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mica_core::Message;
use mica_llm::ChatProvider;
use mica_memory::MemoryStore;
use mica_settings::MicaSettings;
use mica_tools::ToolRegistry;

use crate::compaction::{CompactionPolicy, Compactor};
use crate::context::ContextBuilder;
use crate::engine::{TurnEngine, TurnEngineConfig};
use crate::errors::RuntimeError;
use crate::sessions::SessionManager;

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// A message arriving from a chat channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Source channel (telegram, cli, ...).
    pub channel: String,
    /// Who sent it.
    pub sender_id: String,
    /// Conversation identity within the channel.
    pub chat_id: String,
    /// Message text.
    pub content: String,
}

impl InboundMessage {
    /// Session key for this conversation.
    #[must_use]
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// A reply headed back to a chat channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Destination channel.
    pub channel: String,
    /// Destination conversation.
    pub chat_id: String,
    /// Reply text.
    pub content: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

/// The assembled runtime: engine, context, sessions, compaction, memory.
pub struct Agent {
    engine: TurnEngine,
    context: ContextBuilder,
    sessions: SessionManager,
    compactor: Arc<Compactor>,
    memory: Arc<MemoryStore>,
    policy: CompactionPolicy,
    extraction_enabled: bool,
    // Serializes whole turns; concurrent inbound messages queue here.
    turn_lock: tokio::sync::Mutex<()>,
}

impl Agent {
    /// Assemble an agent over `workspace` using `settings` for its knobs.
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<ToolRegistry>,
        workspace: &Path,
        settings: &MicaSettings,
    ) -> Result<Self, RuntimeError> {
        let memory = Arc::new(MemoryStore::new(workspace)?);
        let engine = TurnEngine::with_config(
            provider.clone(),
            tools,
            settings.agent.model.clone(),
            TurnEngineConfig {
                max_iterations: settings.agent.max_iterations,
                tool_result_max_chars: settings.agent.tool_result_max_chars,
                ..TurnEngineConfig::default()
            },
        );
        let compaction_model = settings
            .compaction
            .model
            .clone()
            .or_else(|| settings.agent.model.clone());
        Ok(Self {
            engine,
            context: ContextBuilder::new(workspace, memory.clone()),
            sessions: SessionManager::new(workspace),
            compactor: Arc::new(Compactor::new(provider, compaction_model)),
            memory,
            policy: CompactionPolicy {
                enabled: settings.compaction.enabled,
                token_threshold: settings.compaction.token_threshold,
                keep_recent: settings.compaction.keep_recent,
            },
            extraction_enabled: settings.extraction.enabled,
            turn_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Process one inbound message end to end.
    ///
    /// Returns `None` when the turn produced no reply text (a delivery
    /// tool already answered, or the iteration cap was hit). Provider
    /// transport failures become a visible error reply instead of
    /// propagating.
    pub async fn process_message(&self, msg: &InboundMessage) -> Option<OutboundMessage> {
        let _turn = self.turn_lock.lock().await;
        info!(channel = %msg.channel, sender = %msg.sender_id, "processing message");

        let mut session = self.sessions.get_or_create(&msg.session_key());
        let history = self
            .compactor
            .history_with_compaction(&mut session, &self.policy)
            .await;
        let messages =
            self.context
                .build_messages(&history, &msg.content, Some(&msg.channel), Some(&msg.chat_id));

        let reply = match self.engine.run_turn(messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "turn failed");
                return Some(OutboundMessage {
                    channel: msg.channel.clone(),
                    chat_id: msg.chat_id.clone(),
                    content: format!("Sorry, I ran into an error: {e}"),
                });
            }
        };

        session.add_message(Message::user(&msg.content));
        if let Some(text) = &reply {
            session.add_message(Message::assistant(text));
        }
        if let Err(e) = self.sessions.save(&session) {
            warn!(error = %e, key = %session.key, "failed to save session");
        }

        if self.extraction_enabled {
            if let Some(text) = &reply {
                self.spawn_extraction(msg.content.clone(), text.clone());
            }
        }

        reply.map(|content| OutboundMessage {
            channel: msg.channel.clone(),
            chat_id: msg.chat_id.clone(),
            content,
        })
    }

    /// Run a message as if from the CLI and return the reply text.
    pub async fn process_direct(&self, content: &str) -> String {
        let msg = InboundMessage {
            channel: "cli".into(),
            sender_id: "user".into(),
            chat_id: "direct".into(),
            content: content.to_owned(),
        };
        self.process_message(&msg)
            .await
            .map(|out| out.content)
            .unwrap_or_default()
    }

    // Detached on purpose: the reply must not wait on fact extraction,
    // and extraction failures stay internal.
    fn spawn_extraction(&self, user: String, assistant: String) {
        let compactor = self.compactor.clone();
        let memory = self.memory.clone();
        drop(tokio::spawn(async move {
            if let Some(facts) = compactor.extract_facts(&user, &assistant).await {
                if let Err(e) = memory.append_today(&facts) {
                    warn!(error = %e, "failed to append extracted facts");
                }
            }
        }));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use mica_core::ToolDefinition;
    use mica_llm::{ChatOptions, ChatResponse, ProviderError};

    struct ScriptedProvider {
        script: Mutex<Vec<Result<ChatResponse, ProviderError>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<ChatResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script) })
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _options: &ChatOptions,
        ) -> Result<ChatResponse, ProviderError> {
            let mut script = self.script.lock();
            if script.is_empty() {
                return Ok(ChatResponse {
                    content: Some("fallback".into()),
                    ..ChatResponse::default()
                });
            }
            script.remove(0)
        }
        fn default_model(&self) -> &str {
            "mock"
        }
    }

    fn text(content: &str) -> Result<ChatResponse, ProviderError> {
        Ok(ChatResponse { content: Some(content.to_owned()), ..ChatResponse::default() })
    }

    fn settings_without_extraction() -> MicaSettings {
        let mut settings = MicaSettings::default();
        settings.extraction.enabled = false;
        settings
    }

    fn agent(dir: &tempfile::TempDir, script: Vec<Result<ChatResponse, ProviderError>>) -> Agent {
        Agent::new(
            ScriptedProvider::new(script),
            Arc::new(ToolRegistry::new()),
            dir.path(),
            &settings_without_extraction(),
        )
        .unwrap()
    }

    fn inbound(content: &str) -> InboundMessage {
        InboundMessage {
            channel: "telegram".into(),
            sender_id: "u1".into(),
            chat_id: "42".into(),
            content: content.to_owned(),
        }
    }

    #[test]
    fn session_key_combines_channel_and_chat() {
        assert_eq!(inbound("hi").session_key(), "telegram:42");
    }

    #[tokio::test]
    async fn reply_is_routed_back_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir, vec![text("hello to you")]);

        let out = agent.process_message(&inbound("hello")).await.unwrap();
        assert_eq!(out.channel, "telegram");
        assert_eq!(out.chat_id, "42");
        assert_eq!(out.content, "hello to you");

        let session = agent.sessions.get_or_create("telegram:42");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content.text(), "hello");
    }

    #[tokio::test]
    async fn transport_failure_becomes_visible_error() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir, vec![Err(ProviderError::Transport("refused".into()))]);

        let out = agent.process_message(&inbound("hello")).await.unwrap();
        assert!(out.content.starts_with("Sorry, I ran into an error"));

        // The failed turn leaves no partial history behind.
        let session = agent.sessions.get_or_create("telegram:42");
        assert!(session.messages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_turn_produces_no_outbound() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir, vec![
            Ok(ChatResponse::default()),
            Ok(ChatResponse::default()),
            Ok(ChatResponse::default()),
        ]);

        let out = agent.process_message(&inbound("hm")).await;
        assert!(out.is_none());

        // The user message still lands in history.
        let session = agent.sessions.get_or_create("telegram:42");
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn direct_processing_returns_text() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(&dir, vec![text("4")]);
        assert_eq!(agent.process_direct("What's 2+2?").await, "4");
    }
}
