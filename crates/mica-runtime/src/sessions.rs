//! Per-conversation session state and its on-disk persistence.
//!
//! A session is keyed by `channel:chat_id` and holds the full message
//! history plus compaction metadata. Sessions are saved as one JSON file
//! each under `workspace/sessions/`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mica_core::Message;

use crate::errors::RuntimeError;

/// How many trailing messages a plain history fetch returns.
const RECENT_WINDOW: usize = 50;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Compaction progress for one session.
///
/// `compacted_up_to` counts the old messages already folded into
/// `summary` and never decreases; when the current old-message count is
/// at or below it, the stored summary is reused without a model call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompactionState {
    /// The running summary of compacted history.
    pub summary: String,
    /// Count of messages the summary covers.
    pub compacted_up_to: usize,
}

/// One conversation's persistent state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session key, `channel:chat_id`.
    pub key: String,
    /// Full message history, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Compaction progress.
    #[serde(default)]
    pub compaction: CompactionState,
}

impl Session {
    /// Create an empty session for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            messages: Vec::new(),
            compaction: CompactionState::default(),
        }
    }

    /// Append a message to the history.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The trailing recent window of history.
    #[must_use]
    pub fn get_history(&self) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(RECENT_WINDOW);
        self.messages[start..].to_vec()
    }

    /// The complete history.
    #[must_use]
    pub fn get_full_history(&self) -> &[Message] {
        &self.messages
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────────────────────────────────────

/// Loads and saves sessions under a workspace directory, with an
/// in-process cache so a busy chat doesn't reread its file every turn.
pub struct SessionManager {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    /// Create a manager storing sessions in `workspace/sessions/`.
    #[must_use]
    pub fn new(workspace: &Path) -> Self {
        Self {
            dir: workspace.join("sessions"),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the session for `key`, loading from disk or creating fresh.
    #[must_use]
    pub fn get_or_create(&self, key: &str) -> Session {
        if let Some(session) = self.cache.lock().get(key) {
            return session.clone();
        }
        let path = self.session_path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    self.cache.lock().insert(key.to_owned(), session.clone());
                    session
                }
                Err(e) => {
                    // A corrupt file starts over rather than wedging the chat.
                    warn!(key, error = %e, "session file unreadable, starting fresh");
                    Session::new(key)
                }
            },
            Err(_) => Session::new(key),
        }
    }

    /// Persist `session` and refresh the cache.
    pub fn save(&self, session: &Session) -> Result<(), RuntimeError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.session_path(&session.key);
        let raw = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, raw)?;
        self.cache
            .lock()
            .insert(session.key.clone(), session.clone());
        debug!(key = %session.key, messages = session.messages.len(), "session saved");
        Ok(())
    }

    fn session_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_filename(key)))
    }
}

/// Make a session key filesystem-safe.
fn safe_filename(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_window_caps_at_recent() {
        let mut session = Session::new("cli:direct");
        for i in 0..60 {
            session.add_message(Message::user(format!("msg {i}")));
        }
        let history = session.get_history();
        assert_eq!(history.len(), RECENT_WINDOW);
        assert_eq!(history.last().unwrap().content.text(), "msg 59");
        assert_eq!(session.get_full_history().len(), 60);
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SessionManager::new(dir.path());

        let mut session = manager.get_or_create("telegram:42");
        session.add_message(Message::user("hello"));
        session.compaction.summary = "nothing yet".into();
        session.compaction.compacted_up_to = 0;
        manager.save(&session).unwrap();

        let fresh = SessionManager::new(dir.path());
        let loaded = fresh.get_or_create("telegram:42");
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.compaction.summary, "nothing yet");
    }

    #[test]
    fn unknown_key_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SessionManager::new(dir.path());
        let session = manager.get_or_create("whatsapp:99");
        assert!(session.messages.is_empty());
        assert_eq!(session.compaction, CompactionState::default());
    }

    #[test]
    fn corrupt_session_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sessions")).unwrap();
        std::fs::write(dir.path().join("sessions/cli_direct.json"), "{not json").unwrap();

        let manager = SessionManager::new(dir.path());
        let session = manager.get_or_create("cli:direct");
        assert!(session.messages.is_empty());
    }

    #[test]
    fn keys_become_safe_filenames() {
        assert_eq!(safe_filename("telegram:42"), "telegram_42");
        assert_eq!(safe_filename("a/b\\c"), "a_b_c");
        assert_eq!(safe_filename("ok-name"), "ok-name");
    }
}
