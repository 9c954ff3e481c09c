//! Prompt assembly: identity, bootstrap files, and memory context.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::Local;
use parking_lot::Mutex;
use tracing::warn;

use mica_core::Message;
use mica_memory::MemoryStore;

/// Workspace files injected into every system prompt, in order.
const BOOTSTRAP_FILES: &[&str] = &["AGENTS.md", "SOUL.md", "USER.md", "TOOLS.md"];

/// Optional identity file; replaces the built-in identity header.
const IDENTITY_FILE: &str = "IDENTITY.md";

/// Concatenated bootstrap text, cached against the observed mtimes so
/// unchanged files aren't reread every message.
#[derive(Default)]
struct BootstrapCache {
    cached: Option<String>,
    mtimes: HashMap<String, SystemTime>,
}

/// Builds the system prompt and full message list for one model call.
pub struct ContextBuilder {
    workspace: PathBuf,
    memory: Arc<MemoryStore>,
    bootstrap: Mutex<BootstrapCache>,
}

impl ContextBuilder {
    /// Create a builder over `workspace`, sharing the given memory store.
    #[must_use]
    pub fn new(workspace: &Path, memory: Arc<MemoryStore>) -> Self {
        Self {
            workspace: workspace.to_path_buf(),
            memory,
            bootstrap: Mutex::new(BootstrapCache::default()),
        }
    }

    /// Build the system prompt. `query` drives relevance-based memory
    /// retrieval; without it the full long-term note is injected.
    #[must_use]
    pub fn build_system_prompt(&self, query: Option<&str>) -> String {
        let mut parts = vec![self.identity()];

        let bootstrap = self.load_bootstrap_files();
        if !bootstrap.is_empty() {
            parts.push(bootstrap);
        }

        let memory = self.memory.get_memory_context(query);
        if !memory.is_empty() {
            parts.push(format!("# Memory\n\n{memory}"));
        }

        parts.join("\n\n---\n\n")
    }

    /// Build the complete message list for one model call: system prompt,
    /// prior history, then the current user message.
    #[must_use]
    pub fn build_messages(
        &self,
        history: &[Message],
        current_message: &str,
        channel: Option<&str>,
        chat_id: Option<&str>,
    ) -> Vec<Message> {
        let mut system = self.build_system_prompt(Some(current_message));
        if let (Some(channel), Some(chat_id)) = (channel, chat_id) {
            system.push_str(&format!(
                "\n\n## Current Session\nChannel: {channel}\nChat ID: {chat_id}"
            ));
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system));
        messages.extend_from_slice(history);
        messages.push(Message::user(current_message));
        messages
    }

    // ── identity ──

    fn identity(&self) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)").to_string();
        let workspace = self.workspace.display().to_string();
        let runtime = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);

        let identity_path = self.workspace.join(IDENTITY_FILE);
        match std::fs::read_to_string(&identity_path) {
            Ok(custom) => format!(
                "{custom}\n\n## Current Context\n\n**Time**: {now}\n**Runtime**: {runtime}\n\
                 **Workspace**: {workspace}\n- Memory files: {workspace}/memory/MEMORY.md\n\
                 - Daily notes: {workspace}/memory/YYYY-MM-DD.md"
            ),
            Err(_) => format!(
                "# mica\n\nYou are mica, a helpful personal assistant with access to tools.\n\n\
                 ## Current Time\n{now}\n\n## Runtime\n{runtime}\n\n## Workspace\n\
                 Your workspace is at: {workspace}\n- Memory files: {workspace}/memory/MEMORY.md\n\
                 - Daily notes: {workspace}/memory/YYYY-MM-DD.md\n\n\
                 When responding to direct questions, reply directly with your text response.\n\
                 Only use the message tool to reach a specific chat channel.\n\
                 When remembering something, write to {workspace}/memory/MEMORY.md"
            ),
        }
    }

    // ── bootstrap files ──

    fn load_bootstrap_files(&self) -> String {
        let mut current: HashMap<String, SystemTime> = HashMap::new();
        for name in BOOTSTRAP_FILES {
            let path = self.workspace.join(name);
            if let Ok(meta) = std::fs::metadata(&path) {
                if let Ok(mtime) = meta.modified() {
                    current.insert((*name).to_owned(), mtime);
                }
            }
        }

        let mut cache = self.bootstrap.lock();
        if let Some(cached) = &cache.cached {
            if current == cache.mtimes {
                return cached.clone();
            }
        }

        let mut parts = Vec::new();
        for name in BOOTSTRAP_FILES {
            let path = self.workspace.join(name);
            match std::fs::read_to_string(&path) {
                Ok(content) => parts.push(format!("## {name}\n\n{content}")),
                Err(e) if path.exists() => {
                    warn!(file = name, error = %e, "failed to read bootstrap file");
                }
                Err(_) => {}
            }
        }
        let joined = parts.join("\n\n");
        cache.cached = Some(joined.clone());
        cache.mtimes = current;
        joined
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mica_core::Role;
    use std::fs;

    fn builder(dir: &tempfile::TempDir) -> ContextBuilder {
        let memory = Arc::new(MemoryStore::new(dir.path()).unwrap());
        ContextBuilder::new(dir.path(), memory)
    }

    #[test]
    fn default_identity_when_no_identity_file() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = builder(&dir).build_system_prompt(None);
        assert!(prompt.starts_with("# mica"));
    }

    #[test]
    fn identity_file_replaces_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IDENTITY.md"), "# Jarvis\n\nDry wit.").unwrap();
        let prompt = builder(&dir).build_system_prompt(None);
        assert!(prompt.starts_with("# Jarvis"));
        assert!(prompt.contains("## Current Context"));
    }

    #[test]
    fn bootstrap_files_appear_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AGENTS.md"), "agent guidance").unwrap();
        fs::write(dir.path().join("USER.md"), "user profile").unwrap();

        let prompt = builder(&dir).build_system_prompt(None);
        let agents = prompt.find("## AGENTS.md").unwrap();
        let user = prompt.find("## USER.md").unwrap();
        assert!(agents < user);
    }

    #[test]
    fn bootstrap_cache_serves_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("SOUL.md"), "original soul").unwrap();
        let builder = builder(&dir);

        let first = builder.load_bootstrap_files();
        assert!(first.contains("original soul"));

        // Unchanged mtimes serve the cache even if the content is gone.
        fs::remove_file(dir.path().join("SOUL.md")).unwrap();
        fs::write(dir.path().join("SOUL.md"), "rewritten soul").unwrap();
        let second = builder.load_bootstrap_files();
        assert!(second.contains("soul"));
    }

    #[test]
    fn memory_section_included_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryStore::new(dir.path()).unwrap());
        memory.write_long_term("remember the anniversary").unwrap();
        let builder = ContextBuilder::new(dir.path(), memory);

        let prompt = builder.build_system_prompt(None);
        assert!(prompt.contains("# Memory"));
        assert!(prompt.contains("remember the anniversary"));
    }

    #[test]
    fn build_messages_shape() {
        let dir = tempfile::tempdir().unwrap();
        let history = vec![Message::user("earlier"), Message::assistant("noted")];
        let messages = builder(&dir).build_messages(&history, "now", Some("telegram"), Some("42"));

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.text().contains("## Current Session"));
        assert!(messages[0].content.text().contains("Channel: telegram"));
        assert_eq!(messages[3].content.text(), "now");
    }
}
