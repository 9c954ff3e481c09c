//! Markdown note store with index-backed context retrieval.
//!
//! Files under `workspace/memory/` are the source of truth: daily notes
//! named `YYYY-MM-DD.md` and long-term `MEMORY.md`. The [`MemoryIndex`]
//! lives alongside them and is refreshed (mtime-gated) before every
//! context build.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

use crate::errors::MemoryError;
use crate::index::MemoryIndex;

/// Cap on retrieved chunk text injected into one prompt.
const MAX_RETRIEVED_CHARS: usize = 6_000;
/// Results requested from the index per context build.
const RETRIEVAL_LIMIT: usize = 8;

/// Façade over the memory directory and its search index.
pub struct MemoryStore {
    memory_dir: PathBuf,
    memory_file: PathBuf,
    index: MemoryIndex,
}

impl MemoryStore {
    /// Open the store rooted at `workspace`, creating `workspace/memory/`
    /// and the index database if needed.
    pub fn new(workspace: &Path) -> Result<Self, MemoryError> {
        let memory_dir = workspace.join("memory");
        std::fs::create_dir_all(&memory_dir)?;
        let memory_file = memory_dir.join("MEMORY.md");
        let index = MemoryIndex::open(&memory_dir.join("memory.sqlite3"))?;
        Ok(Self { memory_dir, memory_file, index })
    }

    // ── daily notes ──

    /// Path of today's note file.
    #[must_use]
    pub fn today_file(&self) -> PathBuf {
        self.memory_dir.join(format!("{}.md", today_date()))
    }

    /// Today's notes, or empty when no note exists yet.
    #[must_use]
    pub fn read_today(&self) -> String {
        std::fs::read_to_string(self.today_file()).unwrap_or_default()
    }

    /// Append `content` to today's note, creating it with a date header
    /// on first write. Existing text is never rewritten.
    pub fn append_today(&self, content: &str) -> std::io::Result<()> {
        let path = self.today_file();
        let full = match std::fs::read_to_string(&path) {
            Ok(existing) => format!("{existing}\n{content}"),
            Err(_) => format!("# {}\n\n{content}", today_date()),
        };
        std::fs::write(path, full)
    }

    // ── long-term memory ──

    /// Contents of `MEMORY.md`, or empty when absent.
    #[must_use]
    pub fn read_long_term(&self) -> String {
        std::fs::read_to_string(&self.memory_file).unwrap_or_default()
    }

    /// Replace `MEMORY.md`.
    pub fn write_long_term(&self, content: &str) -> std::io::Result<()> {
        std::fs::write(&self.memory_file, content)
    }

    /// Daily notes from the last `days` days, newest first, joined with
    /// a rule. Missing days are skipped.
    #[must_use]
    pub fn recent_memories(&self, days: u32) -> String {
        let today = Local::now().date_naive();
        let mut notes = Vec::new();
        for offset in 0..u64::from(days) {
            let Some(date) = today.checked_sub_days(chrono::Days::new(offset)) else {
                break;
            };
            let path = self.memory_dir.join(format!("{}.md", date.format("%Y-%m-%d")));
            if let Ok(text) = std::fs::read_to_string(path) {
                notes.push(text);
            }
        }
        notes.join("\n\n---\n\n")
    }

    /// All dated note files, newest first.
    #[must_use]
    pub fn list_note_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.memory_dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_dated_note_name)
            })
            .collect();
        files.sort();
        files.reverse();
        files
    }

    // ── context retrieval ──

    /// Build memory context for the agent prompt.
    ///
    /// Today's notes are always included in full. With a `query`, the
    /// most relevant indexed chunks (today excluded) are appended under
    /// a "Relevant Memory" section, budget-capped. Without a query, or
    /// when retrieval comes up empty, full `MEMORY.md` is injected
    /// instead.
    #[must_use]
    pub fn get_memory_context(&self, query: Option<&str>) -> String {
        // mtime-gated, so nearly free on the hot path
        if let Err(e) = self.index.index_directory(&self.memory_dir) {
            warn!(error = %e, "memory re-index failed");
        }

        let mut parts = Vec::new();
        let today_name = format!("{}.md", today_date());

        let today = self.read_today();
        if !today.is_empty() {
            parts.push(format!("## Today's Notes\n{today}"));
        }

        if let Some(query) = query {
            let exclude: HashSet<String> = [today_name].into();
            let hits = self
                .index
                .search(query, RETRIEVAL_LIMIT, &exclude)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "memory search failed");
                    Vec::new()
                });
            let mut retrieved = Vec::new();
            let mut total = 0;
            for hit in hits {
                if total + hit.content.len() > MAX_RETRIEVED_CHARS {
                    break;
                }
                total += hit.content.len();
                retrieved.push(format!("[{}] {}", hit.source_key, hit.content));
            }
            if !retrieved.is_empty() {
                parts.push(format!("## Relevant Memory\n{}", retrieved.join("\n\n")));
                return parts.join("\n\n");
            }
        }

        let long_term = self.read_long_term();
        if !long_term.is_empty() {
            parts.insert(0, format!("## Long-term Memory\n{long_term}"));
        }
        parts.join("\n\n")
    }
}

fn today_date() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn is_dated_note_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".md") else {
        return false;
    };
    let bytes = stem.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
