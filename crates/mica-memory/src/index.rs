//! Lexical index over memory files.
//!
//! Files are re-parsed only when their mtime changes. Content is split
//! into paragraph chunks, deduplicated per source by content hash, and
//! queried through FTS5 (BM25-ranked) or a substring scan when FTS5 is
//! missing from the SQLite build.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use mica_core::text::truncate_str;

use crate::db::{self, ConnectionPool};
use crate::errors::MemoryError;

/// Minimum chunk length worth indexing.
const MIN_CHUNK_CHARS: usize = 12;
/// Cap on individual chunk size, for retrieval quality.
const MAX_CHUNK_CHARS: usize = 1_200;
/// Cap on distinct query terms in one FTS expression.
const MAX_QUERY_TERMS: usize = 16;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));
static QUERY_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]{2,}").expect("valid regex"));

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// How the index answers queries, decided once at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// FTS5 virtual table, BM25-ranked.
    FullText,
    /// `LIKE` substring scan, unranked.
    Substring,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryHit {
    /// Source file key (e.g. `MEMORY.md` or `2026-08-24.md`).
    pub source_key: String,
    /// The matching chunk text.
    pub content: String,
}

/// SQLite-backed index over a directory of markdown memory files.
pub struct MemoryIndex {
    pool: ConnectionPool,
    strategy: SearchStrategy,
}

impl MemoryIndex {
    /// Open (creating if needed) the index database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, MemoryError> {
        let pool = db::open_pool(db_path)?;
        let conn = pool.get()?;
        let strategy = if db::run_migrations(&conn)? {
            SearchStrategy::FullText
        } else {
            SearchStrategy::Substring
        };
        Ok(Self { pool, strategy })
    }

    /// The query strategy this index settled on at open time.
    #[must_use]
    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    // ── indexing ──

    /// Index (or re-index) one file. Skips work entirely when the file's
    /// mtime matches the stored value for `source_key`.
    pub fn index_file(&self, source_key: &str, path: &Path) -> Result<(), MemoryError> {
        let mtime = mtime_ns(path);
        let mut conn = self.pool.get()?;

        let stored: Option<i64> = conn
            .query_row(
                "SELECT mtime_ns FROM memory_sources WHERE source_key = ?1",
                params![source_key],
                |row| row.get(0),
            )
            .optional()?;
        if stored == Some(mtime) {
            return Ok(());
        }

        // Unreadable or missing files index as empty rather than erroring.
        let text = std::fs::read_to_string(path).unwrap_or_default();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM memory_entries WHERE source_key = ?1",
            params![source_key],
        )?;
        for chunk in split_chunks(&text) {
            tx.execute(
                "INSERT OR IGNORE INTO memory_entries
                     (source_key, content, content_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![source_key, chunk, hash_text(&chunk), now],
            )?;
        }
        tx.execute(
            "INSERT INTO memory_sources (source_key, mtime_ns, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(source_key)
             DO UPDATE SET mtime_ns = excluded.mtime_ns,
                           updated_at = excluded.updated_at",
            params![source_key, mtime, now],
        )?;
        tx.commit()?;

        debug!(source = source_key, "indexed memory file");
        Ok(())
    }

    /// Index every `*.md` file directly under `dir`. A missing directory
    /// is a no-op.
    pub fn index_directory(&self, dir: &Path) -> Result<(), MemoryError> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Ok(());
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    self.index_file(name, &path)?;
                }
            }
        }
        Ok(())
    }

    // ── search ──

    /// Search indexed chunks relevant to `query_text`, best first.
    ///
    /// `exclude_sources` drops results from the named files (e.g. today's
    /// note, which is injected into the prompt separately). A query with no
    /// usable terms or a zero limit returns empty without touching the
    /// database.
    pub fn search(
        &self,
        query_text: &str,
        limit: usize,
        exclude_sources: &HashSet<String>,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let Some(fts_query) = fts_or_query(query_text) else {
            return Ok(Vec::new());
        };

        let conn = self.pool.get()?;
        // Over-fetch so post-filtering excluded sources can't starve results.
        let fetch = (limit + exclude_sources.len()) as i64;

        if self.strategy == SearchStrategy::FullText {
            let ranked = conn
                .prepare(
                    "SELECT me.source_key, me.content
                     FROM memory_fts
                     JOIN memory_entries me ON memory_fts.rowid = me.id
                     WHERE memory_fts MATCH ?1
                     ORDER BY bm25(memory_fts)
                     LIMIT ?2",
                )
                .and_then(|mut stmt| {
                    stmt.query_map(params![fts_query, fetch], |row| {
                        Ok(MemoryHit { source_key: row.get(0)?, content: row.get(1)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()
                });
            match ranked {
                Ok(hits) => {
                    return Ok(hits
                        .into_iter()
                        .filter(|h| !exclude_sources.contains(&h.source_key))
                        .take(limit)
                        .collect());
                }
                // Hostile query syntax can still break MATCH despite the
                // sanitized OR form.
                Err(e) => warn!(error = %e, "FTS query failed, using substring scan"),
            }
        }

        let like = format!("%{}%", truncate_str(query_text.trim(), 200));
        let mut stmt = conn.prepare(
            "SELECT source_key, content
             FROM memory_entries
             WHERE content LIKE ?1
             LIMIT ?2",
        )?;
        let hits = stmt
            .query_map(params![like, fetch], |row| {
                Ok(MemoryHit { source_key: row.get(0)?, content: row.get(1)? })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits
            .into_iter()
            .filter(|h| !exclude_sources.contains(&h.source_key))
            .take(limit)
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn mtime_ns(path: &Path) -> i64 {
    let Ok(meta) = std::fs::metadata(path) else {
        return 0;
    };
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_nanos()).ok())
        .unwrap_or(0)
}

/// Split markdown into paragraph-level chunks for indexing.
fn split_chunks(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text.trim())
        .filter_map(|part| {
            let p = part.trim();
            if p.len() < MIN_CHUNK_CHARS {
                return None;
            }
            Some(truncate_str(p, MAX_CHUNK_CHARS).to_owned())
        })
        .collect()
}

/// Build an FTS5 OR query from free-form text, avoiding syntax injection.
/// Returns `None` when the text has no usable terms.
fn fts_or_query(text: &str) -> Option<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for m in QUERY_TERM.find_iter(text) {
        let low = m.as_str().to_lowercase();
        if seen.insert(low.clone()) {
            terms.push(low);
            if terms.len() >= MAX_QUERY_TERMS {
                break;
            }
        }
    }
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

fn hash_text(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
