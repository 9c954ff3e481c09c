//! SQLite connection pool and schema for the memory index.
//!
//! Memory files stay the source of truth; the database is a rebuildable
//! index over them. Schema creation probes for FTS5 and reports whether
//! the bundled SQLite supports it.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::debug;

use crate::errors::MemoryError;

/// Pool of SQLite connections.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// A single checked-out connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const BUSY_TIMEOUT_MS: u32 = 3_000;
const MAX_POOL_SIZE: u32 = 4;

/// Open (creating if needed) the index database at `path`.
pub fn open_pool(path: &Path) -> Result<ConnectionPool, MemoryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA busy_timeout={BUSY_TIMEOUT_MS};"
        ))
    });
    Ok(Pool::builder().max_size(MAX_POOL_SIZE).build(manager)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────────────────────────────────────

/// Create tables if missing. Returns `true` when FTS5 is available and the
/// virtual table plus sync triggers were created.
pub fn run_migrations(conn: &Connection) -> Result<bool, MemoryError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS memory_sources (
            source_key  TEXT PRIMARY KEY,
            mtime_ns    INTEGER NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS memory_entries (
            id           INTEGER PRIMARY KEY,
            source_key   TEXT NOT NULL,
            content      TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            UNIQUE (source_key, content_hash)
        );",
    )?;

    // FTS5 is compile-time optional in SQLite; probe instead of assuming.
    let fts = conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS memory_fts
         USING fts5(
            content,
            source_key,
            content='memory_entries',
            content_rowid='id'
         );

        CREATE TRIGGER IF NOT EXISTS mem_ai AFTER INSERT ON memory_entries BEGIN
            INSERT INTO memory_fts(rowid, content, source_key)
            VALUES (new.id, new.content, new.source_key);
        END;

        CREATE TRIGGER IF NOT EXISTS mem_ad AFTER DELETE ON memory_entries BEGIN
            INSERT INTO memory_fts(memory_fts, rowid, content, source_key)
            VALUES ('delete', old.id, old.content, old.source_key);
        END;

        CREATE TRIGGER IF NOT EXISTS mem_au AFTER UPDATE ON memory_entries BEGIN
            INSERT INTO memory_fts(memory_fts, rowid, content, source_key)
            VALUES ('delete', old.id, old.content, old.source_key);
            INSERT INTO memory_fts(rowid, content, source_key)
            VALUES (new.id, new.content, new.source_key);
        END;",
    );

    match fts {
        Ok(()) => Ok(true),
        Err(e) => {
            debug!(error = %e, "FTS5 unavailable, search will use substring scan");
            Ok(false)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
