//! Bounded memory history backed by SQLite

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::memory::{Memory, MemoryFilter};
use crate::Result;

/// SQLite-based bounded history.
///
/// Records keep insertion order; appending past `max_entries` evicts the
/// oldest records. The connection sits behind a mutex so the store can be
/// shared between the orchestrator, the API and the scheduler.
pub struct MemoryStore {
    conn: Mutex<Connection>,
    max_entries: usize,
}

impl MemoryStore {
    /// Open (or create) the database at `db_path`
    pub fn new(db_path: &str, max_entries: usize) -> Result<Self> {
        debug!("Opening memory database at: {}", db_path);
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self::with_connection(Connection::open(db_path)?, max_entries)?;
        info!(max_entries, "MemoryStore initialized");
        Ok(store)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory(max_entries: usize) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, max_entries)
    }

    fn with_connection(conn: Connection, max_entries: usize) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS memories (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                key TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_memories_category_key ON memories (category, key)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            // a cap of zero would evict every record as it is appended
            max_entries: max_entries.max(1),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-written row behind
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Append a record, evicting the oldest past the cap
    pub fn append(&self, memory: &Memory) -> Result<()> {
        let metadata_json = serde_json::to_string(&memory.metadata)?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO memories (id, category, key, content, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                memory.id,
                memory.category,
                memory.key,
                memory.content,
                metadata_json,
                memory.created_at.to_rfc3339(),
            ],
        )?;

        let evicted = tx.execute(
            "DELETE FROM memories WHERE seq NOT IN (
                SELECT seq FROM memories ORDER BY seq DESC LIMIT ?1
            )",
            params![self.max_entries as i64],
        )?;
        tx.commit()?;

        debug!(id = %memory.id, category = %memory.category, key = %memory.key, "Appended memory");
        if evicted > 0 {
            debug!(evicted, "Evicted oldest memories");
        }
        Ok(())
    }

    /// Records matching `filter`, newest first
    pub fn query(&self, filter: &MemoryFilter) -> Result<Vec<Memory>> {
        let pattern = filter.text.as_deref().map(|t| format!("%{}%", escape_like(t)));
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, category, key, content, metadata, created_at FROM memories
             WHERE (?1 IS NULL OR category = ?1)
               AND (?2 IS NULL OR key = ?2)
               AND (?3 IS NULL OR content LIKE ?3 ESCAPE '\\')
             ORDER BY seq DESC
             LIMIT ?4",
        )?;

        let memories = stmt
            .query_map(
                params![filter.category, filter.key, pattern, limit],
                row_to_memory,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Query returned {} memories", memories.len());
        Ok(memories)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Clear all memories
    pub fn clear(&self) -> Result<()> {
        self.conn().execute("DELETE FROM memories", [])?;
        info!("Cleared all memories");
        Ok(())
    }
}

/// Escape LIKE wildcards so `text` matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_memory(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let metadata_str: Option<String> = row.get(4)?;
    let created_at_str: String = row.get(5)?;

    let metadata = metadata_str
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(JsonValue::Null);
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Memory {
        id: row.get(0)?,
        category: row.get(1)?,
        key: row.get(2)?,
        content: row.get(3)?,
        metadata,
        created_at,
    })
}
