use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::errors::{FeederError, FeederResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS feeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS validators (
    feed_url TEXT PRIMARY KEY,
    validator TEXT NOT NULL,
    last_checked_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ranked_entries (
    collection TEXT NOT NULL,
    member TEXT NOT NULL,
    score REAL NOT NULL,
    PRIMARY KEY (collection, member)
);

CREATE INDEX IF NOT EXISTS idx_ranked_entries_score ON ranked_entries(collection, score);
"#;

/// Long-lived handle shared by every repository.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> FeederResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> FeederResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, FeederError> {
        self.conn
            .lock()
            .map_err(|_| FeederError::Database(rusqlite::Error::InvalidQuery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_in_memory_storage() {
        let storage = SqliteStorage::in_memory().unwrap();
        let conn = storage.connection().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type='table' AND name IN ('feeds', 'validators', 'ranked_entries')",
            )
            .unwrap();
        let count: i64 = stmt.query_row([], |row| row.get(0)).unwrap();

        assert_eq!(count, 3);
    }

    #[test]
    fn test_file_storage_reopens_with_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedrank.db");

        SqliteStorage::new(&path).unwrap();
        let reopened = SqliteStorage::new(&path).unwrap();
        let conn = reopened.connection().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ranked_entries", [], |row| row.get(0))
            .unwrap();

        assert_eq!(count, 0);
    }
}
