use rusqlite::OptionalExtension;

use crate::domain::{CollectionKey, RankedEntry};
use crate::errors::{FeederError, FeederResult};
use crate::storage::traits::{RankedStore, UpsertOutcome};
use crate::storage::sqlite::SqliteStorage;

pub struct SqliteRankedStore {
    storage: SqliteStorage,
}

impl SqliteRankedStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl RankedStore for SqliteRankedStore {
    fn upsert(&self, key: &CollectionKey, member: &str, score: f64) -> FeederResult<UpsertOutcome> {
        // Lookup and write happen under the same connection guard
        let conn = self.storage.connection()?;

        let existing: Option<f64> = conn
            .query_row(
                "SELECT score FROM ranked_entries WHERE collection = ?1 AND member = ?2",
                (key.as_str(), member),
                |row| row.get(0),
            )
            .optional()?;

        if existing == Some(score) {
            return Ok(UpsertOutcome::Unchanged);
        }

        conn.execute(
            "INSERT INTO ranked_entries (collection, member, score) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, member) DO UPDATE SET score = excluded.score",
            (key.as_str(), member, score),
        )?;

        Ok(match existing {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    fn query_top(
        &self,
        key: &CollectionKey,
        from: f64,
        to: f64,
        limit: usize,
    ) -> FeederResult<Vec<RankedEntry>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT member, score FROM ranked_entries
             WHERE collection = ?1 AND score >= ?2 AND score < ?3
             ORDER BY score DESC, member DESC
             LIMIT ?4",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt.query_map((key.as_str(), from, to, limit), |row| {
            Ok(RankedEntry {
                member: row.get(0)?,
                score: row.get(1)?,
            })
        })?;

        entries.collect::<Result<Vec<_>, _>>().map_err(FeederError::from)
    }

    fn trim_to_max(&self, key: &CollectionKey, max_count: usize) -> FeederResult<usize> {
        let conn = self.storage.connection()?;
        let max_count = i64::try_from(max_count).unwrap_or(i64::MAX);

        let removed = conn.execute(
            "DELETE FROM ranked_entries
             WHERE collection = ?1 AND member NOT IN (
                 SELECT member FROM ranked_entries
                 WHERE collection = ?1
                 ORDER BY score DESC, member DESC
                 LIMIT ?2
             )",
            (key.as_str(), max_count),
        )?;

        Ok(removed)
    }

    fn count(&self, key: &CollectionKey) -> FeederResult<usize> {
        let conn = self.storage.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ranked_entries WHERE collection = ?1",
            [key.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
