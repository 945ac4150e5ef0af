use crate::domain::ConditionalCacheEntry;
use crate::errors::{FeederError, FeederResult};
use crate::storage::traits::ValidatorCache;
use crate::storage::sqlite::SqliteStorage;

pub struct SqliteValidatorCache {
    storage: SqliteStorage,
}

impl SqliteValidatorCache {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl ValidatorCache for SqliteValidatorCache {
    fn get_validator(&self, feed_url: &str) -> FeederResult<Option<String>> {
        Ok(self.get_entry(feed_url)?.map(|entry| entry.validator))
    }

    fn set_validator(&self, feed_url: &str, validator: &str, observed_at: i64) -> FeederResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO validators (feed_url, validator, last_checked_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(feed_url) DO UPDATE
             SET validator = excluded.validator, last_checked_at = excluded.last_checked_at",
            (feed_url, validator, observed_at),
        )?;
        Ok(())
    }

    fn get_entry(&self, feed_url: &str) -> FeederResult<Option<ConditionalCacheEntry>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT feed_url, validator, last_checked_at FROM validators WHERE feed_url = ?1",
        )?;

        let entry = stmt.query_row([feed_url], |row| {
            Ok(ConditionalCacheEntry {
                feed_url: row.get(0)?,
                validator: row.get(1)?,
                last_checked_at: row.get(2)?,
            })
        });

        match entry {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(FeederError::from(e)),
        }
    }
}
