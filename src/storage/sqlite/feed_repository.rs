use rusqlite::Row;

use crate::domain::Feed;
use crate::errors::{FeederError, FeederResult};
use crate::storage::traits::FeedRepository;
use crate::storage::sqlite::SqliteStorage;

pub struct SqliteFeedRepository {
    storage: SqliteStorage,
}

impl SqliteFeedRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: Some(row.get(0)?),
        url: row.get(1)?,
        title: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl FeedRepository for SqliteFeedRepository {
    fn add(&self, feed: &Feed) -> FeederResult<i64> {
        let conn = self.storage.connection()?;

        // Check if already exists (within the same connection to avoid deadlock)
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)")?;
        let exists: bool = stmt.query_row([&feed.url], |row| row.get(0))?;
        drop(stmt);

        if exists {
            return Err(FeederError::FeedAlreadyExists(feed.url.clone()));
        }

        conn.execute(
            "INSERT INTO feeds (url, title) VALUES (?1, ?2)",
            (&feed.url, &feed.title),
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn remove(&self, id: i64) -> FeederResult<()> {
        let conn = self.storage.connection()?;
        conn.execute("DELETE FROM feeds WHERE id = ?1", [id])?;
        Ok(())
    }

    fn remove_by_url(&self, url: &str) -> FeederResult<bool> {
        let conn = self.storage.connection()?;
        let removed = conn.execute("DELETE FROM feeds WHERE url = ?1", [url])?;
        Ok(removed > 0)
    }

    fn get_all(&self) -> FeederResult<Vec<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT id, url, title, created_at FROM feeds ORDER BY id")?;

        let feeds = stmt.query_map([], feed_from_row)?;

        feeds.collect::<Result<Vec<_>, _>>().map_err(FeederError::from)
    }

    fn get_by_id(&self, id: i64) -> FeederResult<Option<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT id, url, title, created_at FROM feeds WHERE id = ?1")?;

        match stmt.query_row([id], feed_from_row) {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(FeederError::from(e)),
        }
    }

    fn exists(&self, url: &str) -> FeederResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)")?;
        let exists: bool = stmt.query_row([url], |row| row.get(0))?;
        Ok(exists)
    }
}
