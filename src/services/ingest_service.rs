use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::{parse_feed_url, CollectionKey, IngestionRecord, Post, RankedEntry};
use crate::errors::FeederResult;
use crate::storage::traits::{RankedStore, UpsertOutcome};

/// Page size of the read path
pub const DEFAULT_PAGE_SIZE: usize = 128;

/// Per-batch tally of upserts into the global collection.
///
/// `failed` counts records for which at least one of the two writes failed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl IngestSummary {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Writes records into the per-feed and global collections and reads them back.
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn RankedStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn RankedStore>) -> Self {
        Self { store }
    }

    /// Upsert one record into both collections.
    ///
    /// The two writes are independent: a failure in one is logged and does
    /// not undo the other. A later cycle re-upserting the same item repairs it.
    pub fn upsert(
        &self,
        feed_url: &str,
        record: &IngestionRecord,
    ) -> (FeederResult<UpsertOutcome>, FeederResult<UpsertOutcome>) {
        let member = record.member();
        let score = record.score();

        let per_feed = self.store.upsert(&CollectionKey::feed(feed_url), &member, score);
        if let Err(e) = &per_feed {
            warn!(feed = %feed_url, member = %member, error = %e, "per-feed upsert failed");
        }

        let global = self.store.upsert(&CollectionKey::global(), &member, score);
        if let Err(e) = &global {
            warn!(feed = %feed_url, member = %member, error = %e, "global upsert failed");
        }

        (per_feed, global)
    }

    pub fn ingest_all(&self, feed_url: &str, records: &[IngestionRecord]) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for record in records {
            match self.upsert(feed_url, record) {
                (Ok(_), Ok(outcome)) => summary.record(outcome),
                _ => summary.failed += 1,
            }
        }

        summary
    }

    pub fn query_top(
        &self,
        key: &CollectionKey,
        from: f64,
        to: f64,
        limit: usize,
    ) -> FeederResult<Vec<RankedEntry>> {
        self.store.query_top(key, from, to, limit)
    }

    /// Newest posts of one feed, or of all feeds when `feed_url` is `None`.
    ///
    /// The URL is normalized the same way the registry stores it.
    pub fn latest(&self, feed_url: Option<&str>, limit: usize) -> FeederResult<Vec<Post>> {
        let key = match feed_url {
            Some(url) => CollectionKey::feed(parse_feed_url(url)?.as_str()),
            None => CollectionKey::global(),
        };
        let to = (Utc::now().timestamp() + 1) as f64;

        let entries = self.query_top(&key, 0.0, to, limit)?;

        Ok(entries
            .iter()
            .filter_map(|entry| match Post::try_from(entry) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!(collection = %key, error = %e, "skipping undecodable entry");
                    None
                }
            })
            .collect())
    }

    pub fn count(&self, feed_url: Option<&str>) -> FeederResult<usize> {
        let key = feed_url.map_or_else(CollectionKey::global, CollectionKey::feed);
        self.store.count(&key)
    }
}
