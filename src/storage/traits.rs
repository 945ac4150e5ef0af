use crate::domain::{CollectionKey, ConditionalCacheEntry, Feed, RankedEntry};
use crate::errors::FeederResult;

/// Result of a single ranked upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Member existed with a different score, score overwritten
    Updated,
    /// Member existed with the same score, nothing written
    Unchanged,
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedRepository: Send + Sync {
    fn add(&self, feed: &Feed) -> FeederResult<i64>;
    fn remove(&self, id: i64) -> FeederResult<()>;
    fn remove_by_url(&self, url: &str) -> FeederResult<bool>;
    fn get_all(&self) -> FeederResult<Vec<Feed>>;
    fn get_by_id(&self, id: i64) -> FeederResult<Option<Feed>>;
    fn exists(&self, url: &str) -> FeederResult<bool>;
}

/// Entity tags keyed by feed URL. Entries never expire; a missing entry is `None`.
#[cfg_attr(test, mockall::automock)]
pub trait ValidatorCache: Send + Sync {
    fn get_validator(&self, feed_url: &str) -> FeederResult<Option<String>>;
    fn set_validator(&self, feed_url: &str, validator: &str, observed_at: i64) -> FeederResult<()>;
    fn get_entry(&self, feed_url: &str) -> FeederResult<Option<ConditionalCacheEntry>>;
}

/// Score-ordered sets of members, deduplicated by exact member equality.
///
/// Every call is atomic on its own; nothing spans two collections.
#[cfg_attr(test, mockall::automock)]
pub trait RankedStore: Send + Sync {
    /// Insert a member or overwrite its score (last write wins)
    fn upsert(&self, key: &CollectionKey, member: &str, score: f64) -> FeederResult<UpsertOutcome>;

    /// Members with `from <= score < to`, highest score first, at most `limit`
    fn query_top(
        &self,
        key: &CollectionKey,
        from: f64,
        to: f64,
        limit: usize,
    ) -> FeederResult<Vec<RankedEntry>>;

    /// Keep the `max_count` highest-scored members, returning how many were removed
    fn trim_to_max(&self, key: &CollectionKey, max_count: usize) -> FeederResult<usize>;

    fn count(&self, key: &CollectionKey) -> FeederResult<usize>;
}
