use serde::{Deserialize, Serialize};

/// Last entity tag seen for a feed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalCacheEntry {
    pub feed_url: String,
    pub validator: String,
    /// Epoch seconds of the fetch that produced the validator
    pub last_checked_at: i64,
}
