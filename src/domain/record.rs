use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::FeedIdentity;
use crate::errors::{FeederError, FeederResult};

/// Field separator of a composite member
pub const SEPARATOR: char = '^';

const ESCAPED_SEPARATOR: &str = "%5E";

const GLOBAL_COLLECTION: &str = "feeds-all";
const FEED_COLLECTION_PREFIX: &str = "feed:";

/// Name of a ranked collection: one per feed URL plus the shared global one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionKey(String);

impl CollectionKey {
    pub fn global() -> Self {
        Self(GLOBAL_COLLECTION.to_string())
    }

    pub fn feed(feed_url: &str) -> Self {
        Self(format!("{}{}", FEED_COLLECTION_PREFIX, feed_url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One item ready to be ranked by its publish time.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionRecord {
    pub feed_identity: FeedIdentity,
    pub link: String,
    pub title: String,
    pub published_at: i64,
}

impl IngestionRecord {
    pub fn new(
        feed_identity: FeedIdentity,
        link: String,
        title: String,
        published_at: i64,
    ) -> Self {
        Self {
            feed_identity,
            link,
            title,
            published_at,
        }
    }

    /// Composite member string: `identity^link^title`
    pub fn member(&self) -> String {
        encode_member(&self.feed_identity, &self.link, &self.title)
    }

    pub fn score(&self) -> f64 {
        self.published_at as f64
    }
}

/// Encode the three identity fields into one member string.
///
/// Identity and link are URL-shaped, so a literal separator in them is
/// percent-escaped. The title is the trailing field and stays verbatim;
/// decoding only splits on the first two separators.
pub fn encode_member(identity: &FeedIdentity, link: &str, title: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        escape_separator(identity.as_str()),
        escape_separator(link),
        title,
        sep = SEPARATOR
    )
}

/// Split a member back into (identity, link, title)
pub fn decode_member(member: &str) -> FeederResult<(FeedIdentity, String, String)> {
    let mut parts = member.splitn(3, SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(identity), Some(link), Some(title)) => Ok((
            FeedIdentity::from(identity.to_string()),
            link.to_string(),
            title.to_string(),
        )),
        _ => Err(FeederError::InvalidMember(member.to_string())),
    }
}

fn escape_separator(field: &str) -> String {
    if field.contains(SEPARATOR) {
        field.replace(SEPARATOR, ESCAPED_SEPARATOR)
    } else {
        field.to_string()
    }
}

/// A member of a ranked collection together with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub member: String,
    pub score: f64,
}

/// Decoded entry as handed to readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub feed_identity: String,
    pub link: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

impl TryFrom<&RankedEntry> for Post {
    type Error = FeederError;

    fn try_from(entry: &RankedEntry) -> FeederResult<Self> {
        let (identity, link, title) = decode_member(&entry.member)?;
        let published_at = Utc
            .timestamp_opt(entry.score as i64, 0)
            .single()
            .ok_or_else(|| {
                FeederError::InvalidMember(format!("{} (score {})", entry.member, entry.score))
            })?;

        Ok(Self {
            feed_identity: identity.to_string(),
            link,
            title,
            published_at,
        })
    }
}
