pub mod feed;
pub mod record;
pub mod validator;

pub use feed::{parse_feed_url, Feed, FeedIdentity};
pub use record::{
    decode_member, encode_member, CollectionKey, IngestionRecord, Post, RankedEntry, SEPARATOR,
};
pub use validator::ConditionalCacheEntry;
