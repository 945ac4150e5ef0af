mod connection;
mod feed_repository;
mod ranked_store;
mod validator_cache;

pub use connection::SqliteStorage;
pub use feed_repository::SqliteFeedRepository;
pub use ranked_store::SqliteRankedStore;
pub use validator_cache::SqliteValidatorCache;
