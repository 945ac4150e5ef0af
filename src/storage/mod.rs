pub mod traits;
pub mod sqlite;

pub use traits::{FeedRepository, RankedStore, UpsertOutcome, ValidatorCache};
pub use sqlite::{SqliteFeedRepository, SqliteRankedStore, SqliteStorage, SqliteValidatorCache};

use crate::errors::FeederResult;

/// Run synchronous storage work on tokio's blocking pool.
///
/// Every store call made from inside the poll fan-out goes through here so
/// the SQLite mutex is never waited on from a runtime worker.
pub async fn run_blocking<T, F>(work: F) -> FeederResult<T>
where
    F: FnOnce() -> FeederResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}
