use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{FeedIdentity, IngestionRecord};
use crate::errors::FeederResult;
use crate::sources::traits::FeedParser;

/// Turns a fetched feed body into ingestion records.
pub struct NormalizeService {
    parser: Arc<dyn FeedParser>,
    /// `None` when the window is wider than chrono can represent
    max_age: Option<Duration>,
}

impl NormalizeService {
    pub fn new(parser: Arc<dyn FeedParser>, max_age_days: i64) -> Self {
        Self {
            parser,
            max_age: Duration::try_days(max_age_days),
        }
    }

    /// Oldest publish time still accepted at `ingest_time` (inclusive).
    ///
    /// A window reaching past the earliest representable time accepts everything.
    pub fn cutoff(&self, ingest_time: DateTime<Utc>) -> DateTime<Utc> {
        self.max_age
            .and_then(|age| ingest_time.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Parse `raw` and keep dated items no older than the cutoff.
    ///
    /// A parse failure discards the whole document. Order is preserved and
    /// nothing is deduplicated here.
    pub fn normalize(
        &self,
        identity: &FeedIdentity,
        raw: &[u8],
        ingest_time: DateTime<Utc>,
    ) -> FeederResult<Vec<IngestionRecord>> {
        let items = self.parser.parse(raw)?;
        let cutoff = self.cutoff(ingest_time);

        let records = items
            .into_iter()
            .filter_map(|item| {
                let Some(published) = item.published else {
                    debug!(feed = %identity, link = %item.link, "no publish time, skipping");
                    return None;
                };

                if published < cutoff {
                    return None;
                }

                Some(IngestionRecord::new(
                    identity.clone(),
                    item.link,
                    item.title,
                    published.timestamp(),
                ))
            })
            .collect();

        Ok(records)
    }
}
