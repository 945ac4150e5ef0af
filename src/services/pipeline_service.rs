use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::FeedIdentity;
use crate::services::fetch_service::{FetchOutcome, FetchService};
use crate::services::ingest_service::{IngestService, IngestSummary};
use crate::services::normalize_service::NormalizeService;
use crate::storage::run_blocking;

/// How one feed's fetch → normalize → upsert run ended
#[derive(Debug, Clone, PartialEq)]
pub enum FeedReport {
    NotModified,
    Ingested { items: usize, summary: IngestSummary },
    Failed(String),
}

/// Runs the whole ingestion path for a single feed URL.
///
/// Every failure is logged here and reported, never propagated.
pub struct PipelineService {
    fetcher: FetchService,
    normalizer: NormalizeService,
    ingest: IngestService,
}

impl PipelineService {
    pub fn new(fetcher: FetchService, normalizer: NormalizeService, ingest: IngestService) -> Self {
        Self {
            fetcher,
            normalizer,
            ingest,
        }
    }

    pub async fn process(&self, feed_url: &str) -> FeedReport {
        let identity = match FeedIdentity::from_url(feed_url) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(feed = %feed_url, error = %e, "skipping unparseable feed URL");
                return FeedReport::Failed(e.to_string());
            }
        };

        let body = match self.fetcher.fetch(feed_url).await {
            FetchOutcome::Fetched { body, validator } => {
                debug!(feed = %feed_url, bytes = body.len(), etag = ?validator, "fetched");
                body
            }
            FetchOutcome::NotModified => return FeedReport::NotModified,
            FetchOutcome::HttpError(status) => {
                return FeedReport::Failed(format!("HTTP status {}", status))
            }
            FetchOutcome::NetworkError(cause) => return FeedReport::Failed(cause),
        };

        let records = match self.normalizer.normalize(&identity, &body, Utc::now()) {
            Ok(records) => records,
            Err(e) => {
                warn!(feed = %feed_url, error = %e, "discarding feed body");
                return FeedReport::Failed(e.to_string());
            }
        };

        let items = records.len();
        let ingest = self.ingest.clone();
        let url = feed_url.to_string();
        let summary = match run_blocking(move || Ok(ingest.ingest_all(&url, &records))).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(feed = %feed_url, error = %e, "ingest task failed");
                return FeedReport::Failed(e.to_string());
            }
        };
        info!(
            feed = %feed_url,
            items,
            inserted = summary.inserted,
            updated = summary.updated,
            failed = summary.failed,
            "ingested"
        );

        FeedReport::Ingested { items, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;

    use crate::domain::CollectionKey;
    use crate::sources::traits::{HttpResponse, MockFeedParser, MockHttpTransport, ParsedItem};
    use crate::storage::sqlite::{SqliteRankedStore, SqliteStorage, SqliteValidatorCache};
    use crate::storage::traits::{MockRankedStore, RankedStore, UpsertOutcome};

    const FEED: &str = "https://a.example/feed";

    fn ok_body() -> HttpResponse {
        HttpResponse {
            status: 200,
            etag: None,
            body: b"<rss/>".to_vec(),
        }
    }

    fn pipeline(
        transport: MockHttpTransport,
        parser: MockFeedParser,
        store: Arc<dyn RankedStore>,
    ) -> PipelineService {
        let storage = SqliteStorage::in_memory().unwrap();
        PipelineService::new(
            FetchService::new(Arc::new(transport), Arc::new(SqliteValidatorCache::new(storage))),
            NormalizeService::new(Arc::new(parser), 90),
            IngestService::new(store),
        )
    }

    #[tokio::test]
    async fn test_fetched_items_are_ingested() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|_| Ok(ok_body()));
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| {
            Ok(vec![ParsedItem {
                link: "https://a.example/p1".to_string(),
                title: "Hello".to_string(),
                published: Some(Utc::now() - Duration::hours(1)),
            }])
        });
        let store = Arc::new(SqliteRankedStore::new(SqliteStorage::in_memory().unwrap()));

        let report = pipeline(transport, parser, store.clone()).process(FEED).await;

        assert!(matches!(report, FeedReport::Ingested { items: 1, .. }));
        assert_eq!(store.count(&CollectionKey::global()).unwrap(), 1);
        assert_eq!(store.count(&CollectionKey::feed(FEED)).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_http_error_touches_nothing() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|_| {
            Ok(HttpResponse {
                status: 404,
                ..Default::default()
            })
        });
        let mut parser = MockFeedParser::new();
        parser.expect_parse().never();
        let mut store = MockRankedStore::new();
        store.expect_upsert().never();

        let report = pipeline(transport, parser, Arc::new(store)).process(FEED).await;

        assert_eq!(report, FeedReport::Failed("HTTP status 404".to_string()));
    }

    #[tokio::test]
    async fn test_parse_error_ingests_nothing() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|_| Ok(ok_body()));
        let mut parser = MockFeedParser::new();
        parser
            .expect_parse()
            .returning(|_| Err(crate::errors::FeederError::FeedParse("bad xml".to_string())));
        let mut store = MockRankedStore::new();
        store.expect_upsert().never();

        let report = pipeline(transport, parser, Arc::new(store)).process(FEED).await;

        assert!(matches!(report, FeedReport::Failed(msg) if msg.contains("bad xml")));
    }

    #[tokio::test]
    async fn test_invalid_feed_url_fails_before_fetching() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().never();
        transport.expect_head().never();
        let store = Arc::new(SqliteRankedStore::new(SqliteStorage::in_memory().unwrap()));

        let report = pipeline(transport, MockFeedParser::new(), store)
            .process("not-a-url")
            .await;

        assert!(matches!(report, FeedReport::Failed(_)));
    }

    #[tokio::test]
    async fn test_slow_store_does_not_stall_the_runtime() {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|_| Ok(ok_body()));
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| {
            Ok(vec![ParsedItem {
                link: "https://a.example/p1".to_string(),
                title: "Hello".to_string(),
                published: Some(Utc::now() - Duration::hours(1)),
            }])
        });
        let mut store = MockRankedStore::new();
        store.expect_upsert().times(2).returning(|_, _, _| {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(UpsertOutcome::Inserted)
        });

        // Single-threaded runtime: the timer only fires if the upserts
        // run somewhere else
        let started = std::time::Instant::now();
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            started.elapsed()
        });

        let report = pipeline(transport, parser, Arc::new(store)).process(FEED).await;
        let ticked_after = ticker.await.unwrap();

        assert!(matches!(report, FeedReport::Ingested { items: 1, .. }));
        assert!(
            ticked_after < std::time::Duration::from_millis(300),
            "timer was held up for {:?}",
            ticked_after
        );
    }
}
