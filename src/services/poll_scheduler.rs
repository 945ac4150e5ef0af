use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::services::pipeline_service::{FeedReport, PipelineService};
use crate::services::retention_service::RetentionService;
use crate::storage::run_blocking;
use crate::storage::traits::FeedRepository;

/// Uniform random start delay in `[0, max_wait)`.
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    max_wait: Duration,
}

impl Jitter {
    pub fn new(max_wait: Duration) -> Self {
        Self { max_wait }
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn sample(&self) -> Duration {
        let max_ms = u64::try_from(self.max_wait.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub max_wait: Duration,
    pub poll_interval: Duration,
    pub idle_backoff: Duration,
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_wait: config.max_wait,
            poll_interval: config.poll_interval,
            idle_backoff: config.idle_backoff,
        }
    }
}

/// Tally of one polling cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds: usize,
    pub fetched: usize,
    pub not_modified: usize,
    pub failed: usize,
    pub new_items: usize,
    pub trimmed: usize,
}

/// Where a polling attempt left the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Registry empty (or unreadable), retry after the idle backoff
    Idle,
    /// A full cycle ran, next one after the poll interval
    Polling(CycleReport),
}

pub struct PollScheduler {
    registry: Arc<dyn FeedRepository>,
    pipeline: Arc<PipelineService>,
    retention: RetentionService,
    jitter: Jitter,
    config: SchedulerConfig,
}

impl PollScheduler {
    pub fn new(
        registry: Arc<dyn FeedRepository>,
        pipeline: Arc<PipelineService>,
        retention: RetentionService,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            pipeline,
            retention,
            jitter: Jitter::new(config.max_wait),
            config,
        }
    }

    /// Poll every registered feed once, then trim the global collection.
    ///
    /// Each feed runs in its own task after a jittered delay; the cycle
    /// returns only once all of them have finished.
    pub async fn run_cycle(&self) -> SchedulerState {
        let registry = Arc::clone(&self.registry);
        let feeds = match run_blocking(move || registry.get_all()).await {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!(error = %e, "failed to read feed registry");
                Vec::new()
            }
        };

        if feeds.is_empty() {
            info!("no feed to fetch yet");
            return SchedulerState::Idle;
        }

        info!(feeds = feeds.len(), "fetching feeds");

        let mut report = CycleReport {
            feeds: feeds.len(),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        for feed in feeds {
            let pipeline = Arc::clone(&self.pipeline);
            let delay = self.jitter.sample();
            tasks.spawn(async move {
                tokio::time::sleep(delay).await;
                pipeline.process(&feed.url).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(FeedReport::Ingested { summary, .. }) => {
                    report.fetched += 1;
                    report.new_items += summary.inserted;
                }
                Ok(FeedReport::NotModified) => report.not_modified += 1,
                Ok(FeedReport::Failed(_)) => report.failed += 1,
                Err(e) => {
                    warn!(error = %e, "feed task aborted");
                    report.failed += 1;
                }
            }
        }

        let retention = self.retention.clone();
        match run_blocking(move || retention.trim_global()).await {
            Ok(removed) => report.trimmed = removed,
            Err(e) => warn!(error = %e, "failed to trim global collection"),
        }

        info!(
            feeds = report.feeds,
            fetched = report.fetched,
            not_modified = report.not_modified,
            failed = report.failed,
            new_items = report.new_items,
            trimmed = report.trimmed,
            "cycle complete"
        );

        SchedulerState::Polling(report)
    }

    /// Poll until `shutdown` flips to `true` (or its sender goes away).
    ///
    /// Shutdown is only observed between cycles; a running cycle is always
    /// driven to completion first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        while !*shutdown.borrow() {
            let wait = match self.run_cycle().await {
                SchedulerState::Idle => self.config.idle_backoff,
                SchedulerState::Polling(_) => self.config.poll_interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::Feed;
    use crate::errors::FeederError;
    use crate::services::{FetchService, IngestService, NormalizeService};
    use crate::sources::traits::{HttpResponse, MockFeedParser, MockHttpTransport};
    use crate::storage::sqlite::{SqliteRankedStore, SqliteStorage, SqliteValidatorCache};
    use crate::storage::traits::MockFeedRepository;

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            max_wait: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
            idle_backoff: Duration::from_millis(10),
        }
    }

    fn scheduler(registry: MockFeedRepository, transport: MockHttpTransport) -> PollScheduler {
        let storage = SqliteStorage::in_memory().unwrap();
        let store = Arc::new(SqliteRankedStore::new(storage.clone()));
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| Ok(Vec::new()));

        let pipeline = PipelineService::new(
            FetchService::new(Arc::new(transport), Arc::new(SqliteValidatorCache::new(storage))),
            NormalizeService::new(Arc::new(parser), 90),
            IngestService::new(store.clone()),
        );

        PollScheduler::new(
            Arc::new(registry),
            Arc::new(pipeline),
            RetentionService::new(store, 100),
            config(),
        )
    }

    #[test]
    fn test_jitter_stays_below_max_wait() {
        let jitter = Jitter::new(Duration::from_millis(1_500));

        let samples: Vec<Duration> = (0..10_000).map(|_| jitter.sample()).collect();

        assert!(samples.iter().all(|d| *d < jitter.max_wait()));
        assert!(samples.iter().any(|d| *d != samples[0]), "jitter should vary");
    }

    #[test]
    fn test_zero_jitter_is_zero() {
        assert_eq!(Jitter::new(Duration::ZERO).sample(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_empty_registry_is_idle() {
        let mut registry = MockFeedRepository::new();
        registry.expect_get_all().returning(|| Ok(Vec::new()));
        let mut transport = MockHttpTransport::new();
        transport.expect_get().never();

        let state = scheduler(registry, transport).run_cycle().await;

        assert_eq!(state, SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_registry_failure_is_idle() {
        let mut registry = MockFeedRepository::new();
        registry
            .expect_get_all()
            .returning(|| Err(FeederError::Database(rusqlite::Error::InvalidQuery)));

        let state = scheduler(registry, MockHttpTransport::new()).run_cycle().await;

        assert_eq!(state, SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_failing_feed_does_not_abort_cycle() {
        let mut registry = MockFeedRepository::new();
        registry.expect_get_all().returning(|| {
            Ok(vec![
                Feed::new("https://up.example/feed".to_string()),
                Feed::new("https://down.example/feed".to_string()),
                Feed::new("https://gone.example/feed".to_string()),
            ])
        });

        let mut transport = MockHttpTransport::new();
        transport.expect_get().returning(|url| match url {
            "https://down.example/feed" => Err(FeederError::Network("timed out".to_string())),
            "https://gone.example/feed" => Ok(HttpResponse {
                status: 410,
                ..Default::default()
            }),
            _ => Ok(HttpResponse {
                status: 200,
                etag: None,
                body: b"<rss/>".to_vec(),
            }),
        });

        let state = scheduler(registry, transport).run_cycle().await;

        assert_eq!(
            state,
            SchedulerState::Polling(CycleReport {
                feeds: 3,
                fetched: 1,
                failed: 2,
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = MockFeedRepository::new();
        registry.expect_get_all().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        });

        let scheduler = scheduler(registry, MockHttpTransport::new());
        let (tx, rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        });

        tokio::time::timeout(Duration::from_secs(5), scheduler.run(rx))
            .await
            .expect("scheduler did not stop");
        stopper.await.unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let mut registry = MockFeedRepository::new();
        registry.expect_get_all().returning(|| Ok(Vec::new()));
        let scheduler = scheduler(registry, MockHttpTransport::new());
        let (tx, rx) = watch::channel(false);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), scheduler.run(rx))
            .await
            .expect("scheduler did not stop");
    }
}
