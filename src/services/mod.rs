pub mod feed_service;
pub mod fetch_service;
pub mod import_export_service;
pub mod ingest_service;
pub mod normalize_service;
pub mod pipeline_service;
pub mod poll_scheduler;
pub mod retention_service;

pub use feed_service::FeedService;
pub use fetch_service::{FetchOutcome, FetchService};
pub use import_export_service::{ImportExportService, ImportResult};
pub use ingest_service::{IngestService, IngestSummary, DEFAULT_PAGE_SIZE};
pub use normalize_service::NormalizeService;
pub use pipeline_service::{FeedReport, PipelineService};
pub use poll_scheduler::{CycleReport, Jitter, PollScheduler, SchedulerConfig, SchedulerState};
pub use retention_service::RetentionService;
