use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedrank::cli::{Cli, Commands};
use feedrank::config::Config;
use feedrank::errors::{FeederError, FeederResult};
use feedrank::services::{
    FeedService, FetchService, ImportExportService, IngestService, NormalizeService,
    PipelineService, PollScheduler, RetentionService, SchedulerConfig, SchedulerState,
};
use feedrank::sources::{FeedRsParser, ReqwestTransport};
use feedrank::storage::sqlite::{
    SqliteFeedRepository, SqliteRankedStore, SqliteStorage, SqliteValidatorCache,
};

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays clean
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedrank=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("loading configuration")?;

    // One connection handle for the whole process
    let storage = SqliteStorage::new(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;

    match cli.command {
        Commands::Add { url, title } => cmd_add(&url, title, storage)?,
        Commands::Remove { url } => cmd_remove(url, storage)?,
        Commands::List => cmd_list(storage)?,
        Commands::Import { path } => cmd_import(&path, storage)?,
        Commands::Export { output } => cmd_export(storage, output)?,
        Commands::Run {
            once,
            max_wait_secs,
        } => cmd_run(storage, &config, once, max_wait_secs).await?,
        Commands::Latest { feed, limit, json } => cmd_latest(storage, feed, limit, json)?,
        Commands::Stats => cmd_stats(storage)?,
    }

    Ok(())
}

fn cmd_add(url: &str, title: Option<String>, storage: SqliteStorage) -> FeederResult<()> {
    let service = FeedService::new(SqliteFeedRepository::new(storage));

    match service.add(url, title) {
        Ok(feed) => {
            println!("Feed added: {}", feed.url);
            Ok(())
        }
        Err(FeederError::FeedAlreadyExists(url)) => {
            println!("Feed already exists: {}", url);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_remove(url: Option<String>, storage: SqliteStorage) -> FeederResult<()> {
    let service = FeedService::new(SqliteFeedRepository::new(storage));

    if let Some(url) = url {
        let feed = service.remove_url(&url)?;
        println!("Removed: {}", feed.url);
        return Ok(());
    }

    let feeds = service.list()?;

    if feeds.is_empty() {
        println!("No feeds to remove.");
        return Ok(());
    }

    // Display numbered list
    println!("Select a feed to remove:\n");
    for (i, feed) in feeds.iter().enumerate() {
        println!("  {}. {}", i + 1, feed.display_name());
    }
    println!();

    // Read user input
    print!("Enter number (or 'q' to cancel): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.eq_ignore_ascii_case("q") {
        println!("Cancelled.");
        return Ok(());
    }

    let index: usize = input
        .parse()
        .map_err(|_| FeederError::InvalidInput("Invalid number".to_string()))?;

    if index == 0 || index > feeds.len() {
        return Err(FeederError::InvalidInput("Number out of range".to_string()));
    }

    let feed = &feeds[index - 1];
    let feed_id = feed
        .id
        .ok_or_else(|| FeederError::FeedNotFound("Feed has no ID".to_string()))?;

    service.remove(feed_id)?;
    println!("Removed: {}", feed.url);

    Ok(())
}

fn cmd_list(storage: SqliteStorage) -> FeederResult<()> {
    let service = FeedService::new(SqliteFeedRepository::new(storage));
    let feeds = service.list()?;

    if feeds.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    println!("Configured feeds:\n");
    for feed in feeds {
        match &feed.title {
            Some(title) => println!("  {}\n    URL: {}", title, feed.url),
            None => println!("  {}", feed.url),
        }
    }

    Ok(())
}

fn cmd_import(path: &str, storage: SqliteStorage) -> FeederResult<()> {
    let content = fs::read_to_string(path)?;
    let service = ImportExportService::new(SqliteFeedRepository::new(storage));

    println!("Importing feeds from {}...\n", path);

    let result = service.import_opml(&content)?;

    if !result.added.is_empty() {
        println!("Added {} feeds:", result.added.len());
        for feed in &result.added {
            println!("  + {}", feed.url);
        }
        println!();
    }

    if !result.duplicates.is_empty() {
        println!("Skipped {} duplicates:", result.duplicates.len());
        for url in &result.duplicates {
            println!("  - {}", url);
        }
        println!();
    }

    if !result.invalid.is_empty() {
        println!("Failed {} feeds:", result.invalid.len());
        for (url, error) in &result.invalid {
            println!("  ! {}: {}", url, error);
        }
        println!();
    }

    println!(
        "Import complete: {} added, {} duplicates, {} failed",
        result.added.len(),
        result.duplicates.len(),
        result.invalid.len()
    );

    Ok(())
}

fn cmd_export(storage: SqliteStorage, output: Option<String>) -> FeederResult<()> {
    let service = ImportExportService::new(SqliteFeedRepository::new(storage));
    let opml = service.export_opml()?;

    match output {
        Some(path) => {
            fs::write(&path, &opml)?;
            println!("Exported feeds to {}", path);
        }
        None => {
            println!("{}", opml);
        }
    }

    Ok(())
}

async fn cmd_run(
    storage: SqliteStorage,
    config: &Config,
    once: bool,
    max_wait_secs: Option<u64>,
) -> anyhow::Result<()> {
    let mut scheduler_config = SchedulerConfig::from(config);
    if let Some(secs) = max_wait_secs {
        scheduler_config.max_wait = Duration::from_secs(secs);
    }

    let transport = ReqwestTransport::new(&config.user_agent, config.fetch_timeout)
        .context("building HTTP client")?;
    let store = Arc::new(SqliteRankedStore::new(storage.clone()));

    let pipeline = PipelineService::new(
        FetchService::new(
            Arc::new(transport),
            Arc::new(SqliteValidatorCache::new(storage.clone())),
        ),
        NormalizeService::new(Arc::new(FeedRsParser::new()), config.max_age_days),
        IngestService::new(store.clone()),
    );

    let scheduler = PollScheduler::new(
        Arc::new(SqliteFeedRepository::new(storage)),
        Arc::new(pipeline),
        RetentionService::new(store, config.max_entries),
        scheduler_config,
    );

    if once {
        println!("Fetching feeds...");
        match scheduler.run_cycle().await {
            SchedulerState::Idle => println!("No feeds configured."),
            SchedulerState::Polling(report) => println!(
                "Fetched {} of {} feeds ({} not modified, {} failed): {} new items, {} trimmed.",
                report.fetched,
                report.feeds,
                report.not_modified,
                report.failed,
                report.new_items,
                report.trimmed
            ),
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, finishing current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler.run(shutdown_rx).await;
    Ok(())
}

fn cmd_latest(
    storage: SqliteStorage,
    feed: Option<String>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let service = IngestService::new(Arc::new(SqliteRankedStore::new(storage)));
    let posts = service.latest(feed.as_deref(), limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    if posts.is_empty() {
        println!("No entries yet.");
        return Ok(());
    }

    for post in posts {
        println!(
            "{}  [{}] {}\n    {}",
            post.published_at.format("%Y-%m-%d %H:%M"),
            post.feed_identity,
            post.title,
            post.link
        );
    }

    Ok(())
}

fn cmd_stats(storage: SqliteStorage) -> FeederResult<()> {
    let feeds = FeedService::new(SqliteFeedRepository::new(storage.clone())).list()?;
    let ingest = IngestService::new(Arc::new(SqliteRankedStore::new(storage)));

    println!("Global collection: {} entries", ingest.count(None)?);
    for feed in feeds {
        println!("  {}: {} entries", feed.url, ingest.count(Some(&feed.url))?);
    }

    Ok(())
}
