use clap::{Parser, Subcommand};

use crate::services::DEFAULT_PAGE_SIZE;

#[derive(Parser)]
#[command(name = "feedrank")]
#[command(about = "Jittered feed poller with a recency-ranked item store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a feed URL to the registry
    Add {
        /// Feed URL to add
        url: String,

        /// Optional display title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Remove a feed (interactive selection unless --url is given)
    Remove {
        /// Remove this URL without prompting
        #[arg(long)]
        url: Option<String>,
    },

    /// List all feeds
    List,

    /// Import feeds from OPML file
    Import {
        /// Path to OPML file
        path: String,
    },

    /// Export feeds to OPML format
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Poll all feeds on a fixed cadence until interrupted
    Run {
        /// Run a single polling cycle and exit
        #[arg(long)]
        once: bool,

        /// Override the maximum per-feed start delay, in seconds
        #[arg(long)]
        max_wait_secs: Option<u64>,
    },

    /// Show the newest items, globally or for one feed
    Latest {
        /// Only items of this feed URL
        #[arg(long)]
        feed: Option<String>,

        /// Maximum number of items
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show entry counts of the ranked collections
    Stats,
}
