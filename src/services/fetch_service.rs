use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::sources::traits::HttpTransport;
use crate::storage::run_blocking;
use crate::storage::traits::ValidatorCache;

/// What a conditional fetch of one feed URL produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Server confirmed the cached validator, no body transferred
    NotModified,
    Fetched {
        body: Vec<u8>,
        validator: Option<String>,
    },
    HttpError(u16),
    NetworkError(String),
}

/// Conditional retrieval of feed documents.
///
/// Only a `200` full retrieval with an entity tag writes to the validator
/// cache. Feeds that never send one are re-downloaded every cycle.
pub struct FetchService {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn ValidatorCache>,
}

impl FetchService {
    pub fn new(transport: Arc<dyn HttpTransport>, cache: Arc<dyn ValidatorCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn fetch(&self, feed_url: &str) -> FetchOutcome {
        let cache = Arc::clone(&self.cache);
        let url = feed_url.to_string();
        let validator = match run_blocking(move || cache.get_validator(&url)).await {
            Ok(v) => v.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(feed = %feed_url, error = %e, "validator lookup failed, fetching in full");
                None
            }
        };

        if let Some(validator) = validator {
            match self.transport.head(feed_url, &validator).await {
                Ok(response)
                    if response.is_not_modified()
                        || response.etag.as_deref() == Some(validator.as_str()) =>
                {
                    debug!(feed = %feed_url, status = response.status, "not modified, skipping");
                    return FetchOutcome::NotModified;
                }
                Ok(response) => {
                    debug!(feed = %feed_url, status = response.status, "validator rejected");
                }
                Err(e) => {
                    warn!(feed = %feed_url, error = %e, "HEAD failed");
                    return FetchOutcome::NetworkError(e.to_string());
                }
            }
        }

        debug!(feed = %feed_url, "GET");
        let response = match self.transport.get(feed_url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(feed = %feed_url, error = %e, "GET failed");
                return FetchOutcome::NetworkError(e.to_string());
            }
        };

        if response.is_not_modified() {
            return FetchOutcome::NotModified;
        }

        if !response.is_ok() {
            warn!(feed = %feed_url, status = response.status, "unexpected HTTP status");
            return FetchOutcome::HttpError(response.status);
        }

        if let Some(etag) = &response.etag {
            info!(feed = %feed_url, etag = %etag, "new validator");
            let cache = Arc::clone(&self.cache);
            let (url, etag) = (feed_url.to_string(), etag.clone());
            let observed_at = Utc::now().timestamp();
            let stored = run_blocking(move || cache.set_validator(&url, &etag, observed_at)).await;
            if let Err(e) = stored {
                warn!(feed = %feed_url, error = %e, "failed to store validator");
            }
        }

        FetchOutcome::Fetched {
            body: response.body,
            validator: response.etag,
        }
    }
}
