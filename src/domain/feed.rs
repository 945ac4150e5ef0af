use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{FeederError, FeederResult};

/// A feed URL tracked by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Option<i64>,
    pub url: String,
    pub title: Option<String>,
    pub created_at: Option<String>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            id: None,
            url,
            title: None,
            created_at: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    /// Title when known, URL otherwise
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

/// Host (with non-default port) plus path of a feed URL.
///
/// Namespaces the feed's items inside the shared global collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedIdentity(String);

impl FeedIdentity {
    pub fn from_url(feed_url: &str) -> FeederResult<Self> {
        let parsed = parse_feed_url(feed_url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| FeederError::InvalidUrl(format!("{}: missing host", feed_url)))?;

        let identity = match parsed.port() {
            Some(port) => format!("{}:{}{}", host, port, parsed.path()),
            None => format!("{}{}", host, parsed.path()),
        };

        Ok(Self(identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FeedIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for FeedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse and check that a URL can be polled (http or https with a host)
pub fn parse_feed_url(feed_url: &str) -> FeederResult<Url> {
    let parsed = Url::parse(feed_url.trim())
        .map_err(|e| FeederError::InvalidUrl(format!("{}: {}", feed_url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(FeederError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                feed_url, other
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FeederError::InvalidUrl(format!("{}: missing host", feed_url)));
    }

    Ok(parsed)
}
