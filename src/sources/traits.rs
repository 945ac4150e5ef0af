use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::FeederResult;

/// One entry as read from a feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub link: String,
    pub title: String,
    pub published: Option<DateTime<Utc>>,
}

/// Turns raw feed bytes (RSS, Atom or JSON Feed) into items.
#[cfg_attr(test, mockall::automock)]
pub trait FeedParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> FeederResult<Vec<ParsedItem>>;
}

/// Status, entity tag and body of an HTTP exchange
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub etag: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

/// Outbound HTTP used by the fetcher.
///
/// Errors are client-side failures (connect, timeout, TLS); any status
/// code the server sends back is an `Ok` response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Bodyless request carrying `If-None-Match: validator`
    async fn head(&self, url: &str, validator: &str) -> FeederResult<HttpResponse>;

    /// Full retrieval
    async fn get(&self, url: &str) -> FeederResult<HttpResponse>;
}
