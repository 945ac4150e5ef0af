use crate::domain::{parse_feed_url, Feed};
use crate::errors::{FeederError, FeederResult};
use crate::storage::traits::FeedRepository;

pub struct FeedService<R: FeedRepository> {
    repository: R,
}

impl<R: FeedRepository> FeedService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Add a new feed URL to the registry
    /// Only the URL shape is checked; the first poll decides if it is a feed
    pub fn add(&self, url: &str, title: Option<String>) -> FeederResult<Feed> {
        let url = parse_feed_url(url)?.to_string();

        if self.repository.exists(&url)? {
            return Err(FeederError::FeedAlreadyExists(url));
        }

        let feed = Feed::new(url).with_title(title);
        let id = self.repository.add(&feed)?;

        Ok(Feed {
            id: Some(id),
            ..feed
        })
    }

    /// Remove a feed by ID
    pub fn remove(&self, id: i64) -> FeederResult<()> {
        self.repository.remove(id)
    }

    /// Remove a feed by URL, spelled any way `add` would have accepted it
    pub fn remove_url(&self, url: &str) -> FeederResult<Feed> {
        let url = parse_feed_url(url)?.to_string();

        if self.repository.remove_by_url(&url)? {
            Ok(Feed::new(url))
        } else {
            Err(FeederError::FeedNotFound(url))
        }
    }

    /// List all feeds
    pub fn list(&self) -> FeederResult<Vec<Feed>> {
        self.repository.get_all()
    }

    /// Check if a feed URL already exists
    pub fn exists(&self, url: &str) -> FeederResult<bool> {
        self.repository.exists(url)
    }
}
