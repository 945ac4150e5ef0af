use opml::{Outline, OPML};

use crate::domain::{parse_feed_url, Feed};
use crate::errors::{FeederError, FeederResult};
use crate::storage::traits::FeedRepository;

pub struct ImportResult {
    pub added: Vec<Feed>,
    pub invalid: Vec<(String, String)>, // (url, error_message)
    pub duplicates: Vec<String>,
}

pub struct ImportExportService<R: FeedRepository> {
    repository: R,
}

impl<R: FeedRepository> ImportExportService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Import feeds from OPML content
    pub fn import_opml(&self, content: &str) -> FeederResult<ImportResult> {
        let opml = OPML::from_str(content)
            .map_err(|e| FeederError::OpmlParse(e.to_string()))?;

        let mut result = ImportResult {
            added: Vec::new(),
            invalid: Vec::new(),
            duplicates: Vec::new(),
        };

        for (raw_url, title) in extract_feeds(&opml.body.outlines) {
            let url = match parse_feed_url(&raw_url) {
                Ok(parsed) => parsed.to_string(),
                Err(e) => {
                    result.invalid.push((raw_url, e.to_string()));
                    continue;
                }
            };

            if self.repository.exists(&url)? {
                result.duplicates.push(url);
                continue;
            }

            let feed = Feed::new(url.clone()).with_title(title);
            match self.repository.add(&feed) {
                Ok(id) => result.added.push(Feed {
                    id: Some(id),
                    ..feed
                }),
                Err(FeederError::FeedAlreadyExists(_)) => result.duplicates.push(url),
                Err(e) => result.invalid.push((url, e.to_string())),
            }
        }

        Ok(result)
    }

    /// Export feeds to OPML format
    pub fn export_opml(&self) -> FeederResult<String> {
        let feeds = self.repository.get_all()?;

        let mut opml = OPML::default();
        opml.head = Some(opml::Head {
            title: Some("feedrank subscriptions".to_string()),
            ..Default::default()
        });

        for feed in feeds {
            let outline = Outline {
                text: feed.display_name().to_string(),
                r#type: Some("rss".to_string()),
                xml_url: Some(feed.url.clone()),
                title: feed.title.clone(),
                ..Default::default()
            };
            opml.body.outlines.push(outline);
        }

        opml.to_string()
            .map_err(|e| FeederError::OpmlParse(e.to_string()))
    }
}

/// Recursively collect (xmlUrl, title) pairs from OPML outlines
fn extract_feeds(outlines: &[Outline]) -> Vec<(String, Option<String>)> {
    let mut feeds = Vec::new();

    for outline in outlines {
        if let Some(url) = outline.xml_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                let title = outline.title.clone().or_else(|| Some(outline.text.clone()));
                feeds.push((url.to_string(), title));
            }
        }

        feeds.extend(extract_feeds(&outline.outlines));
    }

    feeds
}
