use feed_rs::parser;

use crate::errors::{FeederError, FeederResult};
use crate::sources::traits::{FeedParser, ParsedItem};

/// RSS, Atom and JSON Feed parsing backed by `feed-rs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedRsParser;

impl FeedRsParser {
    pub fn new() -> Self {
        Self
    }

    fn item_from_entry(entry: feed_rs::model::Entry) -> ParsedItem {
        let title = entry.title.map(|t| t.content).unwrap_or_default();

        // Prefer an alternate link, fall back to the first one listed
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let published = entry.published.or(entry.updated);

        ParsedItem {
            link,
            title: title.trim().to_string(),
            published,
        }
    }
}

impl FeedParser for FeedRsParser {
    fn parse(&self, raw: &[u8]) -> FeederResult<Vec<ParsedItem>> {
        let feed = parser::parse(raw).map_err(|e| FeederError::FeedParse(e.to_string()))?;

        Ok(feed.entries.into_iter().map(Self::item_from_entry).collect())
    }
}
