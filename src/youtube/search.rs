// Search contract between the catalog backends and the rest of the app.
//
// A provider takes free text and hands back fully-populated CatalogItems in
// relevance order. The queue never talks to a provider directly; the UI
// passes chosen items to the queue.

use async_trait::async_trait;

use crate::error::SearchError;

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

// ==========================================
// CATALOG ITEM
// ==========================================
// One playable video as returned by search. Immutable once built:
// there are no setters, and the queue wraps it rather than editing it.
//
// id:             YouTube video id, e.g. "dQw4w9WgXcQ"
// title:          video title as shown on YouTube
// author_name:    channel name
// thumbnail_url:  medium-size thumbnail (may be empty if YouTube had none)
// duration_label: already formatted for display, e.g. "4:13"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub author_name: String,
    pub thumbnail_url: String,
    pub duration_label: String,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author_name: impl Into<String>,
        thumbnail_url: impl Into<String>,
        duration_label: impl Into<String>,
    ) -> Self {
        CatalogItem {
            id: id.into(),
            title: title.into(),
            author_name: author_name.into(),
            thumbnail_url: thumbnail_url.into(),
            duration_label: duration_label.into(),
        }
    }

    /// Public watch page for this video.
    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL_BASE, self.id)
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short name used in logs and the header ("data-api", "yt-dlp").
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, SearchError>;
}

// Knobs shared by every provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub max_results: usize,
    pub query_suffix: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_results: 10,
            query_suffix: "karaoke".to_string(),
        }
    }
}

impl SearchOptions {
    /// Turns user input into the query actually sent to YouTube.
    ///
    /// Returns None for blank input so providers can skip the request.
    pub fn build_query(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let suffix = self.query_suffix.trim();
        if suffix.is_empty() {
            Some(trimmed.to_string())
        } else {
            Some(format!("{} {}", trimmed, suffix))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_are_skipped() {
        let options = SearchOptions::default();
        assert_eq!(options.build_query(""), None);
        assert_eq!(options.build_query("   \t"), None);
    }

    #[test]
    fn suffix_is_appended_to_trimmed_query() {
        let options = SearchOptions::default();
        assert_eq!(
            options.build_query("  bohemian rhapsody "),
            Some("bohemian rhapsody karaoke".to_string())
        );

        let plain = SearchOptions {
            max_results: 5,
            query_suffix: String::new(),
        };
        assert_eq!(plain.build_query("dancing queen"), Some("dancing queen".to_string()));
    }

    #[test]
    fn watch_url_uses_catalog_id() {
        let item = CatalogItem::new("abc123", "Song", "Channel", "", "3:00");
        assert_eq!(item.watch_url(), "https://www.youtube.com/watch?v=abc123");
    }
}
