// YouTube Data API v3 search backend.
//
// Two requests per search:
// 1. search.list   -> ids, titles, channels, thumbnails (relevance order)
// 2. videos.list   -> ISO 8601 durations for those ids
// The results are merged by video id so order always follows step 1.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::duration::label_from_iso8601;
use super::search::{CatalogItem, SearchOptions, SearchProvider};
use crate::error::SearchError;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

// YouTube's "Music" category
pub const MUSIC_CATEGORY_ID: &str = "10";

// ==========================================
// WIRE TYPES
// ==========================================
// Only the fields we read are modelled; serde ignores the rest.

#[derive(Debug, Deserialize)]
pub(crate) struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

impl Thumbnails {
    fn best_url(&self) -> String {
        self.medium
            .as_ref()
            .or(self.high.as_ref())
            .or(self.default.as_ref())
            .map(|thumb| thumb.url.clone())
            .unwrap_or_default()
    }
}

impl SearchListResponse {
    fn video_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| item.id.video_id.as_deref())
            .collect()
    }
}

// Combines both responses into catalog items, keeping search order.
// Videos with no duration entry get "PT0S", i.e. "0:00".
pub(crate) fn merge_results(search: SearchListResponse, details: VideoListResponse) -> Vec<CatalogItem> {
    let durations: HashMap<String, String> = details
        .items
        .into_iter()
        .map(|video| (video.id, video.content_details.duration))
        .collect();

    search
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let duration = durations.get(&video_id).map(String::as_str).unwrap_or("PT0S");
            Some(CatalogItem {
                duration_label: label_from_iso8601(duration),
                thumbnail_url: item.snippet.thumbnails.best_url(),
                title: decode_html_entities(&item.snippet.title),
                author_name: decode_html_entities(&item.snippet.channel_title),
                id: video_id,
            })
        })
        .collect()
}

// The Data API returns snippet text HTML-escaped ("Don&#39;t Stop Me Now"),
// sometimes with numeric references like &#x27; or &#8217;.
// Single pass, so "&amp;#39;" decodes to the literal text "&#39;".
fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ==========================================
// PROVIDER
// ==========================================
pub struct DataApiSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    category_id: Option<String>,
    options: SearchOptions,
}

impl DataApiSearch {
    pub fn new(api_key: Option<String>, options: SearchOptions) -> Self {
        DataApiSearch {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_API_BASE.to_string(),
            category_id: Some(MUSIC_CATEGORY_ID.to_string()),
            options,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `None` searches across all categories.
    pub fn with_category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id.filter(|id| !id.is_empty());
        self
    }

    fn search_params<'a>(&'a self, query: &'a str, key: &'a str, max_results: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("maxResults", max_results),
            ("order", "relevance"),
        ];
        if let Some(category) = &self.category_id {
            params.push(("videoCategoryId", category.as_str()));
        }
        params.push(("key", key));
        params
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T, SearchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint, %status, "YouTube Data API request rejected");
            return Err(SearchError::Status { endpoint, status });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SearchProvider for DataApiSearch {
    fn name(&self) -> &'static str {
        "data-api"
    }

    async fn search(&self, raw_query: &str) -> Result<Vec<CatalogItem>, SearchError> {
        let Some(query) = self.options.build_query(raw_query) else {
            return Ok(Vec::new());
        };
        let key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;
        let max_results = self.options.max_results.to_string();

        tracing::debug!(%query, "searching YouTube Data API");
        let search: SearchListResponse = self
            .get_json("search", &self.search_params(&query, key, &max_results))
            .await?;

        let ids = search.video_ids().join(",");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let details: VideoListResponse = self
            .get_json("videos", &[("part", "contentDetails"), ("id", ids.as_str()), ("key", key)])
            .await?;

        let results = merge_results(search, details);
        tracing::info!(%query, count = results.len(), "search finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "kind": "youtube#searchListResponse",
        "items": [
            {
                "id": { "kind": "youtube#video", "videoId": "vid-one" },
                "snippet": {
                    "title": "Don&#39;t Stop Me Now (Karaoke)",
                    "channelTitle": "Sing King",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/vi/vid-one/default.jpg" },
                        "medium": { "url": "https://i.ytimg.com/vi/vid-one/mqdefault.jpg" }
                    }
                }
            },
            {
                "id": { "kind": "youtube#video", "videoId": "vid-two" },
                "snippet": {
                    "title": "Bohemian Rhapsody",
                    "channelTitle": "Rock &amp; Roll Karaoke",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/vi/vid-two/default.jpg" }
                    }
                }
            },
            {
                "id": { "kind": "youtube#channel" },
                "snippet": { "title": "Some channel", "channelTitle": "Some channel" }
            }
        ]
    }"#;

    // Details come back in a different order and miss one video.
    const VIDEOS_JSON: &str = r#"{
        "items": [
            { "id": "vid-two", "contentDetails": { "duration": "PT1H0M7S" } }
        ]
    }"#;

    fn parse() -> (SearchListResponse, VideoListResponse) {
        (
            serde_json::from_str(SEARCH_JSON).unwrap(),
            serde_json::from_str(VIDEOS_JSON).unwrap(),
        )
    }

    #[test]
    fn merge_keeps_search_order_and_matches_durations_by_id() {
        let (search, details) = parse();
        let items = merge_results(search, details);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "vid-one");
        assert_eq!(items[0].duration_label, "0:00");
        assert_eq!(items[1].id, "vid-two");
        assert_eq!(items[1].duration_label, "1:00:07");
    }

    #[test]
    fn merge_prefers_medium_thumbnail_and_decodes_titles() {
        let (search, details) = parse();
        let items = merge_results(search, details);

        assert_eq!(items[0].title, "Don't Stop Me Now (Karaoke)");
        assert_eq!(items[0].thumbnail_url, "https://i.ytimg.com/vi/vid-one/mqdefault.jpg");
        assert_eq!(items[1].author_name, "Rock & Roll Karaoke");
        assert_eq!(items[1].thumbnail_url, "https://i.ytimg.com/vi/vid-two/default.jpg");
    }

    #[test]
    fn channel_results_are_not_asked_for_durations() {
        let (search, _) = parse();
        assert_eq!(search.video_ids(), vec!["vid-one", "vid-two"]);
    }

    #[test]
    fn search_params_include_category_only_when_set() {
        let provider = DataApiSearch::new(Some("key".into()), SearchOptions::default());
        let params = provider.search_params("abba karaoke", "key", "10");
        assert!(params.contains(&("videoCategoryId", "10")));
        assert!(params.contains(&("q", "abba karaoke")));
        assert!(params.contains(&("order", "relevance")));

        let any_category = DataApiSearch::new(Some("key".into()), SearchOptions::default()).with_category(None);
        let params = any_category.search_params("abba karaoke", "key", "10");
        assert!(!params.iter().any(|(name, _)| *name == "videoCategoryId"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = DataApiSearch::new(Some("   ".into()), SearchOptions::default());
        let err = provider.search("queen").await.unwrap_err();
        assert!(matches!(err, SearchError::MissingApiKey));
    }

    #[tokio::test]
    async fn blank_query_returns_nothing() {
        let provider = DataApiSearch::new(None, SearchOptions::default());
        assert!(provider.search("   ").await.unwrap().is_empty());
    }

    #[test]
    fn numeric_entities_are_decoded() {
        assert_eq!(decode_html_entities("Don&#x27;t Stop"), "Don't Stop");
        assert_eq!(decode_html_entities("Don&#8217;t Stop"), "Don\u{2019}t Stop");
        assert_eq!(decode_html_entities("&quot;Hello&quot; &lt;live&gt;"), "\"Hello\" <live>");
    }

    #[test]
    fn escaped_entities_and_stray_ampersands_are_kept_literal() {
        assert_eq!(decode_html_entities("&amp;#39;"), "&#39;");
        assert_eq!(decode_html_entities("Salt & Pepa"), "Salt & Pepa");
        assert_eq!(decode_html_entities("&bogus; &#xZZ; &"), "&bogus; &#xZZ; &");
    }
}
