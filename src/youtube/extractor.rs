// yt-dlp search backend
// Searches YouTube through a yt-dlp subprocess, so it works without an API key

use async_trait::async_trait;
use std::process::Command;

use super::duration::format_seconds;
use super::search::{CatalogItem, SearchOptions, SearchProvider};
use crate::error::SearchError;

pub struct YtDlpSearch {
    program: String,
    options: SearchOptions,
}

impl YtDlpSearch {
    pub fn new(program: impl Into<String>, options: SearchOptions) -> Self {
        YtDlpSearch {
            program: program.into(),
            options,
        }
    }

    // Blocking part of the search: run yt-dlp and parse one JSON object per line
    fn run_blocking(program: &str, query: &str, max_results: usize) -> Result<Vec<CatalogItem>, SearchError> {
        let output = Command::new(program)
            .arg("--dump-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--default-search")
            .arg("ytsearch")
            .arg(format!("ytsearch{}:{}", max_results, query))
            .output()
            .map_err(|e| SearchError::Extractor(format!("failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::Extractor(error.trim().to_string()));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| SearchError::Extractor(format!("invalid UTF-8: {}", e)))?;

        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_search_line)
            .collect()
    }
}

// One line of `yt-dlp --dump-json` output -> CatalogItem
pub(crate) fn parse_search_line(line: &str) -> Result<CatalogItem, SearchError> {
    let json: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| SearchError::Extractor(format!("JSON parse error: {}", e)))?;

    let id = json["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SearchError::Extractor("result without a video id".to_string()))?;

    // Live streams report no duration; yt-dlp sometimes gives a float
    let duration = json["duration"]
        .as_u64()
        .or_else(|| json["duration"].as_f64().map(|secs| secs.max(0.0).round() as u64))
        .unwrap_or(0);

    let author = json["channel"]
        .as_str()
        .or_else(|| json["uploader"].as_str())
        .unwrap_or("Unknown");

    Ok(CatalogItem {
        id: id.to_string(),
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        author_name: author.to_string(),
        thumbnail_url: json["thumbnail"].as_str().unwrap_or_default().to_string(),
        duration_label: format_seconds(duration),
    })
}

#[async_trait]
impl SearchProvider for YtDlpSearch {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn search(&self, raw_query: &str) -> Result<Vec<CatalogItem>, SearchError> {
        let Some(query) = self.options.build_query(raw_query) else {
            return Ok(Vec::new());
        };

        // Run yt-dlp in a blocking task to avoid blocking async runtime
        let program = self.program.clone();
        let max_results = self.options.max_results;
        tracing::debug!(%query, %program, "searching with yt-dlp");

        let results = tokio::task::spawn_blocking(move || Self::run_blocking(&program, &query, max_results))
            .await
            .map_err(|e| SearchError::Extractor(format!("task join error: {}", e)))??;

        tracing::info!(count = results.len(), "yt-dlp search finished");
        Ok(results)
    }
}
