// Error types shared across the player, search and config modules.
// Queue operations never fail, so there is no queue error here.

use std::path::PathBuf;
use thiserror::Error;

// Everything that can go wrong while asking a catalog for videos.
// The UI collapses all of these into one "search unavailable" message.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("YouTube API key is not configured")]
    MissingApiKey,

    #[error("request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube returned {status} for {endpoint}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("yt-dlp search failed: {0}")]
    Extractor(String),
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to start player '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stop player: {0}")]
    Kill(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
