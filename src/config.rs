// User configuration, stored as TOML in the platform config directory.
// A missing default file just means "use defaults"; the command line and
// YOUTUBE_API_KEY override whatever the file says.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::ConfigError;
use crate::youtube::search::SearchOptions;

const APP_DIR: &str = "karaoke-night";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SearchBackend {
    /// Data API when an API key is configured, yt-dlp otherwise
    #[default]
    Auto,
    DataApi,
    YtDlp,
}

/// The backend actually used once `auto` has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBackend {
    DataApi,
    YtDlp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub search: SearchConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub backend: SearchBackend,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub max_results: usize,
    pub query_suffix: String,
    /// Empty string searches all categories
    pub video_category_id: String,
    pub yt_dlp_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            search: SearchConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let options = SearchOptions::default();
        SearchConfig {
            backend: SearchBackend::Auto,
            api_key: None,
            api_base_url: crate::youtube::data_api::DEFAULT_API_BASE.to_string(),
            max_results: options.max_results,
            query_suffix: options.query_suffix,
            video_category_id: crate::youtube::data_api::MUSIC_CATEGORY_ID.to_string(),
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            command: "mpv".to_string(),
            args: vec!["--force-window=yes".to_string()],
        }
    }
}

impl Config {
    pub fn app_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR))
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::app_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Loads the config from `explicit` (must exist) or from the default
    /// location (may be missing).
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(key) = &args.api_key {
            self.search.api_key = Some(key.clone());
        }
        if let Some(backend) = args.backend {
            self.search.backend = backend;
        }
        // Configured args belong to the configured player
        if let Some(player) = &args.player {
            self.player.command = player.clone();
            self.player.args.clear();
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.search
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Backend after resolving `auto`.
    pub fn effective_backend(&self) -> ResolvedBackend {
        match self.search.backend {
            SearchBackend::Auto if self.api_key().is_some() => ResolvedBackend::DataApi,
            SearchBackend::Auto => ResolvedBackend::YtDlp,
            SearchBackend::DataApi => ResolvedBackend::DataApi,
            SearchBackend::YtDlp => ResolvedBackend::YtDlp,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.search.max_results.clamp(1, 50),
            query_suffix: self.search.query_suffix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[search]
max_results = 5
query_suffix = "instrumental"

[player]
command = "vlc"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.search.query_suffix, "instrumental");
        assert_eq!(config.search.yt_dlp_path, "yt-dlp");
        assert_eq!(config.player.command, "vlc");
        assert_eq!(config.player.args, vec!["--force-window=yes".to_string()]);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search = 12").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn backend_names_are_kebab_case() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nbackend = \"yt-dlp\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.search.backend, SearchBackend::YtDlp);
    }

    #[test]
    fn auto_backend_depends_on_api_key() {
        let mut config = Config::default();
        assert_eq!(config.effective_backend(), ResolvedBackend::YtDlp);

        config.search.api_key = Some("  ".into());
        assert_eq!(config.effective_backend(), ResolvedBackend::YtDlp);

        config.search.api_key = Some("secret".into());
        assert_eq!(config.effective_backend(), ResolvedBackend::DataApi);

        config.search.backend = SearchBackend::YtDlp;
        assert_eq!(config.effective_backend(), ResolvedBackend::YtDlp);
    }

    #[test]
    fn explicit_data_api_without_key_stays_data_api() {
        let mut config = Config::default();
        config.search.backend = SearchBackend::DataApi;
        assert_eq!(config.effective_backend(), ResolvedBackend::DataApi);
    }

    #[test]
    fn command_line_overrides_file() {
        let mut config = Config::default();
        let args = Args {
            api_key: Some("from-env".into()),
            backend: Some(SearchBackend::DataApi),
            player: Some("celluloid".into()),
            log_level: Some("debug".into()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.api_key(), Some("from-env"));
        assert_eq!(config.search.backend, SearchBackend::DataApi);
        assert_eq!(config.player.command, "celluloid");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn player_override_drops_args_meant_for_mpv() {
        let mut config = Config::default();
        let args = Args {
            player: Some("vlc".into()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.player.command, "vlc");
        assert!(config.player.args.is_empty());
    }

    #[test]
    fn file_player_args_survive_when_player_is_not_overridden() {
        let mut config = Config::default();
        config.player.args = vec!["--fs".into()];

        config.apply_args(&Args {
            log_level: Some("warn".into()),
            ..Args::default()
        });

        assert_eq!(config.player.command, "mpv");
        assert_eq!(config.player.args, vec!["--fs".to_string()]);
    }

    #[test]
    fn max_results_is_clamped_to_api_limits() {
        let mut config = Config::default();
        config.search.max_results = 0;
        assert_eq!(config.search_options().max_results, 1);
        config.search.max_results = 500;
        assert_eq!(config.search_options().max_results, 50);
    }
}
