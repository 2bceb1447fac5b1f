use clap::Parser;
use std::path::PathBuf;

use crate::config::SearchBackend;

/// Karaoke Night - search YouTube, queue songs, sing along 🎤
#[derive(Parser, Debug, Default)]
#[command(name = "karaoke-night", version, about)]
pub struct Args {
    /// Config file (defaults to <config dir>/karaoke-night/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Search backend to use
    #[arg(long, value_enum)]
    pub backend: Option<SearchBackend>,

    /// Video player command (receives the YouTube watch URL as last argument)
    #[arg(long)]
    pub player: Option<String>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
