// Main entry point for Karaoke Night
// Loads config, sets up logging, picks a search backend and starts the TUI

mod cli;
mod config;
mod error;
mod logging;
mod player;
mod ui;
mod youtube;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Args;
use config::{Config, ResolvedBackend};
use player::surface::ExternalPlayer;
use ui::app::KaraokeApp;
use youtube::data_api::DataApiSearch;
use youtube::extractor::YtDlpSearch;
use youtube::search::SearchProvider;

fn search_provider(config: &Config) -> Arc<dyn SearchProvider> {
    let options = config.search_options();
    match config.effective_backend() {
        ResolvedBackend::DataApi => {
            let category = Some(config.search.video_category_id.clone());
            Arc::new(
                DataApiSearch::new(config.api_key().map(str::to_string), options)
                    .with_base_url(config.search.api_base_url.clone())
                    .with_category(category),
            )
        }
        ResolvedBackend::YtDlp => Arc::new(YtDlpSearch::new(config.search.yt_dlp_path.clone(), options)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    config.apply_args(&args);

    if args.print_config {
        let mut printable = config.clone();
        // Don't echo secrets to the terminal
        if printable.search.api_key.is_some() {
            printable.search.api_key = Some("<set>".to_string());
        }
        println!("{}", toml::to_string_pretty(&printable).context("serializing configuration")?);
        return Ok(());
    }

    let log_path = logging::init(&config.log_level)?;
    tracing::info!(log = %log_path.display(), backend = ?config.effective_backend(), "starting karaoke-night");

    let provider = search_provider(&config);
    let surface = ExternalPlayer::new(config.player.command.clone(), config.player.args.clone());

    let mut app = KaraokeApp::new(surface, provider);
    app.run().await
}
