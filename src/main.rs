//! # Cyber Daily Watch
//!
//! A daily "news-to-audio" cybersecurity briefing. Scrapes the latest stories
//! from The Hacker News, translates them to French with an AI provider,
//! drafts a one-minute radio script, renders it to MP3 with a neural voice,
//! and writes a JSON record for the website that plays it.
//!
//! ## Usage
//!
//! ```sh
//! cyber_daily_watch -o ./cyber-news
//! cyber_daily_watch speak "Texte de test"
//! ```
//!
//! ## Architecture
//!
//! 1. **Provider selection**: OpenAI when its key is set, Gemini as fallback
//! 2. **Fetching**: Front-page stories from the news source
//! 3. **Translation**: One batched prompt, tolerant parsing of the reply
//! 4. **Script**: One prompt producing the spoken bulletin
//! 5. **Audio**: Text-to-speech into `audio/latest_briefing.mp3`
//! 6. **Output**: `data.json` for the display layer

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod audio;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod script;
#[cfg(test)]
mod test_support;
mod translate;
mod utils;

use api::FallbackAsk;
use audio::azure::AzureSpeechRenderer;
use audio::{AudioRenderer, DEFAULT_FILENAME, SELF_TEST_TEXT};
use cli::{Cli, Command};
use config::{Credentials, PipelineConfig, load_config};
use error::PipelineError;
use pipeline::{AUDIO_DIR, Pipeline, RunOutcome};
use scrapers::thehackernews::TheHackerNews;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "cyber_daily_watch starting up");

    let args = Cli::parse();
    debug!(output_dir = %args.output_dir.display(), config = ?args.config, "Parsed CLI arguments");

    let result = match &args.command {
        Some(Command::Speak { text }) => speak(&args, text.as_deref()).await,
        None => run(&args).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Run failed");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}

fn renderer(args: &Cli, config: &PipelineConfig) -> Result<AzureSpeechRenderer, PipelineError> {
    let http = Client::builder().timeout(config.request_timeout()).build()?;
    Ok(AzureSpeechRenderer::new(
        http,
        args.azure_speech_key.clone(),
        args.azure_speech_region.clone(),
    )?)
}

/// Full pipeline run.
#[instrument(level = "info", skip_all)]
async fn run(args: &Cli) -> Result<(), PipelineError> {
    let config = load_config(args.config.as_deref())?;
    let credentials = Credentials::new(
        args.openai_api_key.clone(),
        args.gemini_api_key.clone(),
        args.google_api_key.clone(),
    );
    debug!(?credentials, "Loaded credentials");

    // Provider configuration is checked before anything touches the network.
    let client = FallbackAsk::from_credentials(&credentials, &config)?;

    // Early check: ensure the output dir is writable
    ensure_writable_dir(&args.output_dir).await?;

    let source = TheHackerNews::new(&config.source_url, config.scrape_timeout())?;
    let pipeline = Pipeline::new(
        client,
        Box::new(source),
        Box::new(renderer(args, &config)?),
        &args.output_dir,
        &config,
    );

    match pipeline.run().await? {
        RunOutcome::NoArticles => {
            info!("No articles retrieved; previous briefing left in place");
        }
        RunOutcome::Completed {
            record_path,
            audio_path,
            provider,
            article_count,
        } => {
            info!(
                %provider,
                article_count,
                record = %record_path.display(),
                audio = %audio_path.display(),
                "Flash info generated"
            );
        }
    }
    Ok(())
}

/// Audio self-test: render `text` (or a stock sentence) and report the file.
#[instrument(level = "info", skip_all)]
async fn speak(args: &Cli, text: Option<&str>) -> Result<(), PipelineError> {
    let config = load_config(args.config.as_deref())?;
    let text = text.unwrap_or(SELF_TEST_TEXT);
    info!(voice = %config.voice, text = %truncate_for_log(text, 80), "Audio self-test");

    let audio_dir = args.output_dir.join(AUDIO_DIR);
    ensure_writable_dir(&audio_dir).await?;
    let destination = audio_dir.join(DEFAULT_FILENAME);

    renderer(args, &config)?
        .render(text, &destination, &config.voice)
        .await?;

    let size_kb = file_size_kb(&destination).await;
    info!(path = %destination.display(), size_kb, "Audio generated");
    Ok(())
}

async fn file_size_kb(path: &Path) -> f64 {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() as f64 / 1024.0)
        .unwrap_or(0.0)
}
