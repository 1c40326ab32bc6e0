//! Command-line interface definitions for Cyber Daily Watch.
//!
//! Credentials are read from the environment through `clap`'s `env`
//! attributes, so a plain `cyber_daily_watch` with the right variables set
//! runs the whole pipeline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Cyber Daily Watch application.
///
/// # Examples
///
/// ```sh
/// # Full run: scrape, translate, script, audio, data.json
/// OPENAI_API_KEY=... AZURE_SPEECH_KEY=... AZURE_SPEECH_REGION=westeurope cyber_daily_watch
///
/// # Audio self-test with custom text
/// cyber_daily_watch speak "Bonjour le monde"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory receiving data.json and audio/latest_briefing.mp3
    #[arg(short, long, default_value = "cyber-news")]
    pub output_dir: PathBuf,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// OpenAI API key (primary provider)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Gemini API key (fallback provider)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Accepted in place of GEMINI_API_KEY
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, hide = true)]
    pub google_api_key: Option<String>,

    /// Azure Speech subscription key
    #[arg(long, env = "AZURE_SPEECH_KEY", hide_env_values = true)]
    pub azure_speech_key: Option<String>,

    /// Azure Speech region, e.g. westeurope
    #[arg(long, env = "AZURE_SPEECH_REGION")]
    pub azure_speech_region: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Render a short text to the default audio file and exit
    Speak {
        /// Text to speak; a French test sentence when omitted
        text: Option<String>,
    },
}
