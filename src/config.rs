//! Runtime configuration: tunables from an optional YAML file and provider
//! credentials from the environment.
//!
//! Every field of [`PipelineConfig`] has a default, so the YAML file only needs
//! to list what it overrides:
//!
//! ```yaml
//! article_count: 5
//! voice: fr-FR-DeniseNeural
//! ```

use crate::api::gemini::GEMINI_API_URL;
use crate::api::openai::OPENAI_API_URL;
use crate::audio::DEFAULT_VOICE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Pipeline tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many front-page stories to keep.
    pub article_count: usize,
    /// Front page of the news source.
    pub source_url: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Neural voice used for the briefing.
    pub voice: String,
    /// Timeout for the front-page fetch, in seconds.
    pub scrape_timeout_secs: u64,
    /// Timeout for provider and TTS calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            article_count: 3,
            source_url: "https://thehackernews.com".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: OPENAI_API_URL.to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_base_url: GEMINI_API_URL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            scrape_timeout_secs: 15,
            request_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load the configuration, falling back to defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn parse_config(raw: &str) -> Result<PipelineConfig, serde_yaml::Error> {
    // An empty file deserializes to unit, not to a map.
    if raw.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    serde_yaml::from_str(raw)
}

/// Provider API keys. Empty strings count as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Credentials {
    /// `google_api_key` is accepted as an alias when `gemini_api_key` is unset.
    pub fn new(
        openai_api_key: Option<String>,
        gemini_api_key: Option<String>,
        google_api_key: Option<String>,
    ) -> Self {
        Self {
            openai_api_key: non_empty(openai_api_key),
            gemini_api_key: non_empty(gemini_api_key).or_else(|| non_empty(google_api_key)),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_deref().map(|_| "<redacted>"))
            .field("gemini_api_key", &self.gemini_api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
