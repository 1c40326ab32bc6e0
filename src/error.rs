//! Errors that end a pipeline run.
//!
//! Per-call provider failures ([`crate::api::ProviderCallFailed`]) and
//! per-article translation misses never reach this type: they are absorbed
//! where they happen. Everything here is fatal to the run.

use crate::audio::RenderError;
use crate::config::ConfigError;
use crate::models::ProviderKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no AI provider configured: set OPENAI_API_KEY or GEMINI_API_KEY")]
    NoProviderConfigured,

    #[error("all AI providers failed; last attempt ({provider}): {detail}")]
    AllProvidersExhausted {
        provider: ProviderKind,
        detail: String,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("audio rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write {}: {source}", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize generation record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
