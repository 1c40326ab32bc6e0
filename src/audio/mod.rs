//! Speech synthesis for the finished radio script.
//!
//! The pipeline only sees the [`AudioRenderer`] trait. The bundled
//! implementation, [`azure::AzureSpeechRenderer`], calls the Azure neural TTS
//! REST endpoint and writes the MP3 it returns.

pub mod azure;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default French neural voice (male). `fr-FR-DeniseNeural` is the female
/// counterpart; `fr-CA-AntoineNeural` / `fr-CA-SylvieNeural` give a Québec accent.
pub const DEFAULT_VOICE: &str = "fr-FR-HenriNeural";

/// Audio file name inside the audio directory.
pub const DEFAULT_FILENAME: &str = "latest_briefing.mp3";

/// Text used by the `speak` self-test when no text is given.
pub const SELF_TEST_TEXT: &str = "Bonjour et bienvenue dans votre flash info cybersécurité. \
Ceci est un test de génération audio. \
La voix utilisée est une voix neuronale française de haute qualité.";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("speech service not configured: {0}")]
    NotConfigured(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("speech service returned no audio")]
    EmptyAudio,
    #[error("failed to write audio {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders text to an audio file.
///
/// The destination's parent directory must exist before the call.
#[async_trait]
pub trait AudioRenderer: Send + Sync {
    async fn render(&self, text: &str, destination: &Path, voice: &str) -> Result<(), RenderError>;
}
