//! Azure neural text-to-speech over REST.
//!
//! One `POST` per script: the text is wrapped in SSML naming the voice, and
//! the response body is the MP3 itself.

use super::{AudioRenderer, RenderError};
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use quick_xml::escape::escape;
use reqwest::Client;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use tracing::{info, instrument};

const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";
/// Longest error body kept in [`RenderError::Api`].
const MAX_ERROR_BODY: usize = 300;

pub struct AzureSpeechRenderer {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl fmt::Debug for AzureSpeechRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSpeechRenderer")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AzureSpeechRenderer {
    /// Renderer for the regional endpoint, e.g. region `westeurope`.
    ///
    /// # Errors
    ///
    /// [`RenderError::NotConfigured`] when the key or region is missing or empty.
    pub fn new(
        http: Client,
        api_key: Option<String>,
        region: Option<String>,
    ) -> Result<Self, RenderError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RenderError::NotConfigured("AZURE_SPEECH_KEY is not set".into()))?;
        let region = region
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| RenderError::NotConfigured("AZURE_SPEECH_REGION is not set".into()))?;
        Ok(Self {
            http,
            api_key,
            endpoint: format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                region.trim()
            ),
        })
    }

    /// Override the full synthesis URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

/// `fr-FR-HenriNeural` -> `fr-FR`.
fn voice_locale(voice: &str) -> String {
    let parts: Vec<&str> = voice.splitn(3, '-').collect();
    if parts.len() >= 2 {
        format!("{}-{}", parts[0], parts[1])
    } else {
        "fr-FR".to_string()
    }
}

fn ssml(text: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        voice_locale(voice),
        escape(voice),
        escape(text.trim())
    )
}

#[async_trait]
impl AudioRenderer for AzureSpeechRenderer {
    #[instrument(level = "info", skip_all, fields(%voice, destination = %destination.display()))]
    async fn render(&self, text: &str, destination: &Path, voice: &str) -> Result<(), RenderError> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", env!("CARGO_PKG_NAME"))
            .body(ssml(text, voice))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Api {
                status: status.as_u16(),
                message: truncate_for_log(&body, MAX_ERROR_BODY),
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(RenderError::EmptyAudio);
        }

        fs::write(destination, &audio)
            .await
            .map_err(|source| RenderError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        info!(
            bytes = audio.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Wrote audio file"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn renderer(endpoint: &str) -> AzureSpeechRenderer {
        AzureSpeechRenderer::new(Client::new(), Some("speech_key".into()), Some("westeurope".into()))
            .unwrap()
            .with_endpoint(endpoint)
    }

    #[test]
    fn test_new_requires_key_and_region() {
        let err = AzureSpeechRenderer::new(Client::new(), None, Some("westeurope".into())).unwrap_err();
        assert!(matches!(err, RenderError::NotConfigured(_)));

        let err = AzureSpeechRenderer::new(Client::new(), Some("k".into()), Some(" ".into())).unwrap_err();
        assert!(matches!(err, RenderError::NotConfigured(_)));

        let ok = AzureSpeechRenderer::new(Client::new(), Some("k".into()), Some("westeurope".into())).unwrap();
        assert_eq!(
            ok.endpoint,
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[test]
    fn test_ssml_escapes_text() {
        let doc = ssml("Faille <critique> & patch", "fr-FR-HenriNeural");
        assert!(doc.contains("xml:lang='fr-FR'"));
        assert!(doc.contains("<voice name='fr-FR-HenriNeural'>"));
        assert!(doc.contains("Faille &lt;critique&gt; &amp; patch"));
    }

    #[test]
    fn test_voice_locale() {
        assert_eq!(voice_locale("fr-CA-SylvieNeural"), "fr-CA");
        assert_eq!(voice_locale("weird"), "fr-FR");
    }

    #[tokio::test]
    async fn test_render_writes_audio() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cognitiveservices/v1")
            .match_header("ocp-apim-subscription-key", "speech_key")
            .match_header("x-microsoft-outputformat", OUTPUT_FORMAT)
            .match_body(Matcher::Regex("fr-FR-HenriNeural".into()))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"ID3fake-mp3-bytes".to_vec())
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("latest_briefing.mp3");
        renderer(&format!("{}/cognitiveservices/v1", server.url()))
            .render("Bonjour", &destination, "fr-FR-HenriNeural")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"ID3fake-mp3-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_render_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/cognitiveservices/v1")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.mp3");
        let err = renderer(&format!("{}/cognitiveservices/v1", server.url()))
            .render("Bonjour", &destination, "fr-FR-HenriNeural")
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Api { status: 401, .. }));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_long_error_body_is_truncated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/cognitiveservices/v1")
            .with_status(500)
            .with_body("x".repeat(5000))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = renderer(&format!("{}/cognitiveservices/v1", server.url()))
            .render("Bonjour", &dir.path().join("out.mp3"), "fr-FR-HenriNeural")
            .await
            .unwrap_err();

        match err {
            RenderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.starts_with(&"x".repeat(MAX_ERROR_BODY)));
                assert!(message.contains("…(+4700 bytes)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
