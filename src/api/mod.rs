//! AI text generation with ordered provider fallback.
//!
//! This module is the single entry point the pipeline stages use to talk to a
//! language model. It never retries a provider: each [`FallbackAsk::generate`]
//! call makes at most one request per configured provider, in order, and stops
//! at the first success.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait for one provider (one request, one reply)
//! - [`openai::OpenAiClient`] / [`gemini::GeminiClient`]: The concrete backends
//! - [`FallbackAsk`]: Walks an ordered list of [`AskAsync`] providers
//! - [`select_provider`]: Decides the order from the available credentials
//!
//! # Failure Handling
//!
//! A provider failure is classified (quota/rate-limit or other), logged, and
//! the next provider is tried. Only when every provider has failed does the
//! caller see [`PipelineError::AllProvidersExhausted`].

pub mod gemini;
pub mod openai;

use crate::config::{Credentials, PipelineConfig};
use crate::error::PipelineError;
use crate::models::ProviderKind;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::utils::truncate_for_log;

/// Vocabulary providers use when refusing a call for billing or throttling.
static QUOTA_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)quota|\brate\b|rate.?limit|insufficient|too many requests").unwrap()
});

/// One prompt for the model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Role/behaviour instructions.
    pub system: String,
    /// The actual task.
    pub user: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// System and user prompt as a single text, for backends without a
    /// separate system channel.
    pub fn combined_prompt(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Generated text together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub provider: ProviderKind,
}

/// A single failed provider call.
#[derive(Debug, Error)]
pub enum ProviderCallFailed {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("no text in response: {0}")]
    EmptyResponse(String),
}

impl From<reqwest::Error> for ProviderCallFailed {
    /// Request URLs can carry credentials, so they never reach the message.
    fn from(e: reqwest::Error) -> Self {
        ProviderCallFailed::Http(e.without_url())
    }
}

/// Why a provider call failed, for diagnostics only. Both kinds fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    QuotaOrRateLimit,
    Other,
}

impl ProviderCallFailed {
    pub fn kind(&self) -> FailureKind {
        if let ProviderCallFailed::Api { status: 429, .. } = self {
            return FailureKind::QuotaOrRateLimit;
        }
        if QUOTA_VOCABULARY.is_match(&self.to_string()) {
            FailureKind::QuotaOrRateLimit
        } else {
            FailureKind::Other
        }
    }
}

/// Build a [`ProviderCallFailed`] from a non-success HTTP response.
///
/// Both OpenAI and Gemini wrap errors as `{"error": {"message": ...}}`; when
/// the body has that shape only the message is kept.
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderCallFailed {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return e.into(),
    };
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    ProviderCallFailed::Api { status, message }
}

/// Trait for one AI text-generation backend.
///
/// Implementors make exactly one request per call and return the raw text.
#[async_trait]
pub trait AskAsync: Send + Sync {
    /// Which backend this is.
    fn provider(&self) -> ProviderKind;

    /// Send the prompt and return the model's text.
    async fn ask(&self, request: &GenerationRequest) -> Result<String, ProviderCallFailed>;
}

/// Primary provider plus the one tried when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    pub primary: ProviderKind,
    pub fallback: Option<ProviderKind>,
}

/// Pick the provider order from the configured credentials.
///
/// OpenAI is primary whenever its key is present; Gemini is then the fallback
/// if its key is present too. With only a Gemini key, Gemini is primary and
/// there is no fallback. Nothing is probed over the network.
pub fn select_provider(credentials: &Credentials) -> Result<ProviderSelection, PipelineError> {
    match (&credentials.openai_api_key, &credentials.gemini_api_key) {
        (Some(_), gemini) => Ok(ProviderSelection {
            primary: ProviderKind::OpenAi,
            fallback: gemini.as_ref().map(|_| ProviderKind::Gemini),
        }),
        (None, Some(_)) => Ok(ProviderSelection {
            primary: ProviderKind::Gemini,
            fallback: None,
        }),
        (None, None) => Err(PipelineError::NoProviderConfigured),
    }
}

/// Ordered provider list with one attempt per provider.
///
/// Add a provider by pushing another [`AskAsync`] onto the list; the
/// attempt logic does not change.
pub struct FallbackAsk {
    attempts: Vec<Box<dyn AskAsync>>,
}

impl fmt::Debug for FallbackAsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order: Vec<ProviderKind> = self.attempts.iter().map(|a| a.provider()).collect();
        f.debug_struct("FallbackAsk").field("order", &order).finish()
    }
}

impl FallbackAsk {
    pub fn new(attempts: Vec<Box<dyn AskAsync>>) -> Self {
        Self { attempts }
    }

    /// Build the provider list for the given credentials, in
    /// [`select_provider`] order.
    pub fn from_credentials(
        credentials: &Credentials,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let selection = select_provider(credentials)?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let order = std::iter::once(selection.primary).chain(selection.fallback);
        let mut attempts: Vec<Box<dyn AskAsync>> = Vec::new();
        for provider in order {
            match provider {
                ProviderKind::OpenAi => {
                    if let Some(key) = &credentials.openai_api_key {
                        attempts.push(Box::new(
                            openai::OpenAiClient::new(http.clone(), key.clone())
                                .with_model(&config.openai_model)
                                .with_base_url(&config.openai_base_url),
                        ));
                    }
                }
                ProviderKind::Gemini => {
                    if let Some(key) = &credentials.gemini_api_key {
                        attempts.push(Box::new(
                            gemini::GeminiClient::new(http.clone(), key.clone())
                                .with_model(&config.gemini_model)
                                .with_base_url(&config.gemini_base_url),
                        ));
                    }
                }
            }
        }
        Ok(Self::new(attempts))
    }

    /// The provider order this client will use.
    pub fn selection(&self) -> Result<ProviderSelection, PipelineError> {
        let mut order = self.attempts.iter().map(|a| a.provider());
        let primary = order.next().ok_or(PipelineError::NoProviderConfigured)?;
        Ok(ProviderSelection {
            primary,
            fallback: order.next(),
        })
    }

    /// Generate text, falling back to the next provider on failure.
    ///
    /// # Returns
    ///
    /// The trimmed text and the provider that produced it.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NoProviderConfigured`] when the list is empty (no
    ///   request is made)
    /// - [`PipelineError::AllProvidersExhausted`] with the last provider's
    ///   error when every attempt failed
    #[instrument(level = "info", skip_all, fields(max_output_tokens = request.max_output_tokens))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, PipelineError> {
        let total_t0 = Instant::now();
        let mut last_failure: Option<(ProviderKind, ProviderCallFailed)> = None;

        for (position, attempt) in self.attempts.iter().enumerate() {
            let provider = attempt.provider();
            let attempt_t0 = Instant::now();

            match attempt.ask(request).await {
                Ok(text) => {
                    info!(
                        %provider,
                        attempt = position + 1,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Generation succeeded"
                    );
                    return Ok(Generation {
                        text: text.trim().to_string(),
                        provider,
                    });
                }
                Err(e) => {
                    let has_next = position + 1 < self.attempts.len();
                    match e.kind() {
                        FailureKind::QuotaOrRateLimit => warn!(
                            %provider,
                            elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                            has_next,
                            error = %truncate_for_log(&e.to_string(), 300),
                            "Provider quota or rate limit exceeded"
                        ),
                        FailureKind::Other => warn!(
                            %provider,
                            elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                            has_next,
                            error = %truncate_for_log(&e.to_string(), 300),
                            "Provider call failed"
                        ),
                    }
                    last_failure = Some((provider, e));
                }
            }
        }

        match last_failure {
            Some((provider, e)) => {
                error!(
                    %provider,
                    elapsed_ms_total = total_t0.elapsed().as_millis(),
                    error = %e,
                    "All providers exhausted"
                );
                Err(PipelineError::AllProvidersExhausted {
                    provider,
                    detail: e.to_string(),
                })
            }
            None => Err(PipelineError::NoProviderConfigured),
        }
    }
}
