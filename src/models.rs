//! Data models for scraped articles, their translations and the persisted record.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawArticle`]: Article data as scraped from the news source
//! - [`EnrichedArticle`]: A raw article plus its French title and summary
//! - [`GenerationRecord`]: The JSON document written once per run
//! - [`ProviderKind`]: Which AI backend produced a piece of text

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw news article as scraped from the news source.
///
/// Title and URL are always present; the summary may be empty when the
/// source page has no excerpt for the story.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawArticle {
    /// The article headline, in English.
    pub title: String,
    /// Absolute link to the full article.
    pub url: String,
    /// The excerpt shown on the front page, possibly empty.
    pub summary: String,
}

/// A [`RawArticle`] augmented with its French translation.
///
/// Built by the translation stage. When a translation could not be extracted
/// for a field, that field holds the original English text, so all five
/// fields are always populated.
///
/// Serialized flat: the record consumer sees `title`, `url`, `summary`,
/// `title_fr` and `summary_fr` side by side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedArticle {
    #[serde(flatten)]
    pub original: RawArticle,
    /// Translated headline.
    pub title_fr: String,
    /// Translated excerpt.
    pub summary_fr: String,
}

impl EnrichedArticle {
    /// An enriched article whose French fields are copies of the English ones.
    pub fn untranslated(original: RawArticle) -> Self {
        Self {
            title_fr: original.title.clone(),
            summary_fr: original.summary.clone(),
            original,
        }
    }
}

/// The JSON document consumed by the display layer.
///
/// One record is produced per pipeline run and it replaces the previous one.
/// Field order here is the field order on disk.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationRecord {
    /// ISO-8601 UTC timestamp with a `Z` suffix.
    pub generated_at: String,
    pub articles: Vec<EnrichedArticle>,
    /// The radio script that was rendered to audio.
    pub script: String,
    /// Audio file path, relative to the record's own directory.
    pub audio_file: String,
    /// Tag of the provider that produced the script, or `"unknown"`.
    pub ai_provider: String,
}

/// An AI text-generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// The tag written to the record and shown in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Record label for an optional provider.
    pub fn label(provider: Option<ProviderKind>) -> String {
        provider
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
