//! News source adapters.
//!
//! A source produces a best-effort, bounded list of [`RawArticle`]s in page
//! order. Fetch errors yield an empty list and broken entries are skipped;
//! nothing is ever surfaced to the pipeline as an error.
//!
//! # Supported Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | The Hacker News | [`thehackernews`] | Front-page HTML scraping |

pub mod thehackernews;

use crate::models::RawArticle;
use async_trait::async_trait;

/// Anything that can hand the pipeline a list of fresh articles.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// At most `max_count` articles, in source order. Never fails.
    async fn fetch(&self, max_count: usize) -> Vec<RawArticle>;
}
