//! Scripted stand-ins for the pipeline's collaborators.

use crate::api::{AskAsync, GenerationRequest, ProviderCallFailed};
use crate::audio::{AudioRenderer, RenderError};
use crate::models::{EnrichedArticle, ProviderKind, RawArticle};
use crate::scrapers::ArticleSource;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared call counter handed out before a fake is boxed.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn raw_article(title: &str, url: &str, summary: &str) -> RawArticle {
    RawArticle {
        title: title.to_string(),
        url: url.to_string(),
        summary: summary.to_string(),
    }
}

pub fn enriched_article(title: &str, title_fr: &str, summary_fr: &str) -> EnrichedArticle {
    EnrichedArticle {
        original: raw_article(title, "https://example.com/story", "summary"),
        title_fr: title_fr.to_string(),
        summary_fr: summary_fr.to_string(),
    }
}

/// Provider that replays canned replies in order; the last one repeats.
pub struct ScriptedAsk {
    provider: ProviderKind,
    replies: Mutex<Vec<Result<String, (u16, String)>>>,
    calls: CallCounter,
}

impl ScriptedAsk {
    pub fn new(provider: ProviderKind, replies: Vec<Result<String, (u16, String)>>) -> Self {
        Self {
            provider,
            replies: Mutex::new(replies),
            calls: CallCounter::default(),
        }
    }

    pub fn ok(provider: ProviderKind, text: &str) -> Self {
        Self::new(provider, vec![Ok(text.to_string())])
    }

    pub fn failing(provider: ProviderKind, status: u16, message: &str) -> Self {
        Self::new(provider, vec![Err((status, message.to_string()))])
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl AskAsync for ScriptedAsk {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn ask(&self, _request: &GenerationRequest) -> Result<String, ProviderCallFailed> {
        self.calls.bump();
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies
                .first()
                .cloned()
                .unwrap_or_else(|| Err((500, "no scripted reply".to_string())))
        };
        reply.map_err(|(status, message)| ProviderCallFailed::Api { status, message })
    }
}

/// Source returning a fixed list.
pub struct StaticSource {
    articles: Vec<RawArticle>,
    calls: CallCounter,
}

impl StaticSource {
    pub fn new(articles: Vec<RawArticle>) -> Self {
        Self {
            articles,
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl ArticleSource for StaticSource {
    async fn fetch(&self, max_count: usize) -> Vec<RawArticle> {
        self.calls.bump();
        self.articles.iter().take(max_count).cloned().collect()
    }
}

/// Renderer that writes the script text as the "audio", or fails on demand.
pub struct FakeRenderer {
    fail: bool,
    calls: CallCounter,
}

impl FakeRenderer {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: CallCounter::default(),
        }
    }

    pub fn broken() -> Self {
        Self {
            fail: true,
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl AudioRenderer for FakeRenderer {
    async fn render(&self, text: &str, destination: &Path, _voice: &str) -> Result<(), RenderError> {
        self.calls.bump();
        if self.fail {
            return Err(RenderError::EmptyAudio);
        }
        std::fs::write(destination, text).map_err(|source| RenderError::Io {
            path: destination.to_path_buf(),
            source,
        })
    }
}
