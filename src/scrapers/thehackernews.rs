//! The Hacker News front-page scraper.
//!
//! This module scrapes the latest stories from
//! [The Hacker News](https://thehackernews.com). Each story on the front page
//! is an `a.story-link` whose `h2.home-title` holds the headline; the excerpt
//! is the `div.home-desc` of the enclosing `div.body-post`.
//!
//! # Failure Model
//!
//! A failed page fetch is logged and produces no articles. A story without a
//! headline or link is skipped, so fewer than `max_count` articles may come
//! back.

use super::ArticleSource;
use crate::models::RawArticle;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Desktop browser user agent; the site serves a reduced page to unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static STORY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a.story-link").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.home-title").unwrap());
static DESC_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.home-desc").unwrap());

#[derive(Debug)]
pub struct TheHackerNews {
    http: Client,
    page_url: String,
}

impl TheHackerNews {
    pub fn new(page_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            page_url: page_url.to_string(),
        })
    }

    async fn fetch_front_page(&self) -> Result<String, reqwest::Error> {
        self.http
            .get(&self.page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl ArticleSource for TheHackerNews {
    #[instrument(level = "info", skip(self), fields(source = %self.page_url))]
    async fn fetch(&self, max_count: usize) -> Vec<RawArticle> {
        let base = match Url::parse(&self.page_url) {
            Ok(base) => base,
            Err(e) => {
                error!(error = %e, "Invalid source URL");
                return Vec::new();
            }
        };

        let html = match self.fetch_front_page().await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "Failed to fetch front page");
                return Vec::new();
            }
        };

        let articles = parse_front_page(&html, &base, max_count);
        info!(count = articles.len(), "Scraped The Hacker News articles");
        articles
    }
}

/// Whitespace-normalised text content of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract up to `max_count` stories from front-page HTML.
///
/// Only the first `max_count` story links are considered; broken ones among
/// them are dropped rather than replaced.
pub fn parse_front_page(html: &str, base: &Url, max_count: usize) -> Vec<RawArticle> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for link in document.select(&STORY_SELECTOR).take(max_count) {
        let href = link.value().attr("href").unwrap_or("").trim();
        let url = match base.join(href) {
            Ok(url) if !href.is_empty() => url.to_string(),
            _ => {
                warn!(%href, "Skipping story without a usable link");
                continue;
            }
        };

        let Some(title_element) = link.select(&TITLE_SELECTOR).next() else {
            debug!(%url, "Skipping story without a headline");
            continue;
        };
        let title = element_text(title_element);
        if title.is_empty() {
            debug!(%url, "Skipping story with an empty headline");
            continue;
        }

        let summary = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div" && el.value().classes().any(|c| c == "body-post"))
            .and_then(|post| post.select(&DESC_SELECTOR).next())
            .map(element_text)
            .unwrap_or_default();

        articles.push(RawArticle { title, url, summary });
    }

    articles
}
