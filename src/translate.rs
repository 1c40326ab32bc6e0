//! English → French translation of the scraped articles.
//!
//! All articles go to the model in one prompt, tagged `[ARTICLE 1]`,
//! `[ARTICLE 2]`, ... and the model is asked to answer with the same markers:
//!
//! ```text
//! [ARTICLE 1]
//! TITRE: <titre en français>
//! RESUME: <résumé en français>
//! ```
//!
//! One call for the whole batch is cheaper and faster than one per article,
//! but the reply is free text. [`ReplyScanner`] reads it defensively: each
//! field is an extraction attempt, and a failed attempt keeps the English
//! original for that field. A bad reply never drops an article or fails the
//! stage.

use crate::api::{FallbackAsk, GenerationRequest};
use crate::error::PipelineError;
use crate::models::{EnrichedArticle, RawArticle};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str =
    "Tu es un traducteur professionnel anglais-français spécialisé en cybersécurité.";

const MARKER_PREFIX: &str = "[ARTICLE";
const TITLE_LABEL: &str = "TITRE:";
/// Checked in order; the model sometimes keeps the accents.
const SUMMARY_LABELS: [&str; 2] = ["RESUME:", "RÉSUMÉ:"];

fn marker(index: usize) -> String {
    format!("{MARKER_PREFIX} {index}]")
}

/// Prompt asking for every article's title and summary in French.
pub fn translation_request(articles: &[RawArticle]) -> GenerationRequest {
    let articles_text = articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            format!(
                "{}\nTITLE: {}\nSUMMARY: {}",
                marker(i + 1),
                article.title,
                article.summary
            )
        })
        .join("\n\n");

    let user = format!(
        "Traduis les titres et résumés suivants en français.\n\
Garde le même format de réponse avec les numéros d'articles.\n\n\
{articles_text}\n\n\
Réponds uniquement avec le format suivant pour chaque article:\n\
[ARTICLE 1]\n\
TITRE: <titre en français>\n\
RESUME: <résumé en français>\n\n\
[ARTICLE 2]\n\
...etc"
    );

    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
        temperature: 0.3,
        max_output_tokens: 1500,
    }
}

/// Read-only view over a model reply, one article section at a time.
#[derive(Debug, Clone, Copy)]
pub struct ReplyScanner<'a> {
    reply: &'a str,
}

impl<'a> ReplyScanner<'a> {
    pub fn new(reply: &'a str) -> Self {
        Self { reply }
    }

    /// Text between `[ARTICLE index]` and `[ARTICLE index+1]`, or the end of
    /// the reply when the next marker is absent.
    pub fn section(&self, index: usize) -> Option<&'a str> {
        let start_marker = marker(index);
        let start = self.reply.find(&start_marker)? + start_marker.len();
        let rest = &self.reply[start..];
        let end = rest.find(&marker(index + 1)).unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

/// Drop surrounding whitespace and markdown emphasis the model likes to add.
fn clean(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '*')
}

/// Text after `TITRE:` up to the end of that line.
pub fn extract_title(section: &str) -> Option<String> {
    let start = section.find(TITLE_LABEL)? + TITLE_LABEL.len();
    let line = section[start..].lines().next().unwrap_or("");
    Some(clean(line))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Text after `RESUME:` (or `RÉSUMÉ:`) up to the next article marker. May
/// span several lines.
pub fn extract_summary(section: &str) -> Option<String> {
    let (position, label) = SUMMARY_LABELS
        .iter()
        .find_map(|label| section.find(label).map(|pos| (pos, *label)))?;
    let text = &section[position + label.len()..];
    let text = text.split(MARKER_PREFIX).next().unwrap_or("");
    Some(clean(text))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Pair every article with its translation from `reply`.
///
/// Output has the same length and order as `articles`.
pub fn parse_translations(reply: &str, articles: &[RawArticle]) -> Vec<EnrichedArticle> {
    let scanner = ReplyScanner::new(reply);

    articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let Some(section) = scanner.section(i + 1) else {
                debug!(index = i + 1, "Article marker missing from reply; keeping English");
                return EnrichedArticle::untranslated(article.clone());
            };
            let title_fr = extract_title(section);
            let summary_fr = extract_summary(section);
            if title_fr.is_none() || summary_fr.is_none() {
                debug!(
                    index = i + 1,
                    has_title = title_fr.is_some(),
                    has_summary = summary_fr.is_some(),
                    "Partial translation; missing fields keep English"
                );
            }

            EnrichedArticle {
                title_fr: title_fr.unwrap_or_else(|| article.title.clone()),
                summary_fr: summary_fr.unwrap_or_else(|| article.summary.clone()),
                original: article.clone(),
            }
        })
        .collect()
}

/// Translate all articles with a single model call.
///
/// # Errors
///
/// Only provider errors from [`FallbackAsk::generate`]; parsing never fails.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn translate(
    client: &FallbackAsk,
    articles: &[RawArticle],
) -> Result<Vec<EnrichedArticle>, PipelineError> {
    if articles.is_empty() {
        return Ok(Vec::new());
    }

    let generation = client.generate(&translation_request(articles)).await?;
    debug!(reply = %truncate_for_log(&generation.text, 500), "Translation reply");

    let enriched = parse_translations(&generation.text, articles);
    let translated = enriched
        .iter()
        .filter(|a| a.title_fr != a.original.title)
        .count();
    info!(
        provider = %generation.provider,
        total = enriched.len(),
        translated_titles = translated,
        "Articles translated"
    );
    Ok(enriched)
}
