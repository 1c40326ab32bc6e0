//! Radio script composition ("Flash Info Cyber").

use crate::api::{FallbackAsk, Generation, GenerationRequest};
use crate::error::PipelineError;
use crate::models::EnrichedArticle;
use itertools::Itertools;
use tracing::{info, instrument};

const SYSTEM_PROMPT: &str = "Tu es un journaliste radio français spécialisé en cybersécurité.";

/// Prompt for a one-minute spoken bulletin covering every article.
pub fn script_request(articles: &[EnrichedArticle]) -> GenerationRequest {
    let news_content = articles
        .iter()
        .enumerate()
        .map(|(i, article)| format!("**{}. {}**\n{}", i + 1, article.title_fr, article.summary_fr))
        .join("\n\n");

    let user = format!(
        "Rédige un script de \"Flash Info Cyber\" en français.\n\n\
CONTRAINTES:\n\
- Durée de lecture: environ 1 minute (150-180 mots)\n\
- Ton: professionnel mais accessible\n\
- Structure: introduction accrocheuse, {count} brèves actualités, conclusion\n\
- Style: phrases courtes et dynamiques pour la radio\n\
- Ne pas inclure les URLs\n\
- Commencer par une formule d'introduction engageante\n\n\
ACTUALITÉS DU JOUR:\n\
{news_content}\n\n\
Rédige uniquement le script, sans indication technique.",
        count = articles.len()
    );

    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
        temperature: 0.7,
        max_output_tokens: 500,
    }
}

/// Write the spoken script. The reply is used verbatim (trimmed).
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn compose_script(
    client: &FallbackAsk,
    articles: &[EnrichedArticle],
) -> Result<Generation, PipelineError> {
    let generation = client.generate(&script_request(articles)).await?;
    info!(
        provider = %generation.provider,
        words = generation.text.split_whitespace().count(),
        "Script composed"
    );
    Ok(generation)
}
