//! Pipeline orchestration.
//!
//! A run is strictly sequential, with no stage revisited:
//!
//! ```text
//! SelectProvider → FetchArticles → (empty? stop) → Translate
//!     → ComposeScript → RenderAudio → Persist → Done
//! ```
//!
//! An empty article list ends the run early without error. Any other failure
//! ends the run before the record is written, so the previous record (and
//! the audio it points to) stays untouched.

use crate::api::FallbackAsk;
use crate::audio::{AudioRenderer, DEFAULT_FILENAME};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::models::ProviderKind;
use crate::outputs::json;
use crate::scrapers::ArticleSource;
use crate::script::compose_script;
use crate::translate::translate;
use crate::utils::{ensure_writable_dir, truncate_for_log};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Record file name inside the output directory.
pub const RECORD_FILENAME: &str = "data.json";
/// Audio directory name inside the output directory.
pub const AUDIO_DIR: &str = "audio";

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The source had nothing; no stage after fetching ran.
    NoArticles,
    Completed {
        record_path: PathBuf,
        audio_path: PathBuf,
        provider: ProviderKind,
        article_count: usize,
    },
}

pub struct Pipeline {
    client: FallbackAsk,
    source: Box<dyn ArticleSource>,
    renderer: Box<dyn AudioRenderer>,
    output_dir: PathBuf,
    article_count: usize,
    voice: String,
}

impl Pipeline {
    pub fn new(
        client: FallbackAsk,
        source: Box<dyn ArticleSource>,
        renderer: Box<dyn AudioRenderer>,
        output_dir: &Path,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            client,
            source,
            renderer,
            output_dir: output_dir.to_path_buf(),
            article_count: config.article_count,
            voice: config.voice.clone(),
        }
    }

    pub fn record_path(&self) -> PathBuf {
        self.output_dir.join(RECORD_FILENAME)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.output_dir.join(AUDIO_DIR)
    }

    pub fn audio_path(&self) -> PathBuf {
        self.audio_dir().join(DEFAULT_FILENAME)
    }

    /// Run every stage once.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] from provider selection, generation, rendering
    /// or persistence. Nothing is persisted when an error is returned.
    #[instrument(level = "info", skip_all, fields(output_dir = %self.output_dir.display()))]
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let t0 = Instant::now();

        let selection = self.client.selection()?;
        info!(
            primary = %selection.primary,
            fallback = ?selection.fallback.map(|p| p.as_str()),
            "AI provider selected"
        );

        let articles = self.source.fetch(self.article_count).await;
        if articles.is_empty() {
            warn!("No articles found; nothing to do");
            return Ok(RunOutcome::NoArticles);
        }
        info!(count = articles.len(), "Articles fetched");
        for article in &articles {
            info!(title = %truncate_for_log(&article.title, 60), "Fetched article");
        }

        let translated = translate(&self.client, &articles).await?;
        for article in &translated {
            info!(title_fr = %truncate_for_log(&article.title_fr, 60), "Translated article");
        }

        let script = compose_script(&self.client, &translated).await?;

        let audio_path = self.audio_path();
        ensure_writable_dir(&self.audio_dir()).await?;
        self.renderer
            .render(&script.text, &audio_path, &self.voice)
            .await?;
        info!(path = %audio_path.display(), voice = %self.voice, "Audio rendered");

        let record_path = self.record_path();
        let article_count = translated.len();
        json::write_record(
            &record_path,
            translated,
            script.text,
            &audio_path,
            Some(script.provider),
        )
        .await?;

        info!(
            provider = %script.provider,
            article_count,
            elapsed_ms = t0.elapsed().as_millis(),
            "Briefing generated"
        );
        Ok(RunOutcome::Completed {
            record_path,
            audio_path,
            provider: script.provider,
            article_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationRecord;
    use crate::test_support::{FakeRenderer, ScriptedAsk, StaticSource, raw_article};

    const TRANSLATION: &str = "[ARTICLE 1]\nTITRE: Bug trouvé\nRESUME: desc-fr\n\n\
                               [ARTICLE 2]\nTITRE: Fuite massive\nRESUME: données exposées";
    const SCRIPT: &str = "Bonjour et bienvenue dans votre flash info cyber.";

    fn articles() -> Vec<crate::models::RawArticle> {
        vec![
            raw_article("Bug found", "http://x", "desc"),
            raw_article("Huge leak", "http://y", "data exposed"),
        ]
    }

    #[tokio::test]
    async fn test_empty_fetch_is_a_quiet_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedAsk::ok(ProviderKind::OpenAi, SCRIPT);
        let renderer = FakeRenderer::working();
        let (ask_calls, render_calls) = (provider.calls(), renderer.calls());

        let pipeline = Pipeline::new(
            FallbackAsk::new(vec![Box::new(provider)]),
            Box::new(StaticSource::new(vec![])),
            Box::new(renderer),
            dir.path(),
            &PipelineConfig::default(),
        );

        assert_eq!(pipeline.run().await.unwrap(), RunOutcome::NoArticles);
        assert_eq!(ask_calls.get(), 0);
        assert_eq!(render_calls.get(), 0);
        assert!(!pipeline.record_path().exists());
    }

    #[tokio::test]
    async fn test_full_run_with_fallback_provider() {
        let dir = tempfile::tempdir().unwrap();
        let primary = ScriptedAsk::failing(ProviderKind::OpenAi, 429, "insufficient_quota");
        let fallback = ScriptedAsk::new(
            ProviderKind::Gemini,
            vec![Ok(TRANSLATION.to_string()), Ok(SCRIPT.to_string())],
        );
        let (primary_calls, fallback_calls) = (primary.calls(), fallback.calls());

        let pipeline = Pipeline::new(
            FallbackAsk::new(vec![Box::new(primary), Box::new(fallback)]),
            Box::new(StaticSource::new(articles())),
            Box::new(FakeRenderer::working()),
            dir.path(),
            &PipelineConfig::default(),
        );

        let outcome = pipeline.run().await.unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Completed {
                record_path: dir.path().join("data.json"),
                audio_path: dir.path().join("audio").join("latest_briefing.mp3"),
                provider: ProviderKind::Gemini,
                article_count: 2,
            }
        );
        // One attempt per provider per stage: translation then script.
        assert_eq!(primary_calls.get(), 2);
        assert_eq!(fallback_calls.get(), 2);

        let record: GenerationRecord =
            serde_json::from_str(&std::fs::read_to_string(pipeline.record_path()).unwrap()).unwrap();
        assert_eq!(record.ai_provider, "gemini");
        assert_eq!(record.script, SCRIPT);
        assert_eq!(record.audio_file, "audio/latest_briefing.mp3");
        assert_eq!(record.articles.len(), 2);
        assert_eq!(record.articles[0].title_fr, "Bug trouvé");
        assert_eq!(record.articles[1].summary_fr, "données exposées");
        assert_eq!(record.articles[1].original.url, "http://y");
        assert_eq!(std::fs::read_to_string(pipeline.audio_path()).unwrap(), SCRIPT);
    }

    #[tokio::test]
    async fn test_article_count_limits_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedAsk::new(
            ProviderKind::OpenAi,
            vec![Ok(TRANSLATION.to_string()), Ok(SCRIPT.to_string())],
        );
        let config = PipelineConfig {
            article_count: 1,
            ..PipelineConfig::default()
        };

        let pipeline = Pipeline::new(
            FallbackAsk::new(vec![Box::new(provider)]),
            Box::new(StaticSource::new(articles())),
            Box::new(FakeRenderer::working()),
            dir.path(),
            &config,
        );

        match pipeline.run().await.unwrap() {
            RunOutcome::Completed { article_count, provider, .. } => {
                assert_eq!(article_count, 1);
                assert_eq!(provider, ProviderKind::OpenAi);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_providers_abort_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::working();
        let render_calls = renderer.calls();

        let pipeline = Pipeline::new(
            FallbackAsk::new(vec![
                Box::new(ScriptedAsk::failing(ProviderKind::OpenAi, 500, "down")),
                Box::new(ScriptedAsk::failing(ProviderKind::Gemini, 500, "also down")),
            ]),
            Box::new(StaticSource::new(articles())),
            Box::new(renderer),
            dir.path(),
            &PipelineConfig::default(),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::AllProvidersExhausted { .. }));
        assert_eq!(render_calls.get(), 0);
        assert!(!pipeline.record_path().exists());
    }

    #[tokio::test]
    async fn test_render_failure_writes_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedAsk::new(
            ProviderKind::OpenAi,
            vec![Ok(TRANSLATION.to_string()), Ok(SCRIPT.to_string())],
        );

        let pipeline = Pipeline::new(
            FallbackAsk::new(vec![Box::new(provider)]),
            Box::new(StaticSource::new(articles())),
            Box::new(FakeRenderer::broken()),
            dir.path(),
            &PipelineConfig::default(),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Render(_)));
        assert!(!pipeline.record_path().exists());
    }

    #[tokio::test]
    async fn test_no_provider_stops_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticSource::new(articles());
        let fetch_calls = source.calls();

        let pipeline = Pipeline::new(
            FallbackAsk::new(vec![]),
            Box::new(source),
            Box::new(FakeRenderer::working()),
            dir.path(),
            &PipelineConfig::default(),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::NoProviderConfigured));
        assert_eq!(fetch_calls.get(), 0);
    }
}
