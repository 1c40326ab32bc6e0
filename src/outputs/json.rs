//! JSON record output for the display layer.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── data.json                 # GenerationRecord, replaced every run
//! └── audio/
//!     └── latest_briefing.mp3   # referenced as "audio/latest_briefing.mp3"
//! ```
//!
//! Non-ASCII text (French accents) is written as-is, not `\u` escaped.

use crate::error::PipelineError;
use crate::models::{EnrichedArticle, GenerationRecord, ProviderKind};
use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// `audio_path` relative to `record_dir`, with `/` separators.
///
/// Paths outside `record_dir` cannot be expressed relative to it; they are
/// returned unchanged and a warning is logged.
pub fn relative_audio_path(record_dir: &Path, audio_path: &Path) -> String {
    match audio_path.strip_prefix(record_dir) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => {
            warn!(
                record_dir = %record_dir.display(),
                audio = %audio_path.display(),
                "Audio file is outside the record directory; writing its path unchanged"
            );
            audio_path.display().to_string()
        }
    }
}

/// Build the [`GenerationRecord`] for this run and write it to `record_path`,
/// replacing any previous record.
///
/// The JSON goes to a sibling `.tmp` file first and is renamed over
/// `record_path`, so readers see either the old record or the new one.
///
/// # Arguments
///
/// * `record_path` - Where `data.json` goes; its parent is created if needed
/// * `articles` - Translated articles, in source order
/// * `script` - The rendered radio script
/// * `audio_path` - The rendered audio file
/// * `provider` - Provider that produced the script
///
/// # Errors
///
/// [`PipelineError::IoWrite`] if the directory or file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %record_path.display()))]
pub async fn write_record(
    record_path: &Path,
    articles: Vec<EnrichedArticle>,
    script: String,
    audio_path: &Path,
    provider: Option<ProviderKind>,
) -> Result<GenerationRecord, PipelineError> {
    let record_dir = record_path.parent().unwrap_or_else(|| Path::new(""));

    let record = GenerationRecord {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        articles,
        script,
        audio_file: relative_audio_path(record_dir, audio_path),
        ai_provider: ProviderKind::label(provider),
    };
    let json = serde_json::to_string_pretty(&record)?;

    if !record_dir.as_os_str().is_empty() {
        if let Err(e) = fs::create_dir_all(record_dir).await {
            error!(dir = %record_dir.display(), error = %e, "Failed to create record dir");
            return Err(PipelineError::IoWrite {
                path: record_dir.to_path_buf(),
                source: e,
            });
        }
    }

    let tmp_path = tmp_path_for(record_path);
    if let Err(source) = fs::write(&tmp_path, json).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(PipelineError::IoWrite {
            path: tmp_path,
            source,
        });
    }
    if let Err(source) = fs::rename(&tmp_path, record_path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(PipelineError::IoWrite {
            path: record_path.to_path_buf(),
            source,
        });
    }
    info!(
        articles = record.articles.len(),
        ai_provider = %record.ai_provider,
        "Wrote generation record"
    );

    Ok(record)
}

/// `data.json` -> `data.json.tmp`, in the same directory.
fn tmp_path_for(record_path: &Path) -> PathBuf {
    let mut name = record_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    record_path.with_file_name(name)
}
