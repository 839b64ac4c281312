//! JSON snapshot of generated vocabulary.
//!
//! In file mode the full result list is written before rendering so a
//! document can be rebuilt later without scraping or calling the model again.
//!
//! ```text
//! [
//!   { "title": "...", "words": "...", "phrases": "..." }
//! ]
//! ```

use crate::error::PipelineError;
use crate::models::VocabularyResult;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `results` as a pretty-printed JSON array.
///
/// # Arguments
///
/// * `results` - Vocabulary results in section order
/// * `path` - Destination file; missing parent directories are created
///
/// # Errors
///
/// Returns [`PipelineError::Snapshot`] if serialization fails or
/// [`PipelineError::Io`] if the file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_snapshot(results: &[VocabularyResult], path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(results)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, json).await?;
    info!(count = results.len(), "Wrote vocabulary snapshot");
    Ok(())
}

/// Load a snapshot written by [`write_snapshot`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_snapshot(path: &Path) -> Result<Vec<VocabularyResult>, PipelineError> {
    let raw = fs::read_to_string(path).await?;
    let results: Vec<VocabularyResult> = serde_json::from_str(&raw)?;
    info!(count = results.len(), "Loaded vocabulary snapshot");
    Ok(results)
}
