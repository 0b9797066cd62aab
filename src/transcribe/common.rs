use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::RwLock;
use tracing::info;

use crate::cancel::CancelToken;
use crate::error::{Result, VidsubError};
use crate::process::{run_captured, stderr_text};
use crate::segment::Transcription;

/// Trait for converting service-specific transcription formats to segments
pub trait TranscriptionMapper<T> {
    fn to_transcription(service_result: T, requested_language: &str) -> Transcription;
}

/// Check that an engine binary can be started at all.
pub async fn check_binary(binary: &str) -> Result<()> {
    let output = run_captured(binary, &["--help".to_string()], &CancelToken::new()).await?;

    // Some builds print usage to stderr and exit non-zero on --help; only a
    // crash without any output counts as unusable.
    if !output.status.success() && output.stdout.is_empty() && output.stderr.is_empty() {
        return Err(VidsubError::ModelLoad(format!(
            "{} is not runnable: {}",
            binary,
            stderr_text(&output)
        )));
    }

    info!("Transcriber binary is available: {}", binary);
    Ok(())
}

/// Run an engine invocation, failing with `Transcriber` on a non-zero exit
pub async fn run_engine(binary: &str, args: &[String], cancel: &CancelToken) -> Result<()> {
    let output = run_captured(binary, args, cancel).await?;

    if !output.status.success() {
        return Err(VidsubError::Transcriber(format!(
            "{} failed: {}",
            binary,
            stderr_text(&output)
        )));
    }

    Ok(())
}

/// Read and parse the JSON file an engine wrote
pub async fn read_json_output<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        VidsubError::Transcriber(format!("Failed to read output {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| VidsubError::Transcriber(format!("Failed to parse transcription JSON: {}", e)))
}

/// Read the value stored by `load_model`
pub fn loaded<T: Clone>(slot: &RwLock<Option<T>>) -> Result<T> {
    slot.read()
        .map_err(|_| VidsubError::Transcriber("Model state poisoned".to_string()))?
        .clone()
        .ok_or_else(|| VidsubError::Transcriber("Model not loaded; call load_model first".to_string()))
}

/// Store the value produced by `load_model`
pub fn store<T>(slot: &RwLock<Option<T>>, value: T) -> Result<()> {
    let mut guard = slot
        .write()
        .map_err(|_| VidsubError::Transcriber("Model state poisoned".to_string()))?;
    *guard = Some(value);
    Ok(())
}
