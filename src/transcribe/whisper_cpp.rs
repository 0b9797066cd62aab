use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

use super::common::{TranscriptionMapper, check_binary, loaded, read_json_output, run_engine, store};
use super::Transcriber;
use crate::cancel::CancelToken;
use crate::config::TranscriberConfig;
use crate::error::{Result, VidsubError};
use crate::segment::{Segment, Transcription};
use crate::setup::ModelStore;

/// whisper.cpp `-oj` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    #[serde(default)]
    pub result: Option<WhisperCppResult>,
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Milliseconds from the start of the audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: i64,
    pub to: i64,
}

pub struct WhisperCppMapper;

impl TranscriptionMapper<WhisperCppOutput> for WhisperCppMapper {
    fn to_transcription(output: WhisperCppOutput, requested_language: &str) -> Transcription {
        let language = output
            .result
            .map(|r| r.language)
            .unwrap_or_else(|| requested_language.to_string());

        let segments = output
            .transcription
            .into_iter()
            .map(|seg| {
                Segment::new(
                    seg.offsets.from as f64 / 1000.0,
                    seg.offsets.to as f64 / 1000.0,
                    &seg.text,
                )
            })
            .collect();

        Transcription::new(segments, language).with_model_info("whisper.cpp")
    }
}

/// whisper.cpp command line transcriber with a locally stored ggml model
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
    models: ModelStore,
    model_path: RwLock<Option<PathBuf>>,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig) -> Result<Self> {
        let models = ModelStore::new(&config.models_dir, config.auto_download)?;
        Ok(Self {
            config,
            models,
            model_path: RwLock::new(None),
        })
    }

    fn build_args(&self, model_path: &Path, audio_path: &Path, output_prefix: &Path) -> Vec<String> {
        vec![
            "-m".to_string(),
            model_path.to_string_lossy().to_string(),
            "-f".to_string(),
            audio_path.to_string_lossy().to_string(),
            "-l".to_string(),
            self.config.language.clone(),
            "-oj".to_string(),
            "-of".to_string(),
            output_prefix.to_string_lossy().to_string(),
            "-np".to_string(),
        ]
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn load_model(&self, model_size: &str) -> Result<()> {
        info!("Loading whisper.cpp model ({})...", model_size);
        check_binary(&self.config.binary_path).await?;

        let path = self.models.resolve(model_size).await?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| VidsubError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        if metadata.len() == 0 {
            return Err(VidsubError::ModelLoad(format!("Model file is empty: {}", path.display())));
        }

        info!("Model loaded: {}", path.display());
        store(&self.model_path, path)
    }

    async fn transcribe(&self, audio_path: &Path, cancel: &CancelToken) -> Result<Transcription> {
        let model_path = loaded(&self.model_path)?;

        let temp_dir = tempfile::tempdir()
            .map_err(|e| VidsubError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_prefix = temp_dir.path().join("transcript");

        let args = self.build_args(&model_path, audio_path, &output_prefix);
        run_engine(&self.config.binary_path, &args, cancel).await?;

        let output: WhisperCppOutput = read_json_output(&output_prefix.with_extension("json")).await?;
        let transcription = WhisperCppMapper::to_transcription(output, &self.config.language);

        debug!("whisper.cpp returned {} segments", transcription.segments.len());
        Ok(transcription)
    }
}
