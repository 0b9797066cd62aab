// OpenAI Whisper Python command line support

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

use super::common::{TranscriptionMapper, check_binary, loaded, read_json_output, run_engine, store};
use super::Transcriber;
use crate::cancel::CancelToken;
use crate::config::TranscriberConfig;
use crate::error::{Result, VidsubError};
use crate::segment::{Segment, Transcription};

/// OpenAI Whisper specific JSON output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperOutput {
    #[serde(default)]
    pub text: String,
    pub segments: Vec<OpenAIWhisperSegment>,
    pub language: Option<String>,
}

/// OpenAI Whisper specific segment format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperSegment {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
    pub no_speech_prob: Option<f64>,
}

pub struct OpenAIWhisperMapper;

impl TranscriptionMapper<OpenAIWhisperOutput> for OpenAIWhisperMapper {
    fn to_transcription(output: OpenAIWhisperOutput, requested_language: &str) -> Transcription {
        let segments = output
            .segments
            .into_iter()
            .map(|seg| Segment::new(seg.start, seg.end, &seg.text))
            .collect();

        let language = output.language.unwrap_or_else(|| requested_language.to_string());
        Transcription::new(segments, language).with_model_info("OpenAI Whisper")
    }
}

/// OpenAI Whisper implementation; the tool loads its own model per run
pub struct OpenAITranscriber {
    config: TranscriberConfig,
    model: RwLock<Option<String>>,
}

impl OpenAITranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
        }
    }

    fn build_args(&self, model: &str, audio_path: &Path, output_dir: &Path) -> Vec<String> {
        vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(),
            model.to_string(),
            "--language".to_string(),
            self.config.language.clone(),
            "--task".to_string(),
            "transcribe".to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ]
    }
}

#[async_trait]
impl Transcriber for OpenAITranscriber {
    async fn load_model(&self, model_size: &str) -> Result<()> {
        info!("Loading OpenAI Whisper model ({})...", model_size);
        if model_size.trim().is_empty() {
            return Err(VidsubError::ModelLoad("Model size must not be empty".to_string()));
        }

        check_binary(&self.config.binary_path).await?;
        store(&self.model, model_size.trim().to_string())
    }

    async fn transcribe(&self, audio_path: &Path, cancel: &CancelToken) -> Result<Transcription> {
        let model = loaded(&self.model)?;
        debug!("Executing OpenAI Whisper transcription with model: {}", model);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| VidsubError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let args = self.build_args(&model, audio_path, output_dir);
        run_engine(&self.config.binary_path, &args, cancel).await?;

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| VidsubError::Transcriber("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        let output: OpenAIWhisperOutput = read_json_output(&json_file).await?;
        Ok(OpenAIWhisperMapper::to_transcription(output, &self.config.language))
    }
}
