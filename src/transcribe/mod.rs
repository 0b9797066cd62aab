// Speech-to-text adapters
//
// Each engine runs an external command line tool that writes JSON, then maps
// that JSON onto the crate's Segment model:
// - WhisperCpp: whisper.cpp `whisper-cli`, local ggml model files
// - OpenAI: OpenAI Whisper Python `whisper`, models managed by the tool
//
// To add an engine, parse its output into a service-specific struct,
// implement TranscriptionMapper for it, and add it to the factory.

pub mod common;
pub mod openai;
pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;

pub use common::*;
use crate::cancel::CancelToken;
use crate::config::{TranscriberConfig, TranscriberEngine};
use crate::error::Result;
use crate::segment::Transcription;

/// The speech-to-text collaborator
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Prepare the model once before a batch; environment failures surface here
    async fn load_model(&self, model_size: &str) -> Result<()>;

    /// Transcribe a mono 16 kHz WAV file into ordered segments.
    /// An empty segment list is returned as-is; callers decide what it means.
    async fn transcribe(&self, audio_path: &Path, cancel: &CancelToken) -> Result<Transcription>;
}

/// Picks the engine named in the config
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_transcriber(config: TranscriberConfig) -> Result<Box<dyn Transcriber>> {
        Ok(match config.engine {
            TranscriberEngine::WhisperCpp => Box::new(whisper_cpp::WhisperCppTranscriber::new(config)?),
            TranscriberEngine::OpenaiWhisper => Box::new(openai::OpenAITranscriber::new(config)),
        })
    }
}
