// Media processing over an external transcoding tool
//
// - Processor: FFmpeg implementation of the MediaProcessor trait
// - Commands: command builders and filter escaping

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::cancel::CancelToken;
use crate::config::MediaConfig;
use crate::error::Result;

/// The transcoding collaborator: audio extraction and subtitle burn-in
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Extract a mono 16 kHz PCM WAV track from a video
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// Burn a subtitle file into a copy of the video
    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// Check that the tool can be executed at all
    async fn check_availability(&self) -> Result<()>;

    /// First line of the tool's version banner
    async fn version_info(&self) -> Result<String>;
}

pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessor> {
        Box::new(FfmpegProcessor::new(config))
    }
}
