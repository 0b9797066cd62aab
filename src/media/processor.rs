use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use super::{MediaCommandBuilder, MediaProcessor};
use crate::cancel::CancelToken;
use crate::config::MediaConfig;
use crate::error::{Result, VidsubError};
use crate::process::{run_captured, stderr_text};

/// FFmpeg-backed media processor
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self.command_builder.extract_audio(video_path, audio_path);
        if let Err(e) = command.execute(cancel).await {
            // A half-written WAV must never reach the transcriber.
            let _ = tokio::fs::remove_file(audio_path).await;
            return Err(e);
        }

        info!("Audio extraction completed");
        Ok(())
    }

    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        info!(
            "Embedding subtitles from {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );

        let command = self.command_builder.embed_subtitles(
            video_path,
            subtitle_path,
            output_path,
            &self.config.style,
            &self.config.subtitle_options,
        );
        command.execute(cancel).await?;

        info!("Subtitle embedding completed successfully");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.version_info().await.map(|version| {
            info!("Media processor is available: {}", version);
        })
    }

    async fn version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let command = self.command_builder.version_check();
        let output = run_captured(&command.binary_path, &command.args, &CancelToken::new()).await?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            Err(VidsubError::Media(format!(
                "Media processor version check failed: {}",
                stderr_text(&output)
            )))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn processor(binary: &str) -> FfmpegProcessor {
        FfmpegProcessor::new(MediaConfig {
            binary_path: binary.to_string(),
            ..MediaConfig::default()
        })
    }

    #[tokio::test]
    async fn test_missing_binary_is_environment_error() {
        let err = processor("vidsub-missing-ffmpeg").check_availability().await.unwrap_err();
        assert!(matches!(err, VidsubError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_extraction_is_media_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio.wav");

        // `false` ignores its arguments and exits non-zero.
        let err = processor("false")
            .extract_audio(&dir.path().join("in.mp4"), &audio, &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VidsubError::Media(ref msg) if msg.starts_with("Audio extraction failed")));
        assert!(!audio.exists());
    }
}
