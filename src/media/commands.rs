use std::path::Path;

use crate::cancel::CancelToken;
use crate::config::SubtitleStyle;
use crate::error::{Result, VidsubError};
use crate::process::{run_captured, stderr_text};

/// One ffmpeg invocation, built up argument by argument
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    /// Used as the prefix of error messages, e.g. "Audio extraction"
    pub description: String,
}

impl MediaCommand {
    pub fn new(binary_path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `<flag> <value>` pair
    fn option(self, flag: &str, value: impl ToString) -> Self {
        self.arg(flag).arg(value.to_string())
    }

    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.option("-i", path.as_ref().display())
    }

    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy())
    }

    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    pub fn audio_codec(self, codec: &str) -> Self {
        self.option("-c:a", codec)
    }

    /// Pass the audio stream through untouched
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.option("-ar", rate)
    }

    pub fn audio_channels(self, channels: u32) -> Self {
        self.option("-ac", channels)
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Execute the command, failing on a non-zero exit with the captured stderr
    pub async fn execute(&self, cancel: &CancelToken) -> Result<()> {
        let output = run_captured(&self.binary_path, &self.args, cancel).await?;

        if !output.status.success() {
            return Err(VidsubError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr_text(&output)
            )));
        }

        Ok(())
    }
}

/// Escape a path for use inside a quoted filtergraph argument.
///
/// Backslashes become forward slashes, colons are escaped because they
/// separate filter options, and single quotes close and reopen the quoting.
pub fn escape_filter_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}

/// `subtitles=` filter expression with the burn-in style applied
pub fn subtitles_filter<P: AsRef<Path>>(subtitle_path: P, style: &SubtitleStyle) -> String {
    format!(
        "subtitles='{}':force_style='{}'",
        escape_filter_path(subtitle_path),
        style.force_style()
    )
}

/// Builder for common media processing operations
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build subtitle burn-in command; audio is copied without re-encoding
    pub fn embed_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        style: &SubtitleStyle,
        additional_options: &[String],
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle embedding")
            .input(&video_path)
            .video_filter(subtitles_filter(&subtitle_path, style))
            .copy_audio()
            .args(additional_options.iter().cloned())
            .overwrite()
            .output(output_path)
    }

    /// Build audio extraction command (mono 16-bit PCM WAV at 16 kHz)
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_escape_filter_path_windows() {
        assert_eq!(
            escape_filter_path(r"C:\videos\clip_subtitle.srt"),
            r"C\:/videos/clip_subtitle.srt"
        );
    }

    #[test]
    fn test_escape_filter_path_quote() {
        assert_eq!(escape_filter_path("/tmp/it's.srt"), r"/tmp/it'\''s.srt");
    }

    #[test]
    fn test_extract_audio_args() {
        let cmd = MediaCommandBuilder::new("ffmpeg")
            .extract_audio(PathBuf::from("/v/in.mp4"), PathBuf::from("/tmp/audio.wav"));
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            cmd.args,
            vec![
                "-i", "/v/in.mp4", "-vn", "-c:a", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y",
                "/tmp/audio.wav"
            ]
        );
    }

    #[test]
    fn test_embed_subtitles_args() {
        let cmd = MediaCommandBuilder::new("ffmpeg").embed_subtitles(
            PathBuf::from("/v/in.mp4"),
            PathBuf::from("/v/in_subtitle.srt"),
            PathBuf::from("/v/in_subtitle.mp4"),
            &SubtitleStyle::default(),
            &["-preset".to_string(), "fast".to_string()],
        );
        assert_eq!(
            cmd.args,
            vec![
                "-i",
                "/v/in.mp4",
                "-vf",
                "subtitles='/v/in_subtitle.srt':force_style='FontSize=24,PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,Outline=2'",
                "-c:a",
                "copy",
                "-preset",
                "fast",
                "-y",
                "/v/in_subtitle.mp4",
            ]
        );
    }
}
