use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{Result, VidsubError};
use crate::events::EventSender;
use crate::media::{MediaProcessor, MediaProcessorFactory};
use crate::segment::{Segment, Transcription};
use crate::subtitle::generate_srt;
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::{SegmentTranslator, TranslationStats, Translator, TranslatorFactory};

/// Suffix appended to the input stem for every output file
pub const OUTPUT_SUFFIX: &str = "_subtitle";

/// Stage of one video's processing. Stages only move forward; `Failed` is
/// reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Idle,
    ExtractingAudio,
    Transcribing,
    Translating,
    WritingSubtitle,
    Embedding,
    Done,
    Failed,
}

impl JobStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ExtractingAudio => "extracting audio",
            Self::Transcribing => "transcribing",
            Self::Translating => "translating",
            Self::WritingSubtitle => "writing subtitle",
            Self::Embedding => "embedding",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// The stage after this one on the success path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::ExtractingAudio),
            Self::ExtractingAudio => Some(Self::Transcribing),
            Self::Transcribing => Some(Self::Translating),
            Self::Translating => Some(Self::WritingSubtitle),
            Self::WritingSubtitle => Some(Self::Embedding),
            Self::Embedding => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output video and subtitle paths for an input video.
///
/// `dir/clip.mp4` becomes `dir/clip_subtitle.mp4` and `dir/clip_subtitle.srt`,
/// or the same names inside `output_dir` when one is given.
pub fn output_paths(input: &Path, output_dir: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    let stem = input
        .file_stem()
        .ok_or_else(|| VidsubError::UnsupportedFormat(format!("No file name: {}", input.display())))?
        .to_string_lossy();

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let video_name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OUTPUT_SUFFIX),
    };
    let output_video = dir.join(video_name);
    let output_subtitle = dir.join(format!("{}{}.srt", stem, OUTPUT_SUFFIX));

    if output_video == input || output_subtitle == input {
        return Err(VidsubError::Config(format!(
            "Output would overwrite the input: {}",
            input.display()
        )));
    }

    Ok((output_video, output_subtitle))
}

/// One video's processing request. Dropping it removes the workspace.
pub struct Job {
    pub id: Uuid,
    pub input: PathBuf,
    pub output_video: PathBuf,
    pub output_subtitle: PathBuf,
    workspace: TempDir,
    stage: JobStage,
}

impl Job {
    pub fn new(input: &Path, output_dir: Option<&Path>) -> Result<Self> {
        if !input.is_file() {
            return Err(VidsubError::FileNotFound(input.display().to_string()));
        }

        let (output_video, output_subtitle) = output_paths(input, output_dir)?;
        let workspace = tempfile::Builder::new().prefix("vidsub-").tempdir()?;

        Ok(Self {
            id: Uuid::new_v4(),
            input: input.to_path_buf(),
            output_video,
            output_subtitle,
            workspace,
            stage: JobStage::Idle,
        })
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Intermediate audio track, removed with the workspace
    pub fn audio_path(&self) -> PathBuf {
        self.workspace.path().join("audio.wav")
    }

    pub fn file_name(&self) -> String {
        display_name(&self.input)
    }

    fn enter(&mut self, stage: JobStage) {
        debug!("Job {} [{}]: {} -> {}", self.id, self.file_name(), self.stage, stage);
        self.stage = stage;
    }

    /// Move to the next success-path stage
    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            self.enter(next);
        }
    }
}

/// Summary of one successfully processed video
#[derive(Debug, Clone)]
pub struct JobReport {
    pub input: PathBuf,
    pub output_video: PathBuf,
    pub output_subtitle: PathBuf,
    pub segments: usize,
    pub translation: TranslationStats,
}

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Model size or model file loaded before a batch
    pub model_size: String,
    pub source_language: String,
    pub target_language: String,
    pub output_dir: Option<PathBuf>,
}

impl WorkflowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_size: config.transcriber.model_size.clone(),
            source_language: config.translate.source_language.clone(),
            target_language: config.translate.target_language.clone(),
            output_dir: config.output.output_dir.clone(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Drives one video through extract, transcribe, translate, write and embed.
pub struct Workflow {
    transcriber: Arc<dyn Transcriber>,
    media: Arc<dyn MediaProcessor>,
    translator: SegmentTranslator,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        media: Arc<dyn MediaProcessor>,
        settings: WorkflowSettings,
    ) -> Self {
        let translator = SegmentTranslator::new(
            translator,
            settings.source_language.clone(),
            settings.target_language.clone(),
        );

        Self {
            transcriber,
            media,
            translator,
            settings,
        }
    }

    /// Build the configured engines and tools
    pub fn from_config(config: &Config) -> Result<Self> {
        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone())?;
        let translator = TranslatorFactory::create_translator(config.translate.clone())?;
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        Ok(Self::new(
            Arc::from(transcriber),
            Arc::from(translator),
            Arc::from(media),
            WorkflowSettings::from_config(config),
        ))
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Check the transcoding tool and load the model once before a batch.
    pub async fn prepare(&self) -> Result<()> {
        self.media.check_availability().await?;
        self.transcriber.load_model(&self.settings.model_size).await
    }

    /// Run one video end to end.
    ///
    /// Stages run strictly in order and the first error ends the job. The
    /// workspace holding the extracted audio is removed on every exit path.
    pub async fn process_video(
        &self,
        input: &Path,
        events: &EventSender,
        cancel: &CancelToken,
    ) -> Result<JobReport> {
        let mut job = Job::new(input, self.settings.output_dir.as_deref())?;
        info!("Processing {} (job {})", input.display(), job.id);

        match self.run_job(&mut job, events, cancel).await {
            Ok(report) => {
                job.advance();
                events.log(format!("Done: {}", job.file_name()));
                Ok(report)
            }
            Err(e) => {
                events.log(format!("Job failed at {}: {}", job.stage, e));
                job.enter(JobStage::Failed);
                Err(e)
            }
        }
    }

    async fn run_job(
        &self,
        job: &mut Job,
        events: &EventSender,
        cancel: &CancelToken,
    ) -> Result<JobReport> {
        cancel.check()?;
        job.advance();
        events.log(format!("Extracting audio: {}", job.file_name()));
        let audio_path = job.audio_path();
        self.media.extract_audio(&job.input, &audio_path, cancel).await?;

        cancel.check()?;
        job.advance();
        events.log("Transcribing audio...");
        let transcription = self.transcriber.transcribe(&audio_path, cancel).await?;
        if transcription.is_empty() {
            events.log("No speech detected");
            return Err(VidsubError::NoSpeech);
        }
        events.log(format!("Transcription done, {} segments", transcription.segments.len()));
        let mut segments = transcription.segments;

        cancel.check()?;
        job.advance();
        let translation = self
            .translator
            .translate_segments(&mut segments, events, cancel)
            .await?;

        cancel.check()?;
        job.advance();
        events.log("Saving subtitle file...");
        ensure_parent_dir(&job.output_subtitle).await?;
        generate_srt(&segments, &job.output_subtitle).await?;
        events.log(format!("Subtitle saved: {}", display_name(&job.output_subtitle)));

        cancel.check()?;
        job.advance();
        events.log("Embedding subtitle to video...");
        ensure_parent_dir(&job.output_video).await?;
        self.media
            .embed_subtitles(&job.input, &job.output_subtitle, &job.output_video, cancel)
            .await?;
        events.log(format!("Output video: {}", display_name(&job.output_video)));

        Ok(JobReport {
            input: job.input.clone(),
            output_video: job.output_video.clone(),
            output_subtitle: job.output_subtitle.clone(),
            segments: segments.len(),
            translation,
        })
    }

    /// Extract the mono 16 kHz track of a single video
    pub async fn extract_audio(&self, video_path: &Path, audio_path: &Path, cancel: &CancelToken) -> Result<()> {
        ensure_parent_dir(audio_path).await?;
        self.media.extract_audio(video_path, audio_path, cancel).await
    }

    /// Load the model and transcribe one audio file
    pub async fn transcribe_audio(&self, audio_path: &Path, cancel: &CancelToken) -> Result<Transcription> {
        if !audio_path.is_file() {
            return Err(VidsubError::FileNotFound(audio_path.display().to_string()));
        }
        self.transcriber.load_model(&self.settings.model_size).await?;
        self.transcriber.transcribe(audio_path, cancel).await
    }

    pub async fn translate_segments(
        &self,
        segments: &mut [Segment],
        events: &EventSender,
        cancel: &CancelToken,
    ) -> Result<TranslationStats> {
        self.translator.translate_segments(segments, events, cancel).await
    }

    /// Burn an existing subtitle file into a copy of a video
    pub async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        for path in [video_path, subtitle_path] {
            if !path.is_file() {
                return Err(VidsubError::FileNotFound(path.display().to_string()));
            }
        }
        ensure_parent_dir(output_path).await?;
        self.media.embed_subtitles(video_path, subtitle_path, output_path, cancel).await
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir).await?),
        _ => Ok(()),
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
