use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vidsub::batch::BatchRunner;
use vidsub::cancel::CancelToken;
use vidsub::error::{Result, VidsubError};
use vidsub::events::{BatchOutcome, EventSender, channels};
use vidsub::media::MediaProcessor;
use vidsub::segment::{Segment, Transcription};
use vidsub::subtitle::{parse_srt, read_srt};
use vidsub::transcribe::Transcriber;
use vidsub::translate::Translator;
use vidsub::workflow::{Workflow, WorkflowSettings};

/// Copies the video bytes into the "audio" file so the fake transcriber can
/// react to per-file markers. A video containing `bad` fails to decode and
/// one containing `noburn` leaves a partial output when embedding fails.
#[derive(Default)]
struct FakeMedia {
    missing_tool: bool,
}

#[async_trait]
impl MediaProcessor for FakeMedia {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        let content = tokio::fs::read_to_string(video_path).await?;
        if content.contains("bad") {
            return Err(VidsubError::Media(format!(
                "Audio extraction failed: invalid data in {}",
                video_path.display()
            )));
        }
        tokio::fs::write(audio_path, content).await?;
        Ok(())
    }

    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        let mut burned = tokio::fs::read(video_path).await?;
        if burned.windows(6).any(|w| w == b"noburn") {
            tokio::fs::write(output_path, &burned[..burned.len() / 2]).await?;
            return Err(VidsubError::Media(format!(
                "Subtitle embedding failed: encoder stopped on {}",
                video_path.display()
            )));
        }
        burned.extend(tokio::fs::read(subtitle_path).await?);
        tokio::fs::write(output_path, burned).await?;
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        if self.missing_tool {
            Err(VidsubError::ToolNotFound("ffmpeg".to_string()))
        } else {
            Ok(())
        }
    }

    async fn version_info(&self) -> Result<String> {
        Ok("fake 1.0".to_string())
    }
}

/// `silent` audio has no speech, `panic` audio crashes the engine.
#[derive(Default)]
struct FakeTranscriber {
    fail_load: bool,
    seen_audio: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn load_model(&self, model_size: &str) -> Result<()> {
        if self.fail_load {
            Err(VidsubError::ModelLoad(format!("Unknown model '{}'", model_size)))
        } else {
            Ok(())
        }
    }

    async fn transcribe(&self, audio_path: &Path, _cancel: &CancelToken) -> Result<Transcription> {
        self.seen_audio.lock().unwrap().push(audio_path.to_path_buf());
        let content = tokio::fs::read_to_string(audio_path).await?;

        if content.contains("panic") {
            panic!("decoder exploded");
        }
        if content.contains("silent") {
            return Ok(Transcription::new(vec![], "en"));
        }

        Ok(Transcription::new(
            vec![
                Segment::new(0.0, 1.5, " Hello there "),
                Segment::new(1.5, 3.0, "   "),
                Segment::new(3.0, 4.25, "Goodbye"),
            ],
            "en",
        ))
    }
}

struct PrefixTranslator;

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        Ok(format!("[{}] {}", target, text))
    }
}

/// Replies with nothing for the first line and a paragraph break otherwise.
struct RaggedTranslator;

#[async_trait]
impl Translator for RaggedTranslator {
    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
        if text.contains("Hello") {
            Ok(String::new())
        } else {
            Ok("再见\n\n朋友".to_string())
        }
    }
}

struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
        Err(VidsubError::Translation("quota exceeded".to_string()))
    }
}

fn workflow_with(
    transcriber: Arc<FakeTranscriber>,
    translator: Arc<dyn Translator>,
    media: FakeMedia,
) -> Workflow {
    Workflow::new(transcriber, translator, Arc::new(media), WorkflowSettings::default())
}

fn default_workflow() -> Workflow {
    workflow_with(
        Arc::new(FakeTranscriber::default()),
        Arc::new(PrefixTranslator),
        FakeMedia::default(),
    )
}

fn write_video(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_single_video_produces_bilingual_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "clip.mp4", "speech");

    let report = default_workflow()
        .process_video(&input, &EventSender::detached(), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.output_video, dir.path().join("clip_subtitle.mp4"));
    assert_eq!(report.output_subtitle, dir.path().join("clip_subtitle.srt"));
    assert!(report.output_video.is_file());
    assert_eq!(report.segments, 3);
    assert_eq!(report.translation.translated, 2);
    assert_eq!(report.translation.skipped, 1);

    let content = std::fs::read_to_string(&report.output_subtitle).unwrap();
    assert_eq!(content.lines().count(), 5 * 3);
    assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,500\n[zh-CN] Hello there\nHello there\n\n"));

    let cues = parse_srt(&content).unwrap();
    assert_eq!(cues.len(), 3);
    assert_eq!(cues[2].start, 3.0);
    assert_eq!(cues[2].end, 4.25);
    assert_eq!(cues[2].lines, vec!["[zh-CN] Goodbye", "Goodbye"]);
}

#[tokio::test]
async fn test_stage_log_lines_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "talk.mkv", "speech");
    let (events, mut receivers) = channels();

    default_workflow()
        .process_video(&input, &events, &CancelToken::new())
        .await
        .unwrap();

    let log = receivers.drain_log();
    let expected = [
        "Extracting audio: talk.mkv",
        "Transcribing audio...",
        "Transcription done, 3 segments",
        "Translating subtitles...",
        "Translation done",
        "Saving subtitle file...",
        "Subtitle saved: talk_subtitle.srt",
        "Embedding subtitle to video...",
        "Output video: talk_subtitle.mkv",
        "Done: talk.mkv",
    ];
    let positions: Vec<usize> = expected
        .iter()
        .map(|line| log.iter().position(|l| l == line).unwrap_or_else(|| panic!("missing {:?}", line)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(log.last().map(String::as_str), Some("Done: talk.mkv"));
}

#[tokio::test]
async fn test_workspace_removed_after_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_video(dir.path(), "good.mp4", "speech");
    let silent = write_video(dir.path(), "quiet.mp4", "silent");

    let transcriber = Arc::new(FakeTranscriber::default());
    let workflow = workflow_with(transcriber.clone(), Arc::new(PrefixTranslator), FakeMedia::default());
    let events = EventSender::detached();

    workflow.process_video(&good, &events, &CancelToken::new()).await.unwrap();
    workflow.process_video(&silent, &events, &CancelToken::new()).await.unwrap_err();

    let seen = transcriber.seen_audio.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    for audio in seen {
        assert_eq!(audio.file_name().unwrap(), "audio.wav");
        assert!(!audio.exists());
        assert!(!audio.parent().unwrap().exists());
    }
}

#[tokio::test]
async fn test_zero_speech_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "quiet.mp4", "silent");
    let (events, mut receivers) = channels();

    let err = default_workflow()
        .process_video(&input, &events, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, VidsubError::NoSpeech));
    assert!(!dir.path().join("quiet_subtitle.srt").exists());
    assert!(!dir.path().join("quiet_subtitle.mp4").exists());
    let log = receivers.drain_log();
    assert!(log.iter().any(|l| l == "No speech detected"));
    assert_eq!(log.last().map(String::as_str), Some("Job failed at transcribing: No speech detected"));
    assert!(!log.iter().any(|l| l.starts_with("Done: ")));
}

#[tokio::test]
async fn test_translation_failure_keeps_original_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "clip.mp4", "speech");
    let workflow = workflow_with(
        Arc::new(FakeTranscriber::default()),
        Arc::new(FailingTranslator),
        FakeMedia::default(),
    );

    let report = workflow
        .process_video(&input, &EventSender::detached(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.translation.failed, 2);

    let segments = read_srt(&report.output_subtitle).await.unwrap();
    assert_eq!(segments.len(), 3);
    for segment in segments {
        assert_eq!(segment.translated.as_deref(), Some(segment.text.as_str()));
    }
}

#[tokio::test]
async fn test_empty_and_multiline_replies_keep_cue_shape() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "clip.mp4", "speech");
    let workflow = workflow_with(
        Arc::new(FakeTranscriber::default()),
        Arc::new(RaggedTranslator),
        FakeMedia::default(),
    );

    let report = workflow
        .process_video(&input, &EventSender::detached(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.translation.failed, 1);
    assert_eq!(report.translation.translated, 1);

    let content = std::fs::read_to_string(&report.output_subtitle).unwrap();
    assert_eq!(content.lines().count(), 5 * 3);

    let cues = parse_srt(&content).unwrap();
    assert_eq!(cues.len(), 3);
    assert_eq!(cues[0].lines, vec!["Hello there", "Hello there"]);
    assert!(cues[1].lines.is_empty());
    assert_eq!(cues[2].lines, vec!["再见 朋友", "Goodbye"]);
}

#[tokio::test]
async fn test_embed_failure_keeps_subtitle_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "clip.mp4", "speech noburn");
    let (events, mut receivers) = channels();

    let err = default_workflow()
        .process_video(&input, &events, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, VidsubError::Media(ref m) if m.contains("Subtitle embedding failed")));
    let srt = dir.path().join("clip_subtitle.srt");
    assert!(srt.is_file());
    assert_eq!(parse_srt(&std::fs::read_to_string(&srt).unwrap()).unwrap().len(), 3);

    let log = receivers.drain_log();
    assert!(log.iter().any(|l| l == "Subtitle saved: clip_subtitle.srt"));
    assert!(log.last().is_some_and(|l| l.starts_with("Job failed at embedding: ")));
}

#[tokio::test]
async fn test_unwritable_subtitle_path_fails_before_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "clip.mp4", "speech");
    std::fs::create_dir(dir.path().join("clip_subtitle.srt")).unwrap();
    let (events, mut receivers) = channels();

    let err = default_workflow()
        .process_video(&input, &events, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, VidsubError::Io(_)));
    assert!(!dir.path().join("clip_subtitle.mp4").exists());

    let log = receivers.drain_log();
    assert!(!log.iter().any(|l| l == "Embedding subtitle to video..."));
    assert!(log.last().is_some_and(|l| l.starts_with("Job failed at writing subtitle: ")));
}

#[tokio::test]
async fn test_output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_video(dir.path(), "clip.webm", "speech");
    let out_dir = dir.path().join("out/nested");

    let settings = WorkflowSettings {
        output_dir: Some(out_dir.clone()),
        ..WorkflowSettings::default()
    };
    let workflow = Workflow::new(
        Arc::new(FakeTranscriber::default()),
        Arc::new(PrefixTranslator),
        Arc::new(FakeMedia::default()),
        settings,
    );

    let report = workflow
        .process_video(&input, &EventSender::detached(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(report.output_video, out_dir.join("clip_subtitle.webm"));
    assert!(out_dir.join("clip_subtitle.srt").is_file());
}

#[tokio::test]
async fn test_batch_continues_after_file_failure() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_video(dir.path(), "one.mp4", "speech"),
        write_video(dir.path(), "two.mp4", "bad stream"),
        write_video(dir.path(), "three.mp4", "speech"),
    ];
    let (events, mut receivers) = channels();

    let runner = BatchRunner::new(Arc::new(default_workflow()));
    let outcome = runner.run(&inputs, &events, &CancelToken::new()).await;

    let result = outcome.result().expect("batch should finish");
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.total, 3);
    assert_eq!(result.attempted, 3);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].path, inputs[1]);
    assert_eq!(result.summary(), "Completed: 2/3 video(s) successful");
    assert!(!result.all_succeeded());

    let log = receivers.drain_log();
    assert!(log.iter().any(|l| l.starts_with("Failed: ") && l.contains("two.mp4") && l.contains("Error: ")));
    assert!(dir.path().join("three_subtitle.mp4").is_file());
    assert!(!dir.path().join("two_subtitle.srt").exists());

    let progress = receivers.drain_progress();
    assert!(progress.iter().any(|p| p.percent == 33 && p.status == "Processing (2/3): two.mp4"));
    let last = progress.last().unwrap();
    assert_eq!((last.percent, last.status.as_str()), (100, "Done"));
}

#[tokio::test]
async fn test_batch_continues_after_embed_failure() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_video(dir.path(), "one.mp4", "speech"),
        write_video(dir.path(), "two.mp4", "speech noburn"),
        write_video(dir.path(), "three.mp4", "speech"),
    ];
    let (events, mut receivers) = channels();

    let outcome = BatchRunner::new(Arc::new(default_workflow()))
        .run(&inputs, &events, &CancelToken::new())
        .await;

    let result = outcome.result().expect("batch should finish");
    assert_eq!((result.succeeded, result.total, result.attempted), (2, 3, 3));
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].path, inputs[1]);
    assert!(result.failures[0].reason.contains("Subtitle embedding failed"));

    assert!(dir.path().join("two_subtitle.srt").is_file());
    assert!(dir.path().join("three_subtitle.mp4").is_file());
    assert!(dir.path().join("three_subtitle.srt").is_file());

    let log = receivers.drain_log();
    assert!(log.iter().any(|l| l == "Done: three.mp4"));
}

#[tokio::test]
async fn test_batch_survives_panicking_job() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_video(dir.path(), "crash.mp4", "panic"),
        write_video(dir.path(), "fine.mp4", "speech"),
    ];

    let runner = BatchRunner::new(Arc::new(default_workflow()));
    let outcome = runner.run(&inputs, &EventSender::detached(), &CancelToken::new()).await;

    let result = outcome.result().expect("batch should finish");
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failures[0].path, inputs[0]);
    assert!(result.failures[0].reason.contains("decoder exploded"));
}

#[tokio::test]
async fn test_model_load_failure_aborts_batch() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![write_video(dir.path(), "clip.mp4", "speech")];
    let transcriber = Arc::new(FakeTranscriber {
        fail_load: true,
        ..FakeTranscriber::default()
    });
    let workflow = workflow_with(transcriber.clone(), Arc::new(PrefixTranslator), FakeMedia::default());

    let outcome = BatchRunner::new(Arc::new(workflow))
        .run(&inputs, &EventSender::detached(), &CancelToken::new())
        .await;

    match outcome {
        BatchOutcome::Error(message) => assert!(message.contains("Unknown model")),
        BatchOutcome::Finished(_) => panic!("expected a fatal error"),
    }
    assert!(transcriber.seen_audio.lock().unwrap().is_empty());
    assert!(!dir.path().join("clip_subtitle.srt").exists());
}

#[tokio::test]
async fn test_missing_tool_aborts_batch() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![write_video(dir.path(), "clip.mp4", "speech")];
    let workflow = workflow_with(
        Arc::new(FakeTranscriber::default()),
        Arc::new(PrefixTranslator),
        FakeMedia { missing_tool: true },
    );

    let outcome = BatchRunner::new(Arc::new(workflow))
        .run(&inputs, &EventSender::detached(), &CancelToken::new())
        .await;
    assert!(matches!(outcome, BatchOutcome::Error(ref m) if m.contains("ffmpeg")));
}

#[tokio::test]
async fn test_cancelled_batch_stops_before_next_file() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_video(dir.path(), "a.mp4", "speech"),
        write_video(dir.path(), "b.mp4", "speech"),
    ];
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = BatchRunner::new(Arc::new(default_workflow()))
        .run(&inputs, &EventSender::detached(), &cancel)
        .await;

    let result = outcome.result().expect("cancelled batch still finishes");
    assert!(result.cancelled);
    assert_eq!(result.attempted, 0);
    assert_eq!(result.succeeded, 0);
    assert!(!result.all_succeeded());
    assert!(!dir.path().join("a_subtitle.mp4").exists());
}

#[tokio::test]
async fn test_spawned_batch_reports_once() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![write_video(dir.path(), "clip.mov", "speech")];

    let mut handle = BatchRunner::new(Arc::new(default_workflow())).spawn(inputs);
    let outcome = handle.outcome.await.unwrap();

    let result = outcome.result().expect("batch should finish");
    assert!(result.all_succeeded());
    assert!(result.finished_at >= result.started_at);

    let mut last = None;
    while let Ok(update) = handle.progress.try_recv() {
        last = Some(update);
    }
    assert_eq!(last.map(|p| p.percent), Some(100));
    assert!(dir.path().join("clip_subtitle.mov").is_file());
}
