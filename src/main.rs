//! vidsub - Batch bilingual subtitle workflow
//!
//! Command line entry point: loads configuration, sets up logging and runs
//! either a full batch or one of the single-stage commands.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vidsub::batch::BatchRunner;
use vidsub::cancel::CancelToken;
use vidsub::cli::{Args, Commands};
use vidsub::config::Config;
use vidsub::events::{BatchOutcome, EventSender};
use vidsub::input::collect_videos;
use vidsub::segment::{Segment, Transcription};
use vidsub::setup::ModelStore;
use vidsub::subtitle::{generate_srt, read_srt};
use vidsub::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "vidsub.toml";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Setup logging to both console and file
    let _guard = setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;
    let mut exit_code = ExitCode::SUCCESS;

    match args.command {
        Commands::Process { inputs, output_dir, model, engine, translator } => {
            if let Some(model) = model {
                config.transcriber.model_size = model;
            }
            if let Some(engine) = engine {
                config.set_transcriber_engine(engine.parse()?);
            }
            if let Some(translator) = translator {
                config.set_translation_provider(translator.parse()?);
            }
            if output_dir.is_some() {
                config.output.output_dir = output_dir;
            }

            let videos = collect_videos(&inputs);
            if videos.is_empty() {
                anyhow::bail!("No supported video files found");
            }
            info!("Found {} video file(s) to process", videos.len());

            if !run_batch(&config, videos).await? {
                exit_code = ExitCode::FAILURE;
            }
        }
        Commands::Models { download } => {
            let store = ModelStore::new(&config.transcriber.models_dir, true)?;

            println!("\nAvailable Whisper Models:");
            println!("{:<15} {:<20} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
            println!("{}", "-".repeat(65));
            for (model, present) in store.list() {
                let status = if present { "Downloaded" } else { "Missing" };
                println!(
                    "{:<15} {:<20} {:<10.1} {:<10}",
                    model.name, model.filename, model.size_mb, status
                );
            }

            if download {
                info!("Downloading all missing models...");
                let count = store.download_missing().await?;
                info!("Downloaded {} model(s) to {}", count, store.models_dir().display());
            }
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());
            let workflow = Workflow::from_config(&config)?;
            workflow.extract_audio(&input, &output, &CancelToken::new()).await?;
            info!("Audio written to {}", output.display());
        }
        Commands::Transcribe { input, output, model } => {
            info!("Transcribing audio: {}", input.display());
            if let Some(model) = model {
                config.transcriber.model_size = model;
            }

            let workflow = Workflow::from_config(&config)?;
            let transcription = workflow.transcribe_audio(&input, &CancelToken::new()).await?;
            if transcription.is_empty() {
                warn!("No speech detected in {}", input.display());
            }

            let json = serde_json::to_string_pretty(&transcription)?;
            tokio::fs::write(&output, json)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {} segments to {}", transcription.segments.len(), output.display());
        }
        Commands::Translate { input, output, translator } => {
            info!("Translating subtitles: {}", input.display());
            if let Some(translator) = translator {
                config.set_translation_provider(translator.parse()?);
            }

            let mut segments = load_segments(&input).await?;
            let workflow = Workflow::from_config(&config)?;
            let stats = workflow
                .translate_segments(&mut segments, &EventSender::detached(), &CancelToken::new())
                .await?;
            generate_srt(&segments, &output).await?;

            info!(
                "Translated {} segment(s), {} failed, {} blank",
                stats.translated, stats.failed, stats.skipped
            );
        }
        Commands::Embed { video, subtitles, output } => {
            info!("Embedding subtitles into video: {}", video.display());
            let workflow = Workflow::from_config(&config)?;
            workflow
                .embed_subtitles(&video, &subtitles, &output, &CancelToken::new())
                .await?;
            info!("Output video: {}", output.display());
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(exit_code)
}

/// `--config` wins, then `./vidsub.toml`, then built-in defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
            Ok(Config::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => Ok(Config::default()),
    }
}

/// Run a batch with a progress bar. Returns whether every file succeeded.
async fn run_batch(config: &Config, videos: Vec<PathBuf>) -> Result<bool> {
    let workflow = Arc::new(Workflow::from_config(config)?);
    let mut handle = BatchRunner::new(workflow).spawn(videos);

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut cancel_requested = false;
    let outcome = loop {
        tokio::select! {
            Some(update) = handle.progress.recv() => {
                pb.set_position(update.percent as u64);
                pb.set_message(update.status);
            }
            Some(line) = handle.log.recv() => {
                pb.suspend(|| info!("{}", line));
            }
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                cancel_requested = true;
                pb.suspend(|| warn!("Cancelling after the current step..."));
                handle.cancel.cancel();
            }
            outcome = &mut handle.outcome => {
                break outcome.context("Batch worker stopped without reporting")?;
            }
        }
    };

    while let Ok(line) = handle.log.try_recv() {
        pb.suspend(|| info!("{}", line));
    }

    match outcome {
        BatchOutcome::Error(message) => {
            pb.abandon_with_message("Failed");
            anyhow::bail!("{}", message)
        }
        BatchOutcome::Finished(result) => {
            pb.finish_with_message("Done");

            println!("\n{}", result.summary());
            for failure in &result.failures {
                println!("  {}: {}", failure.path.display(), failure.reason);
            }
            if result.cancelled {
                println!("Batch cancelled after {}/{} file(s)", result.attempted, result.total);
            }

            Ok(result.all_succeeded())
        }
    }
}

/// Segments from a `transcribe` JSON file or an existing SRT file
async fn load_segments(path: &Path) -> Result<Vec<Segment>> {
    let is_srt = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("srt"))
        .unwrap_or(false);
    if is_srt {
        return Ok(read_srt(path).await?);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Ok(transcription) = serde_json::from_str::<Transcription>(&content) {
        return Ok(transcription.segments);
    }
    Ok(serde_json::from_str::<Vec<Segment>>(&content)?)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".vidsub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation, written off the async runtime
    let file_appender = rolling::daily(&log_dir, "vidsub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("vidsub.log").display()
    );

    Ok(guard)
}
