use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add bilingual subtitles to videos (files or folders)
    Process {
        /// Input video files or folders
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for processed files (default: next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Whisper model size (tiny, base, small, medium, large-v2, large-v3) or model file
        #[arg(short, long)]
        model: Option<String>,

        /// Transcription engine (whisper-cpp, openai-whisper)
        #[arg(long)]
        engine: Option<String>,

        /// Translation provider (google, ollama)
        #[arg(long)]
        translator: Option<String>,
    },

    /// List available whisper models and their status
    Models {
        /// Download all missing models
        #[arg(long)]
        download: bool,
    },

    /// Extract audio from video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe audio to a JSON segment list
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Whisper model size or model file
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Translate a JSON segment list or SRT file into a bilingual SRT
    Translate {
        /// Input JSON or SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Translation provider (google, ollama)
        #[arg(long)]
        translator: Option<String>,
    },

    /// Burn subtitles into a copy of a video
    Embed {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the default configuration as TOML
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "vidsub.toml")]
        output: PathBuf,
    },
}
