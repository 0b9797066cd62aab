use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, VidsubError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Which speech-to-text engine to drive
    pub engine: TranscriberEngine,
    /// Path to transcriber binary (e.g. whisper-cli, whisper)
    pub binary_path: String,
    /// Model size (tiny, base, small, medium, large-v2) or a model file path
    pub model_size: String,
    /// Where ggml model files live
    pub models_dir: PathBuf,
    /// Download missing models instead of failing
    pub auto_download: bool,
    /// Spoken language of the input videos
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriberEngine {
    /// whisper.cpp command line (`whisper-cli`)
    WhisperCpp,
    /// OpenAI Whisper Python command line (`whisper`)
    OpenaiWhisper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Translation backend
    pub provider: TranslationProvider,
    pub source_language: String,
    pub target_language: String,
    /// Endpoint URL of the backend
    pub endpoint: String,
    /// LLM model used by the ollama provider
    pub model: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationProvider {
    /// Public Google translate endpoint
    Google,
    /// Local ollama server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Burn-in style handed to the subtitles filter
    pub style: SubtitleStyle,
    /// Additional encoding options for subtitle embedding
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font_size: u32,
    /// ASS colour, `&HAABBGGRR`
    pub primary_colour: String,
    pub outline_colour: String,
    pub outline: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write outputs here instead of next to each input video
    pub output_dir: Option<PathBuf>,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            engine: TranscriberEngine::WhisperCpp,
            binary_path: "whisper-cli".to_string(),
            model_size: "base".to_string(),
            models_dir: PathBuf::from(".vidsub/models"),
            auto_download: true,
            language: "en".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::Google,
            source_language: "en".to_string(),
            target_language: "zh-CN".to_string(),
            endpoint: "https://translate.googleapis.com".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            style: SubtitleStyle::default(),
            subtitle_options: vec![],
        }
    }
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size: 24,
            primary_colour: "&H00FFFFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            outline: 2,
        }
    }
}

impl SubtitleStyle {
    /// `force_style` value for the subtitles filter
    pub fn force_style(&self) -> String {
        format!(
            "FontSize={},PrimaryColour={},OutlineColour={},Outline={}",
            self.font_size, self.primary_colour, self.outline_colour, self.outline
        )
    }
}

impl TranscriberEngine {
    pub fn default_binary(&self) -> &'static str {
        match self {
            Self::WhisperCpp => "whisper-cli",
            Self::OpenaiWhisper => "whisper",
        }
    }
}

impl std::str::FromStr for TranscriberEngine {
    type Err = VidsubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "whisper-cpp" | "whispercpp" => Ok(Self::WhisperCpp),
            "openai-whisper" | "openai" => Ok(Self::OpenaiWhisper),
            _ => Err(VidsubError::Config(format!(
                "Invalid transcriber engine '{}'. Valid engines: whisper-cpp, openai-whisper",
                s
            ))),
        }
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = VidsubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            _ => Err(VidsubError::Config(format!(
                "Invalid translation provider '{}'. Valid providers: google, ollama",
                s
            ))),
        }
    }
}

impl TranslationProvider {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Google => "https://translate.googleapis.com",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidsubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidsubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidsubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VidsubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Switch the translation provider, moving the endpoint along with it
    /// unless it was customised.
    pub fn set_translation_provider(&mut self, provider: TranslationProvider) {
        if self.translate.endpoint == self.translate.provider.default_endpoint() {
            self.translate.endpoint = provider.default_endpoint().to_string();
        }
        self.translate.provider = provider;
    }

    /// Switch the transcriber engine, moving the binary along with it
    /// unless it was customised.
    pub fn set_transcriber_engine(&mut self, engine: TranscriberEngine) {
        if self.transcriber.binary_path == self.transcriber.engine.default_binary() {
            self.transcriber.binary_path = engine.default_binary().to_string();
        }
        self.transcriber.engine = engine;
    }
}
