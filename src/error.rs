use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidsubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The external binary could not be spawned at all.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Transcription error: {0}")]
    Transcriber(String),

    #[error("No speech detected")]
    NoSpeech,

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Cancelled")]
    Cancelled,
}

impl VidsubError {
    /// Environment problems affect every file of a batch, not just one.
    pub fn is_environment(&self) -> bool {
        matches!(self, Self::ToolNotFound(_) | Self::ModelLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, VidsubError>;
