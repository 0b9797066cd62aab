use serde::{Deserialize, Serialize};

/// Shortest cue length, used when an engine reports `end <= start`.
pub const MIN_SEGMENT_DURATION: f64 = 0.001;

/// One time-bounded unit of transcribed speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Seconds from the start of the video, inclusive
    pub start: f64,
    /// Seconds from the start of the video, always after `start`
    pub end: f64,
    /// Original-language transcript, whitespace trimmed
    pub text: String,
    /// Target-language text, filled in by the segment translator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
}

impl Segment {
    /// Build a segment from raw engine output, trimming the text and
    /// repairing timings that would break the cue ordering.
    pub fn new(start: f64, end: f64, text: impl AsRef<str>) -> Self {
        let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        let end = if end.is_finite() && end > start {
            end
        } else {
            start + MIN_SEGMENT_DURATION
        };

        Self {
            start,
            end,
            text: text.as_ref().trim().to_string(),
            translated: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Text shown on the first subtitle line; the original when untranslated.
    pub fn display_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.text)
    }
}

/// Normalized output of a transcription engine for one audio file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    pub language: String,
    pub duration: Option<f64>,
    pub model_info: Option<String>,
}

impl Transcription {
    pub fn new(segments: Vec<Segment>, language: impl Into<String>) -> Self {
        let duration = segments.last().map(|seg| seg.end);
        Self {
            segments,
            language: language.into(),
            duration,
            model_info: None,
        }
    }

    pub fn with_model_info(mut self, model_info: impl Into<String>) -> Self {
        self.model_info = Some(model_info.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Full transcript, one segment per space
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .filter(|seg| !seg.is_blank())
            .map(|seg| seg.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
