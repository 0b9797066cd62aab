use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Result, VidsubError};
use crate::segment::Segment;
use crate::timecode::{format_srt_time, parse_srt_time};

/// Render bilingual SRT content: index, time range, translated line,
/// original line, blank separator. Every cue is exactly five lines.
pub fn render_srt(segments: &[Segment]) -> String {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        let original = single_line(&segment.text);
        let mut translated = single_line(segment.display_text());
        if translated.is_empty() {
            translated = original.clone();
        }
        // A blank segment keeps both lines empty; otherwise neither may be.
        let original = if original.is_empty() { translated.clone() } else { original };

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n{}\n\n",
            index + 1,
            format_srt_time(segment.start),
            format_srt_time(segment.end),
            translated,
            original
        ));
    }

    srt_content
}

/// Fold multi-line text onto one line; a blank line would end the cue.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate SRT subtitle file from segments, overwriting any existing file
pub async fn generate_srt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    fs::write(output_path, render_srt(segments)).await?;

    info!("SRT file generated successfully ({} cues)", segments.len());
    Ok(())
}

/// One numbered entry of a subtitle file
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub lines: Vec<String>,
}

impl Cue {
    /// Two-line cues are read as (translated, original); anything else
    /// becomes an untranslated segment with its lines joined.
    pub fn to_segment(&self) -> Segment {
        match self.lines.as_slice() {
            [translated, original] => {
                let mut segment = Segment::new(self.start, self.end, original);
                segment.translated = Some(translated.clone());
                segment
            }
            // An empty cue comes from a blank segment; both of its lines were empty.
            [] => {
                let mut segment = Segment::new(self.start, self.end, "");
                segment.translated = Some(String::new());
                segment
            }
            lines => Segment::new(self.start, self.end, lines.join(" ")),
        }
    }
}

/// Parse SRT content into cues.
pub fn parse_srt(content: &str) -> Result<Vec<Cue>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut cues = Vec::new();
    let mut lines = content.lines().map(|line| line.trim_end_matches('\r')).peekable();

    loop {
        while lines.peek().is_some_and(|line| line.trim().is_empty()) {
            lines.next();
        }
        let Some(index_line) = lines.next() else {
            break;
        };

        let index: usize = index_line.trim().parse().map_err(|_| {
            VidsubError::Subtitle(format!("Expected cue index, found '{}'", index_line))
        })?;

        let timing = lines
            .next()
            .ok_or_else(|| VidsubError::Subtitle(format!("Cue {} has no time range", index)))?;
        let (start, end) = timing.split_once("-->").ok_or_else(|| {
            VidsubError::Subtitle(format!("Cue {} has invalid time range '{}'", index, timing))
        })?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|line| !line.trim().is_empty()) {
            text_lines.push(line.to_string());
        }

        cues.push(Cue {
            index,
            start: parse_srt_time(start)?,
            end: parse_srt_time(end)?,
            lines: text_lines,
        });
    }

    Ok(cues)
}

/// Read segments back from an SRT file
pub async fn read_srt<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>> {
    let content = fs::read_to_string(path.as_ref()).await?;
    Ok(parse_srt(&content)?.iter().map(Cue::to_segment).collect())
}
