use std::sync::Arc;
use tracing::warn;

use super::Translator;
use crate::cancel::CancelToken;
use crate::error::{Result, VidsubError};
use crate::events::EventSender;
use crate::segment::Segment;

/// How many segments pass between progress log lines
const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub translated: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Maps every transcribed segment through a [`Translator`].
///
/// A segment whose translation fails keeps its original text as the
/// translation, so one bad request never fails the file.
pub struct SegmentTranslator {
    translator: Arc<dyn Translator>,
    source_language: String,
    target_language: String,
}

impl SegmentTranslator {
    pub fn new(
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            translator,
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// Fill `translated` on every segment in place. Only cancellation errors.
    pub async fn translate_segments(
        &self,
        segments: &mut [Segment],
        events: &EventSender,
        cancel: &CancelToken,
    ) -> Result<TranslationStats> {
        let total = segments.len();
        let mut stats = TranslationStats::default();
        events.log("Translating subtitles...");

        for (i, segment) in segments.iter_mut().enumerate() {
            cancel.check()?;

            if segment.is_blank() {
                segment.translated = Some(String::new());
                stats.skipped += 1;
            } else {
                let reply = self
                    .translator
                    .translate(&segment.text, &self.source_language, &self.target_language)
                    .await
                    .and_then(|text| {
                        if text.trim().is_empty() {
                            Err(VidsubError::Translation("Empty translation received".to_string()))
                        } else {
                            Ok(text.trim().to_string())
                        }
                    });

                match reply {
                    Ok(text) => {
                        segment.translated = Some(text);
                        stats.translated += 1;
                    }
                    Err(e) => {
                        warn!("Translation failed for segment {}: {}", i + 1, e);
                        events.log(format!("Translation failed: {}", e));
                        segment.translated = Some(segment.text.clone());
                        stats.failed += 1;
                    }
                }
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                events.log(format!("Translation progress: {}/{}", i + 1, total));
            }
        }

        events.log("Translation done");
        Ok(stats)
    }
}
