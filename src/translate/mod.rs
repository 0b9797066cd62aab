// Translation backends and the per-segment translation stage
//
// - Google: public translate endpoint, best effort
// - Ollama: local LLM prompted for JSON output
// - Segments: maps every transcribed segment through a backend

pub mod google;
pub mod ollama;
pub mod segments;

use async_trait::async_trait;
use std::time::Duration;

pub use segments::{SegmentTranslator, TranslationStats};
use crate::config::{TranslateConfig, TranslationProvider};
use crate::error::Result;

/// A machine translation collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` to `target` language codes
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        Ok(match config.provider {
            TranslationProvider::Google => Box::new(google::GoogleTranslator::new(config)?),
            TranslationProvider::Ollama => Box::new(ollama::OllamaTranslator::new(config)?),
        })
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()?)
}

/// Convert language code to a language name for LLM prompts
pub fn language_code_to_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" => "English".to_string(),
        "zh" | "zh-cn" | "zh-hans" => "Simplified Chinese".to_string(),
        "zh-tw" | "zh-hant" => "Traditional Chinese".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "fr" => "French".to_string(),
        "de" => "German".to_string(),
        "es" => "Spanish".to_string(),
        "ru" => "Russian".to_string(),
        "it" => "Italian".to_string(),
        "pt" => "Portuguese".to_string(),
        _ => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names() {
        assert_eq!(language_code_to_name("zh-CN"), "Simplified Chinese");
        assert_eq!(language_code_to_name("en"), "English");
        assert_eq!(language_code_to_name("xx"), "xx");
    }

    #[test]
    fn test_factory_builds_both_providers() {
        let mut config = TranslateConfig::default();
        assert!(TranslatorFactory::create_translator(config.clone()).is_ok());
        config.provider = TranslationProvider::Ollama;
        assert!(TranslatorFactory::create_translator(config).is_ok());
    }
}
