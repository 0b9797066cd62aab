use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{Translator, http_client};
use crate::config::TranslateConfig;
use crate::error::{Result, VidsubError};

/// Google translate over the public `translate_a/single` endpoint
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

/// Join the translated sentence fragments of a `translate_a/single` reply.
///
/// The reply is a nested array whose first element lists
/// `[translated, original, ...]` pairs, one per sentence.
pub fn parse_response(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| VidsubError::Translation("Malformed translate response".to_string()))?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(VidsubError::Translation("Empty translation received".to_string()));
    }

    Ok(translated.trim().to_string())
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| VidsubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VidsubError::Translation(format!(
                "Translate API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VidsubError::Translation(format!("Failed to parse response: {}", e)))?;

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_joins_sentences() {
        let body = json!([
            [["你好。", "Hello.", null, null, 10], ["你好吗？", "How are you?", null, null, 10]],
            null,
            "en"
        ]);
        assert_eq!(parse_response(&body).unwrap(), "你好。你好吗？");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_response(&json!({"error": "quota"})).is_err());
        assert!(parse_response(&json!([[]])).is_err());
        assert!(parse_response(&json!([[[null, "Hello"]]])).is_err());
    }
}
