//! Retrying LLM/HTTP client.
//!
//! Every outbound request is retried up to `max_retries` times with
//! exponential backoff capped at `max_delay_ms`, under a per-request
//! timeout. Exhausting the retries raises the last error to the caller;
//! batch-level degradation is handled one layer up (see
//! [`super::translate`]).

use std::time::Duration;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no API key in environment variable {0}")]
    MissingApiKey(String),
}

/// Delay before retry attempt `attempt` (0-indexed):
/// `min(base_delay * factor^attempt, max_delay)`.
pub fn backoff_delay(attempt: u32, base_delay_ms: u64, factor: f64, max_delay_ms: u64) -> Duration {
    let raw = base_delay_ms as f64 * factor.powi(attempt as i32);
    Duration::from_millis(raw.min(max_delay_ms as f64) as u64)
}

/// Chat-completions client for identifier generation and batch translation.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Propose identifier semantic parts for a batch of texts.
    ///
    /// The response must be a JSON object with an `id_list` array; a
    /// missing field or wrong shape is a hard error for the request
    /// (subject to retry).
    pub async fn generate_ids(&self, texts: &[String]) -> Result<Vec<String>, LlmError> {
        let system = "You generate short snake_case English identifiers for UI strings. \
                      Reply with a JSON object: {\"id_list\": [\"...\"]}, one identifier \
                      per input string, in order.";
        let user = serde_json::to_string(&json!({ "texts": texts }))
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let value = self.request_json(system, &user).await?;
        let list = value
            .get("id_list")
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::Malformed("response is missing id_list".to_string()))?;
        Ok(list
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.to_string())
            .collect())
    }

    /// Machine-translate one batch of entries.
    ///
    /// The request mirrors the batch's `{id: source text}` shape and the
    /// response must be a JSON object with exactly the same key set.
    pub async fn translate_batch(
        &self,
        batch: &Map<String, Value>,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<Map<String, Value>, LlmError> {
        let system = format!(
            "You translate UI strings from {} to {}. The user message is a JSON object \
             mapping identifiers to source texts. Reply with a JSON object with the same \
             keys mapping to translated texts. Preserve placeholder tokens like \
             {{name}} and {{{{name}}}} untouched.",
            source_locale, target_locale
        );
        let user = serde_json::to_string(&Value::Object(batch.clone()))
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let value = self.request_json(&system, &user).await?;
        let Value::Object(translated) = value else {
            return Err(LlmError::Malformed(
                "translation response is not a JSON object".to_string(),
            ));
        };
        for key in batch.keys() {
            if !translated.contains_key(key) {
                return Err(LlmError::Malformed(format!(
                    "translation response is missing entry key '{}'",
                    key
                )));
            }
        }
        Ok(translated)
    }

    /// One logical request: send the prompt pair, parse the completion
    /// content as JSON, retrying with backoff on any failure.
    async fn request_json(&self, system: &str, user: &str) -> Result<Value, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.config.api_key_env.clone()))?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
        });

        let mut last_error = LlmError::Malformed("no attempts made".to_string());
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(
                    attempt - 1,
                    self.config.base_delay_ms,
                    self.config.backoff_factor,
                    self.config.max_delay_ms,
                );
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying LLM request");
                sleep(delay).await;
            }

            match self.request_once(api_key, &body).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(attempt, error = %err, "LLM request attempt failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    async fn request_once(&self, api_key: &str, body: &Value) -> Result<Value, LlmError> {
        let request = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send();

        // Per-request timeout doubles as the cancellation token: an
        // expired request is dropped without affecting sibling requests.
        let response = timeout(Duration::from_millis(self.config.request_timeout_ms), request)
            .await
            .map_err(|_| LlmError::Timeout(self.config.request_timeout_ms))??;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let envelope: Value = response.json().await?;
        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                LlmError::Malformed("completion envelope has no message content".to_string())
            })?;
        serde_json::from_str(content)
            .map_err(|e| LlmError::Malformed(format!("content is not valid JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_formula() {
        // delay(k) = min(base * factor^k, max)
        assert_eq!(backoff_delay(0, 500, 2.0, 8_000), Duration::from_millis(500));
        assert_eq!(backoff_delay(1, 500, 2.0, 8_000), Duration::from_millis(1_000));
        assert_eq!(backoff_delay(2, 500, 2.0, 8_000), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(3, 500, 2.0, 8_000), Duration::from_millis(4_000));
        assert_eq!(backoff_delay(4, 500, 2.0, 8_000), Duration::from_millis(8_000));
        // Capped from here on.
        assert_eq!(backoff_delay(10, 500, 2.0, 8_000), Duration::from_millis(8_000));
    }

    #[test]
    fn test_backoff_factor_one_is_constant() {
        for attempt in 0..5 {
            assert_eq!(backoff_delay(attempt, 250, 1.0, 8_000), Duration::from_millis(250));
        }
    }

    #[test]
    fn test_missing_api_key_detected() {
        let config = LlmConfig {
            api_key_env: "AUTOGLOT_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            ..Default::default()
        };
        let client = LlmClient::new(config);
        assert!(!client.has_api_key());
    }
}
