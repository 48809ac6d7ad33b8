//! OpenAI chat completions adapter.

use crate::config::LlmConfig;
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use helpdesk_common::HelpdeskError;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(cfg: &LlmConfig, api_key: String) -> Result<Self, HelpdeskError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| HelpdeskError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: cfg.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: cfg.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, HelpdeskError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.max_tokens,
            "temperature": 0.3
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| HelpdeskError::Provider(format!("openai request: {}", e)))?;

        if !response.status().is_success() {
            return Err(HelpdeskError::Provider(format!(
                "openai returned {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HelpdeskError::Provider(format!("openai body: {}", e)))?;

        let text = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(HelpdeskError::Provider(
                "openai returned an empty completion".into(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_config() {
        let cfg = LlmConfig::default();
        let provider = OpenAiProvider::new(&cfg, "sk-test".into()).unwrap();
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.max_tokens, 1000);
    }

    #[test]
    fn test_config_overrides_model_and_base() {
        let cfg = LlmConfig {
            model: Some("gpt-4o".into()),
            base_url: Some("http://localhost:9999/v1".into()),
            ..Default::default()
        };
        let provider = OpenAiProvider::new(&cfg, "sk-test".into()).unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
        assert_eq!(provider.model, "gpt-4o");
    }
}
