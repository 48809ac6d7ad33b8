//! Google Gemini adapter. The wire shape differs from the other two:
//! the key travels as a query parameter and the reply sits under
//! candidates[0].content.parts[0].text.

use crate::config::LlmConfig;
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use helpdesk_common::HelpdeskError;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl GeminiProvider {
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, HelpdeskError> {
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "maxOutputTokens": self.max_tokens,
                "temperature": 0.3
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| HelpdeskError::Provider(format!("gemini request: {}", e)))?;

        if !response.status().is_success() {
            return Err(HelpdeskError::Provider(format!(
                "gemini returned {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HelpdeskError::Provider(format!("gemini body: {}", e)))?;

        let text = json
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(HelpdeskError::Provider(
                "gemini returned an empty completion".into(),
            ));
        }

        Ok(text)
    }
}
