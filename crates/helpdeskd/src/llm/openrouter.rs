//! OpenRouter adapter. Same chat-completions wire shape as OpenAI,
//! different host, plus the attribution headers OpenRouter asks for.

use crate::config::LlmConfig;
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use helpdesk_common::HelpdeskError;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-8b-instruct:free";

#[derive(Debug)]
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenRouterProvider {
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
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
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
            .header("HTTP-Referer", "IT-Support-Agent")
            .header("X-Title", "IT Support Agent")
            .json(&body)
            .send()
            .await
            .map_err(|e| HelpdeskError::Provider(format!("openrouter request: {}", e)))?;

        if !response.status().is_success() {
            return Err(HelpdeskError::Provider(format!(
                "openrouter returned {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HelpdeskError::Provider(format!("openrouter body: {}", e)))?;

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
                "openrouter returned an empty completion".into(),
            ));
        }

        Ok(text)
    }
}
