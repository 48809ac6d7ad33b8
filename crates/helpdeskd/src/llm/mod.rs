//! LLM provider abstraction.
//!
//! Production code talks to one hosted completion API chosen at startup
//! from config. Test code uses `FakeProvider` with a canned reply, so
//! the assistant pipeline never needs the network.

use crate::config::LlmConfig;
use async_trait::async_trait;
use helpdesk_common::HelpdeskError;
use std::sync::{Arc, Mutex};
use tracing::info;

pub mod gemini;
pub mod openai;
pub mod openrouter;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;

/// Minimal interface the assistant needs: send one prompt, get one
/// completion back.
#[async_trait]
pub trait CompletionProvider: Send + Sync + std::fmt::Debug {
    /// Short provider label for logs and health output.
    fn name(&self) -> &str;

    /// Run a single completion. Implementations map every transport or
    /// payload problem to `HelpdeskError::Provider`.
    async fn complete(&self, prompt: &str) -> Result<String, HelpdeskError>;
}

/// Environment variable holding the API key for a provider name.
fn key_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        _ => None,
    }
}

/// Construct the configured provider. Called once at startup; an
/// unknown provider name or a missing API key is a configuration error
/// and the daemon must not start.
pub fn build_provider(cfg: &LlmConfig) -> Result<Arc<dyn CompletionProvider>, HelpdeskError> {
    let env_var = key_env_var(&cfg.provider).ok_or_else(|| {
        HelpdeskError::Configuration(format!(
            "unknown LLM provider '{}' (expected openai, openrouter, or gemini)",
            cfg.provider
        ))
    })?;

    let api_key = std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            HelpdeskError::Configuration(format!(
                "{} is not set; provider '{}' needs it",
                env_var, cfg.provider
            ))
        })?;

    let provider: Arc<dyn CompletionProvider> = match cfg.provider.as_str() {
        "openai" => Arc::new(OpenAiProvider::new(cfg, api_key)?),
        "openrouter" => Arc::new(OpenRouterProvider::new(cfg, api_key)?),
        "gemini" => Arc::new(GeminiProvider::new(cfg, api_key)?),
        _ => unreachable!("provider name validated above"),
    };

    info!("LLM provider: {}", provider.name());
    Ok(provider)
}

// ============================================================================
// Fake Provider (Testing)
// ============================================================================

/// Deterministic provider for tests. Returns a fixed reply (or a fixed
/// failure) and records every prompt it was handed.
#[derive(Debug)]
pub struct FakeProvider {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    /// A fake that always answers with `reply`.
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A fake whose every call fails, for exercising fallback paths.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The most recent prompt, if any call happened.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, prompt: &str) -> Result<String, HelpdeskError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(HelpdeskError::Provider(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let cfg = LlmConfig {
            provider: "clippy".into(),
            ..Default::default()
        };
        let err = build_provider(&cfg).unwrap_err();
        assert!(matches!(err, HelpdeskError::Configuration(_)));
        assert!(err.to_string().contains("clippy"));
    }

    #[test]
    fn test_key_env_var_mapping() {
        assert_eq!(key_env_var("openai"), Some("OPENAI_API_KEY"));
        assert_eq!(key_env_var("openrouter"), Some("OPENROUTER_API_KEY"));
        assert_eq!(key_env_var("gemini"), Some("GEMINI_API_KEY"));
        assert_eq!(key_env_var("ollama"), None);
    }

    #[tokio::test]
    async fn test_fake_provider_records_prompts() {
        let fake = FakeProvider::with_reply("All good.");

        assert_eq!(fake.call_count(), 0);
        let reply = fake.complete("first question").await.unwrap();
        assert_eq!(reply, "All good.");
        assert_eq!(fake.call_count(), 1);
        assert_eq!(fake.last_prompt().unwrap(), "first question");
    }

    #[tokio::test]
    async fn test_fake_provider_failure_is_provider_error() {
        let fake = FakeProvider::failing("socket closed");
        let err = fake.complete("anything").await.unwrap_err();
        assert!(matches!(err, HelpdeskError::Provider(_)));
        assert_eq!(fake.call_count(), 1);
    }
}
