//! OpenAI-compatible narrative provider.
//!
//! Works against any chat-completions endpoint that speaks the OpenAI
//! wire format (the OpenAI API itself or a proxy in front of it); the
//! base URL is configurable for proxied deployments.

use super::NarrativeProvider;
use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Default chat-completions endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for narrative generation.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default temperature (low, narratives should stay close to the digest).
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default max tokens for the narrative.
const DEFAULT_MAX_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = "You are a data analyst. Given a digest of an exploratory \
analysis, write a short narrative highlighting notable statistics, missing data and \
structure. Refer to the listed chart files where relevant. Plain Markdown, no headings.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// The model to use.
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL for the API (useful for proxies).
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Narrative provider for OpenAI-compatible chat-completions endpoints.
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
    api_key: String,
}

impl OpenAiProvider {
    /// Create a provider with default configuration.
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_config(api_key, OpenAiConfig::default())
    }

    /// Create a provider with custom configuration.
    pub fn with_config(api_key: String, config: OpenAiConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("API key is empty"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn build_request(&self, digest: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: digest.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

impl NarrativeProvider for OpenAiProvider {
    fn narrate(&self, digest: &str) -> Result<String> {
        let request = self.build_request(digest);

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("Narrative request failed with {}: {}", status, body);
            return Err(anyhow!("narrative request failed with status {}", status));
        }

        let parsed: ChatResponse = response.json()?;
        let content = parsed
            .choices
            .and_then(|mut choices| choices.pop())
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .ok_or_else(|| anyhow!("narrative response contained no choices"))?;

        if content.trim().is_empty() {
            return Err(anyhow!("narrative response was empty"));
        }
        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.base_url.contains("chat/completions"));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(OpenAiProvider::new("  ".to_string()).is_err());
    }

    #[test]
    fn test_request_shape() {
        let provider = OpenAiProvider::new("key".to_string()).unwrap();
        let request = provider.build_request("Dataset: 3 rows, 1 columns.");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert!(request.messages[1].content.contains("3 rows"));

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\""));
        assert!(json.contains("\"max_tokens\""));
    }

    #[test]
    fn test_provider_identity() {
        let provider = OpenAiProvider::new("key".to_string()).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), Some(DEFAULT_MODEL));
    }
}
