use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::AiError;

pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Token counts reported by the provider for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Something that turns a system + user prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model(&self) -> &str;

    fn enabled(&self) -> bool;

    /// # Errors
    ///
    /// Returns `AiError` when the generator is disabled, the request fails, or
    /// the reply carries no text.
    async fn generate(&self, system: &str, prompt: &str) -> Result<Generation, AiError>;
}

/// Settings for an OpenAI-compatible chat completions endpoint.
#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    /// No key means AI features are disabled.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.into(),
            api_key: None,
            model: DEFAULT_AI_MODEL.into(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AiConfig {
    fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    config: AiConfig,
}

impl ChatCompletionsClient {
    /// # Errors
    ///
    /// Returns `AiError::Http` if the HTTP client cannot be built.
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn enabled(&self) -> bool {
        self.config.key().is_some()
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<Generation, AiError> {
        let api_key = self.config.key().ok_or(AiError::Disabled)?;

        let mut messages = Vec::with_capacity(2);
        if !system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        let payload = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "sending chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "chat completion rejected");
            return Err(AiError::HttpStatus(status));
        }

        let body: ChatResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(Generation {
            text,
            usage: body.usage,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_without_key_is_disabled() {
        let client = ChatCompletionsClient::new(AiConfig::default()).unwrap();
        assert!(!client.enabled());

        let blank = ChatCompletionsClient::new(AiConfig {
            api_key: Some("   ".into()),
            ..AiConfig::default()
        })
        .unwrap();
        assert!(!blank.enabled());
    }

    #[tokio::test]
    async fn disabled_client_refuses_to_generate() {
        let client = ChatCompletionsClient::new(AiConfig::default()).unwrap();
        assert!(matches!(
            client.generate("system", "prompt").await,
            Err(AiError::Disabled)
        ));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let client = ChatCompletionsClient::new(AiConfig {
            base_url: "http://localhost:8080/v1/".into(),
            ..AiConfig::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn parses_usage_when_present() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":" Plan "}}],
                "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#,
        )
        .unwrap();
        assert_eq!(body.usage.unwrap().total_tokens, 15);
        assert_eq!(body.choices[0].message.content.as_deref(), Some(" Plan "));

        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(body.usage.is_none());
    }
}
