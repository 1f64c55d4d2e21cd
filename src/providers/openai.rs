//! OpenAI API provider.
//!
//! This provider uses the OpenAI Chat Completions API for fix suggestions.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{FixRequest, Provider, ProviderError, ProviderType};

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// System prompt for fix suggestions
const SYSTEM_PROMPT: &str = r#"You are a helpful AI programming assistant.
When given an error from a program's output, provide:

1. A brief explanation of what caused the error
2. A concrete, minimal fix

Be concise and practical. Focus on the most likely cause and solution."#;

/// OpenAI provider
pub struct OpenAIProvider {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Model to use
    model: String,
    /// Maximum tokens to generate
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            max_tokens,
        }
    }

    /// Build the request body
    fn build_request(&self, content: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            max_tokens: Some(self.max_tokens),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: content.to_string(),
                },
            ],
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAI
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn request_fix(&self, request: &FixRequest) -> Result<String> {
        let body = self.build_request(&request.format_prompt());

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::NetworkError(err.to_string()))
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                bail!(ProviderError::RateLimited {
                    provider: "OpenAI".to_string()
                });
            }
            bail!(ProviderError::ApiError {
                provider: "OpenAI".to_string(),
                message: format!("HTTP {}: {}", status, error_body),
            });
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = response_body
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.map(|m| m.content))
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            bail!(ProviderError::InvalidResponse {
                provider: "OpenAI".to_string(),
                message: "response contained no choices".to_string(),
            });
        }

        Ok(content)
    }
}

// API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Language;

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAIProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), 1024);
        assert_eq!(provider.provider_type(), ProviderType::OpenAI);
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_build_request_includes_system_prompt() {
        let provider = OpenAIProvider::new("test-key".to_string(), "gpt-4o-mini".to_string(), 1024);
        let request = FixRequest {
            language: Language::Python,
            error_line: "KeyError: 'c'".to_string(),
            context_lines: Vec::new(),
        };
        let body = provider.build_request(&request.format_prompt());
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert!(body.messages[1].content.contains("KeyError"));
    }
}
