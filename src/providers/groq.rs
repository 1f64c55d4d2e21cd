//! Groq API provider.
//!
//! Groq exposes an OpenAI-compatible chat completions endpoint, so the wire
//! types mirror the OpenAI provider with a different URL and model family.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{FixRequest, Provider, ProviderError, ProviderType};

/// Groq API endpoint (OpenAI-compatible)
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// System prompt for fix suggestions
const SYSTEM_PROMPT: &str = r#"You are a helpful AI programming assistant.
When given an error from a program's output, provide:

1. A brief explanation of what caused the error
2. A concrete, minimal fix

Be concise and practical. Focus on the most likely cause and solution."#;

/// Groq provider
pub struct GroqProvider {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Model to use
    model: String,
    /// Maximum tokens to generate
    max_tokens: u32,
}

impl GroqProvider {
    /// Create a new Groq provider
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
impl Provider for GroqProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Groq
    }

    fn name(&self) -> &'static str {
        "Groq"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn request_fix(&self, request: &FixRequest) -> Result<String> {
        let body = self.build_request(&request.format_prompt());

        let response = self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::NetworkError(err.to_string()))
            .context("Failed to send request to Groq API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                bail!(ProviderError::RateLimited {
                    provider: "Groq".to_string()
                });
            }
            bail!(ProviderError::ApiError {
                provider: "Groq".to_string(),
                message: format!("HTTP {}: {}", status, error_body),
            });
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse Groq response")?;

        let content = response_body
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.map(|m| m.content))
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            bail!(ProviderError::InvalidResponse {
                provider: "Groq".to_string(),
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
