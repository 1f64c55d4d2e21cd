//! Google Gemini API provider.
//!
//! This provider uses the Gemini `generateContent` API, which has its own
//! request shape (content parts rather than chat messages) and authenticates
//! with a key query parameter instead of a bearer header.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{FixRequest, Provider, ProviderError, ProviderType};

/// Gemini API base; the model name and key are interpolated per request
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Instruction prepended to every prompt
const SYSTEM_PROMPT: &str = r#"You are a helpful AI programming assistant.
When given an error from a program's output, provide:

1. A brief explanation of what caused the error
2. A concrete, minimal fix

Be concise and practical. Focus on the most likely cause and solution."#;

/// Gemini provider
pub struct GeminiProvider {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Model to use
    model: String,
    /// Maximum tokens to generate
    max_tokens: u32,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        )
    }

    /// Build the request body
    fn build_request(&self, content: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{SYSTEM_PROMPT}\n\n{content}"),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn name(&self) -> &'static str {
        "Google Gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn request_fix(&self, request: &FixRequest) -> Result<String> {
        let body = self.build_request(&request.format_prompt());

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::NetworkError(err.to_string()))
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                bail!(ProviderError::RateLimited {
                    provider: "Gemini".to_string()
                });
            }
            bail!(ProviderError::ApiError {
                provider: "Gemini".to_string(),
                message: format!("HTTP {}: {}", status, error_body),
            });
        }

        let response_body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let content = response_body
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            bail!(ProviderError::InvalidResponse {
                provider: "Gemini".to_string(),
                message: "response contained no candidates".to_string(),
            });
        }

        Ok(content)
    }
}

// API types

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
