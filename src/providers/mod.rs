//! AI provider abstraction for fix suggestions.
//!
//! This module provides a unified interface over the external APIs that can
//! turn a captured error context into a suggested fix (OpenAI, Google Gemini,
//! Groq). One provider is selected at credential-resolution time; the monitor
//! only ever talks to the [`Provider`] trait.

pub mod gemini;
pub mod groq;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::patterns::Language;

/// Maximum tokens requested from any provider
const MAX_TOKENS: u32 = 1024;

/// Available AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI chat completions API
    #[default]
    OpenAI,
    /// Google Gemini generateContent API
    Gemini,
    /// Groq (OpenAI-compatible endpoint)
    Groq,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Gemini => write!(f, "gemini"),
            ProviderType::Groq => write!(f, "groq"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "gemini" => Ok(ProviderType::Gemini),
            "groq" => Ok(ProviderType::Groq),
            _ => Err(format!(
                "Unknown provider: {}. Valid options: openai, gemini, groq",
                s
            )),
        }
    }
}

/// What the dispatcher hands a provider: the matched line plus its context
#[derive(Debug, Clone)]
pub struct FixRequest {
    /// Language the matching signature is attributed to
    pub language: Language,
    /// The line that fired the match
    pub error_line: String,
    /// Lines preceding the error, oldest first
    pub context_lines: Vec<String>,
}

impl FixRequest {
    /// Compose the user-facing prompt body
    pub fn format_prompt(&self) -> String {
        let mut prompt = format!(
            "Help debug the following {} error:\n\nError line:\n{}",
            self.language, self.error_line
        );
        if !self.context_lines.is_empty() {
            prompt.push_str(&format!(
                "\n\nOutput preceding the error:\n{}",
                self.context_lines.join("\n")
            ));
        }
        prompt.push_str(
            "\n\nPlease provide:\n1. A brief explanation of what caused the error\n2. A concrete fix",
        );
        prompt
    }
}

/// Provider trait for AI-powered fix suggestions
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> ProviderType;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Get the current model identifier
    fn model_name(&self) -> &str;

    /// Request a suggested fix for a detected error.
    ///
    /// One request per call; the dispatcher never retries.
    async fn request_fix(&self, request: &FixRequest) -> Result<String>;
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured for {provider}. Set {env_var} or pass --api-key.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("API error from {provider}: {message}")]
    ApiError { provider: String, message: String },

    #[error("Rate limited by {provider}. Please wait and try again.")]
    RateLimited { provider: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

/// Get the environment variable name holding a provider's API key
pub fn api_key_env_var(provider: ProviderType) -> &'static str {
    match provider {
        ProviderType::OpenAI => "OPENAI_API_KEY",
        ProviderType::Gemini => "GEMINI_API_KEY",
        ProviderType::Groq => "GROQ_API_KEY",
    }
}

/// Get a provider's API key from the environment
pub fn api_key_from_env(provider: ProviderType) -> Option<String> {
    std::env::var(api_key_env_var(provider))
        .ok()
        .filter(|s| !s.is_empty())
}

/// Build a client for the selected provider with its default model
pub fn create_provider(provider: ProviderType, api_key: String) -> Box<dyn Provider> {
    match provider {
        ProviderType::OpenAI => Box::new(openai::OpenAIProvider::new(
            api_key,
            "gpt-4o-mini".to_string(),
            MAX_TOKENS,
        )),
        ProviderType::Gemini => Box::new(gemini::GeminiProvider::new(
            api_key,
            "gemini-1.5-flash".to_string(),
            MAX_TOKENS,
        )),
        ProviderType::Groq => Box::new(groq::GroqProvider::new(
            api_key,
            "llama-3.1-8b-instant".to_string(),
            MAX_TOKENS,
        )),
    }
}
