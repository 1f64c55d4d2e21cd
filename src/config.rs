//! Configuration and credential resolution.
//!
//! Credentials resolve in a fixed order: explicit CLI flags, then the
//! provider's environment variable, then the config file, then an interactive
//! prompt. Resolution happens lazily, on the first confirmed fix request, so
//! a missing API key never blocks plain monitoring.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::providers::{api_key_env_var, api_key_from_env, ProviderType};

/// No usable credentials could be resolved
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "no usable credentials. Pass --provider and --api-key, set {0}, or add them to the config file."
    )]
    NoCredentials(&'static str),

    #[error("API key cannot be empty")]
    EmptyKey,

    #[error("could not read provider selection: {0}")]
    Prompt(String),
}

/// Stored credentials section of the config file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub provider: Option<ProviderType>,
    pub api_key: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Load config from the default path, falling back to defaults
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| toml::from_str(&contents).ok())
            .unwrap_or_default()
    }

    /// Get the config file path (~/.config/watchit/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("watchit").join("config.toml"))
    }

    /// Write the config to the default path, creating directories as needed
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        std::fs::write(path, contents)
    }
}

/// Credentials as given on the command line (either field may be absent)
#[derive(Debug, Clone, Default)]
pub struct CredentialSpec {
    pub provider: Option<ProviderType>,
    pub api_key: Option<String>,
}

/// Fully resolved credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub provider: ProviderType,
    pub api_key: String,
}

/// Non-interactive part of the resolution order: flags, then environment,
/// then config file. Returns None when only the interactive prompt remains.
pub fn resolve_from<F>(spec: &CredentialSpec, env: F, config: &Config) -> Option<Credentials>
where
    F: Fn(ProviderType) -> Option<String>,
{
    // Explicit flags win outright
    if let (Some(provider), Some(api_key)) = (spec.provider, spec.api_key.clone()) {
        return Some(Credentials { provider, api_key });
    }

    // Provider pinned by flag: find its key in the environment or the file
    if let Some(provider) = spec.provider {
        if let Some(api_key) = env(provider) {
            return Some(Credentials { provider, api_key });
        }
        if config.credentials.provider == Some(provider) {
            if let Some(api_key) = config.credentials.api_key.clone() {
                return Some(Credentials { provider, api_key });
            }
        }
        return None;
    }

    // No provider chosen: first environment key wins, in a fixed order
    for provider in [ProviderType::OpenAI, ProviderType::Gemini, ProviderType::Groq] {
        if let Some(api_key) = env(provider) {
            return Some(Credentials { provider, api_key });
        }
    }

    // Finally the config file, if it carries both halves
    if let (Some(provider), Some(api_key)) = (
        config.credentials.provider,
        config.credentials.api_key.clone(),
    ) {
        return Some(Credentials { provider, api_key });
    }

    None
}

/// Resolve credentials, prompting interactively as the last resort.
///
/// Interactively entered credentials are saved back to the config file so the
/// next run does not prompt again.
pub fn resolve_credentials(spec: &CredentialSpec) -> Result<Credentials, ConfigError> {
    let config = Config::load();

    if let Some(credentials) = resolve_from(spec, api_key_from_env, &config) {
        return Ok(credentials);
    }

    let credentials = prompt_for_credentials(spec.provider)?;

    let updated = Config {
        credentials: CredentialsConfig {
            provider: Some(credentials.provider),
            api_key: Some(credentials.api_key.clone()),
        },
    };
    // A failed save only means prompting again next run
    updated.save().ok();

    Ok(credentials)
}

fn prompt_for_credentials(
    preselected: Option<ProviderType>,
) -> Result<Credentials, ConfigError> {
    let provider = match preselected {
        Some(provider) => provider,
        None => prompt_for_provider()?,
    };

    let api_key = rpassword::prompt_password(format!("Enter your {provider} API key: "))
        .map_err(|err| ConfigError::Prompt(err.to_string()))?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(ConfigError::EmptyKey);
    }

    Ok(Credentials { provider, api_key })
}

fn prompt_for_provider() -> Result<ProviderType, ConfigError> {
    eprintln!();
    eprintln!("Select your AI provider:");
    eprintln!("  1. OpenAI");
    eprintln!("  2. Google Gemini");
    eprintln!("  3. Groq");
    eprint!("Enter your choice (1-3) [1]: ");
    std::io::stderr().flush().ok();

    let mut buf = String::new();
    match std::io::stdin().lock().read_line(&mut buf) {
        Ok(0) => Err(ConfigError::NoCredentials(api_key_env_var(
            ProviderType::OpenAI,
        ))),
        Ok(_) => match buf.trim() {
            "" | "1" => Ok(ProviderType::OpenAI),
            "2" => Ok(ProviderType::Gemini),
            "3" => Ok(ProviderType::Groq),
            other => Err(ConfigError::Prompt(format!("invalid choice: {other}"))),
        },
        Err(err) => Err(ConfigError::Prompt(err.to_string())),
    }
}
