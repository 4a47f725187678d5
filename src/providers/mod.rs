// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Provider implementations bridging the crate's internal [`crate::types`]
//! data model to external LLM vendor wire formats.
//!
//! - [`gemini::GeminiProvider`] - the documented default
//! - [`anthropic::AnthropicProvider`] - Claude models via the Messages API
//! - [`openai::OpenAiProvider`] - GPT models via Chat Completions
//!
//! Each provider is a thin `reqwest`-based client; schema translation is
//! shared via [`schema::translate_schema`] since all three vendors accept
//! the same JSON-Schema-subset vocabulary the agent's tool definitions use.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod schema;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::error::ProviderError;
use crate::types::{BoxedProvider, ProviderConfig};

/// Supported provider backends, selected via `LLM_PROVIDER`/`--provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    Anthropic,
    OpenAi,
}

impl ProviderType {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-pro",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// The environment variable this provider's API key is read from.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProviderTypeError;

impl std::fmt::Display for ParseProviderTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid provider type")
    }
}

impl std::error::Error for ParseProviderTypeError {}

impl std::str::FromStr for ProviderType {
    type Err = ParseProviderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "gpt" => Ok(Self::OpenAi),
            _ => Err(ParseProviderTypeError),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "Gemini"),
            Self::Anthropic => write!(f, "Anthropic"),
            Self::OpenAi => write!(f, "OpenAI"),
        }
    }
}

/// Construct a provider instance from an explicit type and configuration.
pub fn create_provider(
    provider_type: ProviderType,
    config: ProviderConfig,
) -> Result<BoxedProvider, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "{} requires {}",
            provider_type,
            provider_type.api_key_env_var()
        ))
    })?;
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| provider_type.default_model().to_string());
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| provider_type.default_base_url().to_string());

    Ok(match provider_type {
        ProviderType::Gemini => Box::new(GeminiProvider::new(api_key, model, base_url)),
        ProviderType::Anthropic => Box::new(AnthropicProvider::new(api_key, model, base_url)),
        ProviderType::OpenAi => Box::new(OpenAiProvider::new(api_key, model, base_url)),
    })
}

/// Resolve provider and model from `LLM_PROVIDER`/`LLM_MODEL`, defaulting to
/// Gemini, then construct it from the matching API key environment variable.
pub fn create_provider_from_env() -> Result<BoxedProvider, ProviderError> {
    let provider_type: ProviderType = std::env::var("LLM_PROVIDER")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(ProviderType::Gemini);

    let api_key = std::env::var(provider_type.api_key_env_var()).ok();
    let model = std::env::var("LLM_MODEL").ok();

    let config = ProviderConfig {
        api_key,
        model,
        base_url: None,
    };

    create_provider(provider_type, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_type_from_str_accepts_aliases() {
        assert_eq!("gemini".parse::<ProviderType>(), Ok(ProviderType::Gemini));
        assert_eq!("claude".parse::<ProviderType>(), Ok(ProviderType::Anthropic));
        assert_eq!("GPT".parse::<ProviderType>(), Ok(ProviderType::OpenAi));
        assert!("invalid".parse::<ProviderType>().is_err());
    }

    #[test]
    fn default_model_is_gemini_2_5_pro() {
        assert_eq!(ProviderType::Gemini.default_model(), "gemini-2.5-pro");
    }

    #[test]
    fn create_provider_requires_api_key() {
        let config = ProviderConfig::default();
        let result = create_provider(ProviderType::Gemini, config);
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn create_provider_succeeds_with_api_key() {
        let config = ProviderConfig::new("test-key", "gemini-2.5-pro");
        let provider = create_provider(ProviderType::Gemini, config).unwrap();
        assert_eq!(provider.name(), "Gemini");
        assert_eq!(provider.model(), "gemini-2.5-pro");
    }
}
