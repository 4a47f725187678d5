// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Environment-variable configuration resolution. Deliberately not a
//! dotenv/TOML-file loader; that surface is out of scope.

use crate::error::{AgentError, Result};
use crate::providers::ProviderType;

/// A provider API key containing this substring (either case) is treated
/// as an unfilled placeholder, not a real credential.
const PLACEHOLDER_MARKERS: [&str; 2] = ["your_", "YOUR_"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider_type: ProviderType,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub debug_prompts: bool,
}

impl AppConfig {
    /// Resolve from `LLM_PROVIDER`, `LLM_MODEL`, the provider's API key
    /// variable, and `DEBUG_PROMPTS`.
    pub fn from_env() -> Self {
        let provider_type = std::env::var("LLM_PROVIDER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(ProviderType::Gemini);

        let api_key = std::env::var(provider_type.api_key_env_var())
            .ok()
            .filter(|key| !is_placeholder(key));

        let model = std::env::var("LLM_MODEL").ok();
        let debug_prompts = std::env::var("DEBUG_PROMPTS").as_deref() == Ok("1");

        Self {
            provider_type,
            model,
            api_key,
            debug_prompts,
        }
    }

    /// A missing or placeholder API key is a fatal startup condition.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(AgentError::config(format!(
                "{} requires {} to be set to a real API key",
                self.provider_type,
                self.provider_type.api_key_env_var()
            )));
        }
        Ok(())
    }

    pub fn model_or_default(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider_type.default_model().to_string())
    }
}

fn is_placeholder(key: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| key.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_keys_are_detected() {
        assert!(is_placeholder("your_api_key_here"));
        assert!(is_placeholder("sk-YOUR_KEY"));
        assert!(!is_placeholder("sk-ant-real-looking-key"));
    }

    #[test]
    fn validate_fails_without_api_key() {
        let config = AppConfig {
            provider_type: ProviderType::Gemini,
            model: None,
            api_key: None,
            debug_prompts: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_passes_with_api_key() {
        let config = AppConfig {
            provider_type: ProviderType::Gemini,
            model: None,
            api_key: Some("real-key".to_string()),
            debug_prompts: false,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn model_or_default_falls_back_to_provider_default() {
        let config = AppConfig {
            provider_type: ProviderType::Gemini,
            model: None,
            api_key: Some("k".to_string()),
            debug_prompts: false,
        };
        assert_eq!(config.model_or_default(), "gemini-2.5-pro");
    }
}
