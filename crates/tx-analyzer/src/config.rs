// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! OpenAI client configuration

use url::Url;

use crate::error::{AnalyzerError, AnalyzerResult};

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for OpenAI chat completions
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// OpenAI API key
    pub api_key: String,
    /// Base URL for OpenAI API (defaults to official API)
    pub base_url: Option<Url>,
    /// Seconds to wait for the response headers
    pub timeout_seconds: u64,
    /// Chat model
    pub model: String,
    /// Maximum number of tokens in the response
    pub max_tokens: Option<u32>,
    /// Temperature for response generation
    pub temperature: Option<f32>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            timeout_seconds: 30,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(1_024),
            temperature: Some(0.3),
        }
    }
}

impl OpenAiConfig {
    /// Create a new OpenAI configuration
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            ..Default::default()
        }
    }

    /// Set the base URL for the OpenAI API
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the chat model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the response header timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the maximum tokens for responses
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for response generation
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Validate the OpenAI configuration
    pub fn validate(&self) -> AnalyzerResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AnalyzerError::config("OpenAI API key cannot be empty"));
        }

        if self.model.trim().is_empty() {
            return Err(AnalyzerError::config("OpenAI model cannot be empty"));
        }

        if self.timeout_seconds == 0 {
            return Err(AnalyzerError::config("Timeout must be greater than 0"));
        }

        if let Some(max_tokens) = self.max_tokens
            && max_tokens == 0
        {
            return Err(AnalyzerError::config("Max tokens must be greater than 0"));
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(AnalyzerError::config(
                "Temperature must be between 0.0 and 2.0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(OpenAiConfig::new("sk-test".to_string()).validate().is_ok());
        assert!(OpenAiConfig::default().validate().is_err());
        assert!(
            OpenAiConfig::new("sk-test".to_string())
                .with_timeout(0)
                .validate()
                .is_err()
        );
        assert!(
            OpenAiConfig::new("sk-test".to_string())
                .with_temperature(2.5)
                .validate()
                .is_err()
        );
        assert!(
            OpenAiConfig::new("sk-test".to_string())
                .with_model(" ")
                .validate()
                .is_err()
        );
    }
}
