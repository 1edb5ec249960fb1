// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for transaction analysis
//!
//! Covers request validation, the transaction lookup that precedes a chat
//! completion and every failure of the streamed OpenAI exchange.

use external_apis::UpstreamError;
use thiserror::Error;

/// Result type alias for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors produced while preparing or streaming an analysis
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum AnalyzerError {
    /// No OpenAI API key is configured
    #[error("Transaction analysis is not configured")]
    NotConfigured,

    /// Invalid analyzer configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The chat request was malformed
    #[error("{message}")]
    InvalidRequest { message: String },

    /// The transaction lookup failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// OpenAI rejected the API key
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// OpenAI rate limited the request
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// OpenAI is unavailable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// OpenAI answered with another error
    #[error("OpenAI API error: {message}")]
    OpenAi { message: String },

    /// Transport failure talking to OpenAI
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// No response headers arrived in time
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// The event stream could not be decoded
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// JSON serialization failed
    #[error("JSON error: {message}")]
    Json { message: String },
}

impl AnalyzerError {
    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<T: ToString>(message: T) -> Self {
        Self::InvalidRequest {
            message: message.to_string(),
        }
    }

    /// Create an authentication error
    pub fn authentication<T: ToString>(message: T) -> Self {
        Self::Authentication {
            message: message.to_string(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit(retry_after_seconds: u64) -> Self {
        Self::RateLimitExceeded {
            retry_after_seconds,
        }
    }

    /// Create a service unavailable error
    pub fn service_unavailable<T: ToString>(message: T) -> Self {
        Self::ServiceUnavailable {
            message: message.to_string(),
        }
    }

    /// Create an OpenAI API error
    pub fn openai<T: ToString>(message: T) -> Self {
        Self::OpenAi {
            message: message.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// HTTP status this error should be reported with
    ///
    /// Lookup failures keep the upstream status; a missing API key is 503;
    /// everything on the OpenAI side is 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::Upstream(error) => error.status_code(),
            Self::NotConfigured => 503,
            Self::Configuration { .. }
            | Self::Authentication { .. }
            | Self::RateLimitExceeded { .. }
            | Self::ServiceUnavailable { .. }
            | Self::OpenAi { .. }
            | Self::Http { .. }
            | Self::Timeout { .. }
            | Self::InvalidResponse { .. }
            | Self::Json { .. } => 500,
        }
    }
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AnalyzerError::NotConfigured.status_code(), 503);
        assert_eq!(AnalyzerError::invalid_request("messages are required").status_code(), 400);
        assert_eq!(AnalyzerError::rate_limit(60).status_code(), 500);

        let upstream = UpstreamError::Status {
            status: 404,
            message: "Upstream request failed with status 404".to_string(),
            details: None,
        };
        assert_eq!(AnalyzerError::from(upstream).status_code(), 404);
    }

    #[test]
    fn display() {
        assert_eq!(
            AnalyzerError::NotConfigured.to_string(),
            "Transaction analysis is not configured"
        );
        assert_eq!(
            AnalyzerError::invalid_request("messages are required").to_string(),
            "messages are required"
        );
        assert_eq!(
            AnalyzerError::Timeout { timeout_seconds: 30 }.to_string(),
            "Request timeout after 30 seconds"
        );
    }
}
