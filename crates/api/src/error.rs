// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the error types for server operations and their
//! mapping onto HTTP responses. Every error response body has the shape
//! `{"error": message, "status": code}`, plus `details` when a cause is known.

use std::net::SocketAddr;

use api_client::ErrorEnvelope;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use external_apis::UpstreamError;
use thiserror::Error;
use tracing::{error, warn};
use tx_analyzer::AnalyzerError;

/// Comprehensive error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Missing or malformed query parameter
    #[error("{message}")]
    InvalidParameter {
        /// Error message
        message: String,
    },

    /// The request did not produce a response in time
    #[error("Request timed out after {timeout_seconds} seconds")]
    RequestTimeout {
        /// Configured request timeout
        timeout_seconds: u64,
    },

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// Failure talking to an upstream explorer API
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Failure preparing or streaming a transaction analysis
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Create an invalid-parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. } | Self::JsonError { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream(error) => status_from(error.status_code()),
            Self::Analyzer(error) => status_from(error.status_code()),
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. }
            | Self::RequestTimeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body for this error
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Upstream(error) | Self::Analyzer(AnalyzerError::Upstream(error)) => {
                error.envelope()
            }
            _ => ErrorEnvelope::new(self.to_string(), self.status_code().as_u16()),
        }
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.envelope();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}
