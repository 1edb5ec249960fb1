// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Generic API client traits and utilities for external integrations
//!
//! This crate provides common abstractions for upstream blockchain data
//! clients (Bitcoin explorers, the Stacks API, Rebar Labs).
//!
//! # Core Abstractions
//!
//! - **`ApiClient` Trait**: Common interface for all upstream clients with async support
//! - **Health Check System**: Standardized health status reporting across all clients
//! - **Error Handling**: `ApiError` types for the failure categories clients report
//! - **Data Types**: Normalized transaction, fee and wallet projections

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;

/// Generic trait for upstream API clients
///
/// Every client exposes a name and a cheap health probe; resource methods are
/// specific to each client.
pub trait ApiClient: Send + Sync {
    /// Check the health of this API client
    ///
    /// # Errors
    ///
    /// Returns an error if the health probe could not be performed at all
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;

    /// Get the name/identifier of this API client
    fn name(&self) -> &'static str;
}

/// Common errors that can occur when working with API clients
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid response format
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Service unavailable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network timeout
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Client independent error
    #[error(transparent)]
    Custom { error: anyhow::Error },
}

/// Error envelope returned to callers for any failed upstream request
///
/// Serialized as `{"error": ..., "status": ..., "details": ...}` with
/// `details` omitted when no cause is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable failure message
    pub error: String,
    /// HTTP status code of the failure
    pub status: u16,
    /// Optional cause detail, such as the upstream response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    /// Create an envelope without cause detail
    pub fn new(error: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            status,
            details: None,
        }
    }

    /// Attach cause detail
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
