// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared upstream HTTP layer
//!
//! Every client funnels its GET requests through [`UpstreamClient`], which
//! enforces a fixed wall-clock timeout over the whole exchange (connect, send
//! and body read) and classifies failures into [`UpstreamError`]. Nothing is
//! retried: a timeout or non-2xx status is a terminal failure for that request.

use std::time::Duration;

use api_client::{ApiError, ErrorEnvelope};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderName, HeaderValue},
    redirect::{Attempt, Policy},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "explorer-api/0.1.0";
const MAX_ERROR_DETAIL_CHARS: usize = 2_048;
const MAX_REDIRECTS: usize = 5;

/// Errors produced while talking to an upstream API
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum UpstreamError {
    /// A required identifier was missing or malformed
    #[error("{message}")]
    InvalidParameter { message: String },

    /// The upstream URL could not be parsed or uses an unsupported scheme
    #[error("Invalid upstream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Upstream answered with a non-2xx status
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The fixed timeout elapsed before the exchange finished
    #[error("Upstream request timed out after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Transport level failure
    #[error("Upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream body did not have the expected shape
    #[error("Invalid upstream response: {message}")]
    InvalidResponse { message: String },

    /// Client misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl UpstreamError {
    /// Create an invalid-parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// HTTP status this error should be reported with
    ///
    /// Upstream statuses are forwarded unchanged; parameter problems are 400;
    /// timeouts, transport and decoding failures are 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidParameter { .. } | Self::InvalidUrl { .. } => 400,
            Self::Status { status, .. } => *status,
            Self::Timeout { .. }
            | Self::Network(_)
            | Self::InvalidResponse { .. }
            | Self::Config(_) => 500,
        }
    }

    /// Whether the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. } | Self::InvalidUrl { .. })
    }

    /// Build the JSON error envelope for this error
    pub fn envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.to_string(), self.status_code());
        match self {
            Self::Status {
                details: Some(details),
                ..
            } => envelope.with_details(details.clone()),
            Self::Network(source) => match std::error::Error::source(source) {
                Some(cause) => envelope.with_details(cause.to_string()),
                None => envelope,
            },
            _ => envelope,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(value: UpstreamError) -> Self {
        match value {
            UpstreamError::InvalidParameter { message } | UpstreamError::Config(message) => {
                ApiError::Configuration { message }
            }
            UpstreamError::InvalidUrl { url, reason } => ApiError::Configuration {
                message: format!("{url}: {reason}"),
            },
            UpstreamError::Status { status: 401 | 403, message, .. } => {
                ApiError::Authentication { message }
            }
            UpstreamError::Status { status: 429, .. } => ApiError::RateLimitExceeded {
                retry_after_seconds: 60,
            },
            UpstreamError::Status {
                status: 500..=599,
                message,
                ..
            } => ApiError::ServiceUnavailable { message },
            UpstreamError::Status {
                status, message, ..
            } => ApiError::Custom {
                error: anyhow::Error::msg(format!("{status}: {message}")),
            },
            UpstreamError::Timeout { timeout_seconds } => ApiError::Timeout { timeout_seconds },
            UpstreamError::Network(error) => ApiError::Http {
                message: error.to_string(),
            },
            UpstreamError::InvalidResponse { message } => ApiError::InvalidResponse { message },
        }
    }
}

/// Timeout-bounded JSON GET client shared by every upstream integration
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    timeout: Duration,
}

impl UpstreamClient {
    /// Create a client whose every request is bounded by `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        if timeout.is_zero() {
            return Err(UpstreamError::Config(
                "upstream timeout must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::custom(same_origin_redirects))
            .build()
            .map_err(UpstreamError::Network)?;

        Ok(Self { client, timeout })
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return the body as JSON
    ///
    /// Bodies that are not JSON (mempool.space answers some endpoints with
    /// bare text) are returned as a JSON string.
    pub async fn get_json(
        &self,
        url: Url,
        headers: &[(HeaderName, HeaderValue)],
    ) -> Result<Value, UpstreamError> {
        let body = self.get_bytes(url, headers).await?;
        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).trim().to_string())))
    }

    /// GET `url` and deserialize the body into `T`
    pub async fn get_typed<T: DeserializeOwned>(
        &self,
        url: Url,
        headers: &[(HeaderName, HeaderValue)],
    ) -> Result<T, UpstreamError> {
        let body = self.get_bytes(url, headers).await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidResponse {
            message: e.to_string(),
        })
    }

    /// GET `url` and return the body as trimmed text
    pub async fn get_text(
        &self,
        url: Url,
        headers: &[(HeaderName, HeaderValue)],
    ) -> Result<String, UpstreamError> {
        let body = self.get_bytes(url, headers).await?;
        Ok(String::from_utf8_lossy(&body).trim().to_string())
    }

    /// GET `url` and report only the status code, for health probes
    pub async fn probe(
        &self,
        url: Url,
        headers: &[(HeaderName, HeaderValue)],
    ) -> Result<StatusCode, UpstreamError> {
        let request = self.request(url, headers);
        let response = timeout(self.timeout, request.send())
            .await
            .map_err(|_| self.timeout_error())??;
        Ok(response.status())
    }

    async fn get_bytes(
        &self,
        url: Url,
        headers: &[(HeaderName, HeaderValue)],
    ) -> Result<Vec<u8>, UpstreamError> {
        debug!(url = %url, "fetching upstream resource");

        let request = self.request(url.clone(), headers);
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = timeout(self.timeout, exchange).await.map_err(|_| {
            warn!(url = %url, timeout = ?self.timeout, "upstream request timed out");
            self.timeout_error()
        })??;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let text = String::from_utf8_lossy(&body);
        let details = (!text.trim().is_empty())
            .then(|| text.trim().chars().take(MAX_ERROR_DETAIL_CHARS).collect::<String>());
        warn!(url = %url, status = status.as_u16(), "upstream returned an error status");

        Err(UpstreamError::Status {
            status: status.as_u16(),
            message: format!(
                "Upstream request failed with status {}",
                status.as_u16()
            ),
            details,
        })
    }

    fn request(&self, url: Url, headers: &[(HeaderName, HeaderValue)]) -> reqwest::RequestBuilder {
        headers.iter().fold(
            self.client
                .get(url)
                .header(ACCEPT, HeaderValue::from_static("application/json")),
            |request, (name, value)| request.header(name.clone(), value.clone()),
        )
    }

    fn timeout_error(&self) -> UpstreamError {
        UpstreamError::Timeout {
            timeout_seconds: self.timeout.as_secs().max(1),
        }
    }
}

/// Redirect policy for keyed requests
///
/// API key headers are attached per host, so a redirect may only be followed
/// while it stays on the origin of the first request. A redirect elsewhere is
/// not followed and its 3xx status is reported as an upstream error.
fn same_origin_redirects(attempt: Attempt<'_>) -> reqwest::redirect::Action {
    if attempt.previous().len() > MAX_REDIRECTS {
        return attempt.error("too many redirects");
    }
    let stays_on_origin = attempt
        .previous()
        .first()
        .is_some_and(|first| same_origin(first, attempt.url()));
    if stays_on_origin {
        attempt.follow()
    } else {
        warn!(target = %attempt.url(), "refusing cross-origin upstream redirect");
        attempt.stop()
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Append path segments to a base URL, percent-encoding each segment
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|()| UpstreamError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot be a base".to_string(),
        })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Parse a configured base URL
pub fn parse_base_url(raw: &str) -> Result<Url, UpstreamError> {
    let url = Url::parse(raw.trim()).map_err(|e| UpstreamError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UpstreamError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}

/// Build a header pair from an API key, marking the value sensitive
pub fn api_key_header(
    name: &HeaderName,
    key: &str,
) -> Result<(HeaderName, HeaderValue), UpstreamError> {
    let mut value = HeaderValue::from_str(key.trim())
        .map_err(|e| UpstreamError::Config(format!("invalid API key for {name}: {e}")))?;
    value.set_sensitive(true);
    Ok((name.clone(), value))
}
