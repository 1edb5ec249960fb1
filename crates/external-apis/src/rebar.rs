// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rebar Labs API integration
//!
//! Runes, BRC-20 and inscription indexes. Requests carry the Rebar API key in
//! the `x-api-key` header when one is configured.

use std::time::Duration;

use api_client::{ApiClient, ApiError, HealthStatus};
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::{
    non_empty_string::NonEmptyString,
    proxy::REBAR_API_KEY_HEADER,
    upstream::{UpstreamClient, UpstreamError, api_key_header, endpoint, parse_base_url},
};

/// Public Rebar Labs API root
pub const DEFAULT_REBAR_BASE_URL: &str = "https://api.rebarlabs.io";
const DEFAULT_REBAR_TIMEOUT_SECONDS: u64 = 10;
const MAX_PAGE_SIZE: u32 = 60;

/// Configuration for the Rebar Labs client
#[derive(Debug, Clone)]
pub struct RebarConfig {
    /// REST root
    pub base_url: String,
    /// Optional API key
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for RebarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REBAR_BASE_URL.to_string(),
            api_key: None,
            timeout_seconds: DEFAULT_REBAR_TIMEOUT_SECONDS,
        }
    }
}

/// Pagination for list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Items to skip
    pub offset: Option<u32>,
    /// Page size, capped at 60
    pub limit: Option<u32>,
}

impl Page {
    fn query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()));
        }
        query
    }
}

/// Rebar Labs API client
#[derive(Debug)]
pub struct RebarClient {
    upstream: UpstreamClient,
    base_url: Url,
    api_key: Option<(HeaderName, HeaderValue)>,
}

impl RebarClient {
    /// Create a new Rebar Labs client
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or API key is invalid
    pub fn new(config: RebarConfig) -> Result<Self, UpstreamError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| api_key_header(&REBAR_API_KEY_HEADER, key))
            .transpose()?;

        if api_key.is_none() {
            debug!("no Rebar API key configured");
        }

        Ok(Self {
            upstream: UpstreamClient::new(Duration::from_secs(config.timeout_seconds))?,
            base_url: parse_base_url(&config.base_url)?,
            api_key,
        })
    }

    /// Split a caller-supplied relative endpoint into path segments
    ///
    /// Absolute URLs, scheme-relative paths, `.`/`..` segments, query strings
    /// and fragments are rejected.
    pub fn endpoint_segments(raw: &str) -> Result<Vec<String>, UpstreamError> {
        let raw = NonEmptyString::required("endpoint", raw).map_err(UpstreamError::invalid_parameter)?;
        let raw = raw.as_str();

        let invalid = |reason: &str| UpstreamError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.starts_with("//") || Url::parse(raw).is_ok() {
            return Err(invalid("endpoint must be a relative path"));
        }
        if raw.contains(['?', '#', '\\']) {
            return Err(invalid("endpoint must not contain a query, fragment or backslash"));
        }

        let segments: Vec<String> = raw
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if segments.iter().any(|segment| segment == "." || segment == "..") {
            return Err(invalid("endpoint must not contain dot segments"));
        }
        if segments.is_empty() {
            return Err(invalid("endpoint has no path segments"));
        }

        Ok(segments)
    }

    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, UpstreamError> {
        let mut url = endpoint(&self.base_url, segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        self.api_key.iter().cloned().collect()
    }

    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let url = self.url(segments, query)?;
        self.upstream
            .get_json(url, &self.headers())
            .await
            .inspect_err(|e| {
                error!(path = %segments.join("/"), error = %e, "rebar request failed");
            })
    }

    /// Forward `endpoint` relative to the Rebar root with the caller's query
    pub async fn passthrough(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamError> {
        let segments = Self::endpoint_segments(endpoint)?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let query: Vec<(&str, String)> = query
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        self.get(&segments, &query).await
    }

    /// `GET /runes/v1/etchings`
    pub async fn runes(&self, page: Page) -> Result<Value, UpstreamError> {
        self.get(&["runes", "v1", "etchings"], &page.query()).await
    }

    /// `GET /runes/v1/etchings/{id}`, by rune id, name or spaced name
    pub async fn rune(&self, id: &str) -> Result<Value, UpstreamError> {
        let id = NonEmptyString::required("id", id).map_err(UpstreamError::invalid_parameter)?;
        self.get(&["runes", "v1", "etchings", id.as_str()], &[]).await
    }

    /// `GET /runes/v1/etchings/{id}/holders`
    pub async fn rune_holders(&self, id: &str, page: Page) -> Result<Value, UpstreamError> {
        let id = NonEmptyString::required("id", id).map_err(UpstreamError::invalid_parameter)?;
        self.get(&["runes", "v1", "etchings", id.as_str(), "holders"], &page.query())
            .await
    }

    /// `GET /runes/v1/addresses/{address}/balances`
    pub async fn address_rune_balances(&self, address: &str, page: Page) -> Result<Value, UpstreamError> {
        let address = NonEmptyString::required("id", address).map_err(UpstreamError::invalid_parameter)?;
        self.get(
            &["runes", "v1", "addresses", address.as_str(), "balances"],
            &page.query(),
        )
        .await
    }

    /// `GET /ordinals/v1/brc-20/tokens`, optionally filtered by ticker
    pub async fn brc20_tokens(&self, ticker: Option<&str>, page: Page) -> Result<Value, UpstreamError> {
        let mut query = page.query();
        if let Some(ticker) = ticker.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(("ticker", ticker.to_string()));
        }
        self.get(&["ordinals", "v1", "brc-20", "tokens"], &query).await
    }

    /// `GET /ordinals/v1/brc-20/tokens/{ticker}`
    pub async fn brc20_token(&self, ticker: &str) -> Result<Value, UpstreamError> {
        let ticker = NonEmptyString::required("id", ticker).map_err(UpstreamError::invalid_parameter)?;
        self.get(&["ordinals", "v1", "brc-20", "tokens", ticker.as_str()], &[])
            .await
    }

    /// `GET /ordinals/v1/brc-20/balances/{address}`
    pub async fn brc20_balances(&self, address: &str, page: Page) -> Result<Value, UpstreamError> {
        let address = NonEmptyString::required("id", address).map_err(UpstreamError::invalid_parameter)?;
        self.get(
            &["ordinals", "v1", "brc-20", "balances", address.as_str()],
            &page.query(),
        )
        .await
    }

    /// `GET /ordinals/v1/inscriptions?address=`
    pub async fn inscriptions(&self, address: &str, page: Page) -> Result<Value, UpstreamError> {
        let address = NonEmptyString::required("id", address).map_err(UpstreamError::invalid_parameter)?;
        let mut query = page.query();
        query.push(("address", address.to_string()));
        self.get(&["ordinals", "v1", "inscriptions"], &query).await
    }
}

impl ApiClient for RebarClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url(&["runes", "v1", "etchings"], &[("limit", "1".to_string())])?;
        debug!(url = %url, "performing health check on Rebar API");

        let status = self.upstream.probe(url, &self.headers()).await?;
        let health = HealthStatus::from_probe_status(status);
        if !matches!(health, HealthStatus::Up) {
            warn!(status = status.as_u16(), "Rebar API health check failed");
        }
        Ok(health)
    }

    fn name(&self) -> &'static str {
        "rebar"
    }
}
