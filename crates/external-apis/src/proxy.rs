// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Generic blockchain-data proxy
//!
//! Fetches an arbitrary caller-supplied upstream URL, attaching a provider API
//! key only when the URL host belongs to that provider.

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::upstream::{UpstreamClient, UpstreamError, api_key_header};

const DEFAULT_PROXY_TIMEOUT_SECONDS: u64 = 10;

/// Header used by the Hiro Stacks API
pub const HIRO_API_KEY_HEADER: HeaderName = HeaderName::from_static("x-hiro-api-key");
/// Header used by the Rebar Labs API
pub const REBAR_API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// API key attached to requests whose host falls under `host_suffix`
#[derive(Debug, Clone)]
pub struct HostApiKey {
    /// Registrable domain, e.g. `hiro.so`
    pub host_suffix: String,
    /// Header carrying the key
    pub header: HeaderName,
    /// The key; a rule without a key never attaches anything
    pub key: Option<String>,
}

impl HostApiKey {
    /// Hiro API key rule for `*.hiro.so`
    pub fn hiro(key: Option<String>) -> Self {
        Self {
            host_suffix: "hiro.so".to_string(),
            header: HIRO_API_KEY_HEADER,
            key,
        }
    }

    /// Rebar Labs API key rule for `*.rebarlabs.io`
    pub fn rebar(key: Option<String>) -> Self {
        Self {
            host_suffix: "rebarlabs.io".to_string(),
            header: REBAR_API_KEY_HEADER,
            key,
        }
    }

    /// Whether `host` is the suffix itself or one of its subdomains
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let suffix = self.host_suffix.to_ascii_lowercase();
        host == suffix
            || host
                .strip_suffix(&suffix)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Configuration for the generic proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Fixed wall-clock bound for every proxied request
    pub timeout: Duration,
    /// Host-scoped API keys
    pub api_keys: Vec<HostApiKey>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROXY_TIMEOUT_SECONDS),
            api_keys: vec![HostApiKey::hiro(None), HostApiKey::rebar(None)],
        }
    }
}

#[derive(Debug, Clone)]
struct ResolvedKey {
    rule: HostApiKey,
    value: HeaderValue,
}

/// Timeout-bounded pass-through to arbitrary upstream URLs
#[derive(Debug, Clone)]
pub struct BlockchainProxy {
    upstream: UpstreamClient,
    keys: Vec<ResolvedKey>,
}

impl BlockchainProxy {
    /// Create a proxy from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero or an API key is not a valid header value
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(config.timeout)?;

        let mut keys = Vec::new();
        for rule in config.api_keys {
            let Some(key) = rule.key.as_deref().filter(|k| !k.trim().is_empty()) else {
                debug!(host = %rule.host_suffix, "no API key configured for host");
                continue;
            };
            let (_, value) = api_key_header(&rule.header, key)?;
            keys.push(ResolvedKey { rule, value });
        }

        info!(
            timeout = ?config.timeout,
            keyed_hosts = keys.len(),
            "created blockchain proxy"
        );

        Ok(Self { upstream, keys })
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.upstream.timeout()
    }

    /// Parse and validate a caller-supplied upstream URL
    pub fn parse_target(raw: &str) -> Result<Url, UpstreamError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UpstreamError::invalid_parameter("url is required"));
        }

        let url = Url::parse(raw).map_err(|e| UpstreamError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UpstreamError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if url.host_str().is_none() {
            return Err(UpstreamError::InvalidUrl {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(url)
    }

    /// Headers to attach for `url`
    pub fn headers_for(&self, url: &Url) -> Vec<(HeaderName, HeaderValue)> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };

        self.keys
            .iter()
            .filter(|key| key.rule.matches(host))
            .map(|key| (key.rule.header.clone(), key.value.clone()))
            .collect()
    }

    /// Fetch `raw_url` and return the upstream JSON body verbatim
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl`/`InvalidParameter` for bad input, `Status` with the
    /// upstream code for non-2xx answers, `Timeout` when the fixed bound elapses.
    pub async fn fetch(&self, raw_url: &str) -> Result<Value, UpstreamError> {
        let url = Self::parse_target(raw_url)?;
        let headers = self.headers_for(&url);

        debug!(
            host = url.host_str().unwrap_or_default(),
            keyed = !headers.is_empty(),
            "proxying upstream request"
        );

        self.upstream.get_json(url, &headers).await.inspect_err(|e| {
            warn!(error = %e, "proxied request failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy_with_keys() -> BlockchainProxy {
        BlockchainProxy::new(ProxyConfig {
            api_keys: vec![
                HostApiKey::hiro(Some("hiro-key".to_string())),
                HostApiKey::rebar(None),
            ],
            ..ProxyConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn host_matching() {
        let rule = HostApiKey::hiro(None);
        assert!(rule.matches("hiro.so"));
        assert!(rule.matches("api.hiro.so"));
        assert!(rule.matches("API.Testnet.Hiro.so."));
        assert!(!rule.matches("nothiro.so"));
        assert!(!rule.matches("hiro.so.example.com"));
        assert!(!rule.matches("mempool.space"));
    }

    #[test]
    fn key_attached_only_for_matching_host() {
        let proxy = proxy_with_keys();

        let hiro = Url::parse("https://api.hiro.so/extended/v1/tx/0x01").unwrap();
        let headers = proxy.headers_for(&hiro);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, HIRO_API_KEY_HEADER);
        assert_eq!(headers[0].1, "hiro-key");

        let mempool = Url::parse("https://mempool.space/api/blocks").unwrap();
        assert!(proxy.headers_for(&mempool).is_empty());

        // Rebar rule has no key configured
        let rebar = Url::parse("https://api.rebarlabs.io/runes/v1/etchings").unwrap();
        assert!(proxy.headers_for(&rebar).is_empty());
    }

    #[test]
    fn target_validation() {
        assert!(BlockchainProxy::parse_target("https://mempool.space/api/blocks").is_ok());
        assert!(matches!(
            BlockchainProxy::parse_target("  "),
            Err(UpstreamError::InvalidParameter { .. })
        ));
        assert!(matches!(
            BlockchainProxy::parse_target("file:///etc/passwd"),
            Err(UpstreamError::InvalidUrl { .. })
        ));
        assert!(matches!(
            BlockchainProxy::parse_target("mempool.space/api"),
            Err(UpstreamError::InvalidUrl { .. })
        ));
    }
}
