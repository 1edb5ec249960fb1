// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the explorer API
//! server, supporting different environments and validation of configuration
//! parameters.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use api_client::HealthCheckConfig;
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::{
    BitcoinConfig, HostApiKey, ProxyConfig, RebarConfig, RegistryConfig, StacksConfig,
    rebar::DEFAULT_REBAR_BASE_URL,
};
use serde::{Deserialize, Deserializer, Serialize, de};
use tx_analyzer::{OpenAiConfig, config::DEFAULT_MODEL};
use url::Url;

use crate::error::{ServerError, ServerResult};

const DEFAULT_REQUESTS_PER_MINUTE: u32 = 120;
const DEFAULT_PROXY_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_CLIENT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_HEALTH_TIMEOUT_SECONDS: u64 = 5;
const TESTING_UPSTREAM_TIMEOUT_SECONDS: u64 = 4;
const DEFAULT_MAX_TOKENS: u32 = 1_024;
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Re-validated during loading once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// IP based rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Whether API routes are rate limited
    pub enabled: bool,
    /// Requests allowed per client IP per minute
    pub requests_per_minute: u32,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

/// Upstream explorer APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Fixed timeout for `/api/proxy` requests
    pub proxy_timeout_seconds: TimeoutSeconds,
    /// Timeout for mempool.space, Hiro and Rebar Labs client requests
    pub client_timeout_seconds: TimeoutSeconds,
    /// Timeout for each upstream health probe
    pub health_timeout_seconds: TimeoutSeconds,
    /// Replaces the REST root of every Bitcoin network
    #[serde(default)]
    pub bitcoin_base_url: Option<String>,
    /// Replaces the REST root of every Stacks network
    #[serde(default)]
    pub stacks_base_url: Option<String>,
    /// Rebar Labs REST root
    pub rebar_base_url: String,
    /// Sent as `x-hiro-api-key` to Hiro hosts
    #[serde(default, skip_serializing)]
    pub hiro_api_key: Option<String>,
    /// Sent as `x-api-key` to Rebar Labs hosts
    #[serde(default, skip_serializing)]
    pub rebar_api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            proxy_timeout_seconds: TimeoutSeconds(Duration::from_secs(DEFAULT_PROXY_TIMEOUT_SECONDS)),
            client_timeout_seconds: TimeoutSeconds(Duration::from_secs(DEFAULT_CLIENT_TIMEOUT_SECONDS)),
            health_timeout_seconds: TimeoutSeconds(Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECONDS)),
            bitcoin_base_url: None,
            stacks_base_url: None,
            rebar_base_url: DEFAULT_REBAR_BASE_URL.to_string(),
            hiro_api_key: None,
            rebar_api_key: None,
        }
    }
}

impl UpstreamConfig {
    /// Upstream timeouts that fit inside [`TimeoutSeconds::testing`]
    pub fn for_testing() -> Self {
        let timeout = TimeoutSeconds(Duration::from_secs(TESTING_UPSTREAM_TIMEOUT_SECONDS));
        Self {
            proxy_timeout_seconds: timeout,
            client_timeout_seconds: timeout,
            health_timeout_seconds: timeout,
            ..Self::default()
        }
    }

    fn timeouts(&self) -> [(&'static str, TimeoutSeconds); 3] {
        [
            ("upstream.proxy_timeout_seconds", self.proxy_timeout_seconds),
            ("upstream.client_timeout_seconds", self.client_timeout_seconds),
            ("upstream.health_timeout_seconds", self.health_timeout_seconds),
        ]
    }
}

/// Streamed transaction analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Analysis is disabled when absent
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
    /// Alternative OpenAI compatible endpoint
    #[serde(default)]
    pub openai_base_url: Option<Url>,
    /// Chat model
    pub model: String,
    /// Maximum completion tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Rate limiting
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
    /// Upstream APIs
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Transaction analysis
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            rate_limiting: RateLimitingConfig::default(),
            upstream: UpstreamConfig::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER_` prefix, `__` between sections
    ///    (e.g. `SERVER_RATE_LIMITING__ENABLED`)
    /// 5. `OPENAI_API_KEY`, `OPENAI_MODEL`, `HIRO_API_KEY` and `REBAR_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.requests_per_minute", DEFAULT_REQUESTS_PER_MINUTE)?
            .set_default("upstream.proxy_timeout_seconds", DEFAULT_PROXY_TIMEOUT_SECONDS)?
            .set_default("upstream.client_timeout_seconds", DEFAULT_CLIENT_TIMEOUT_SECONDS)?
            .set_default("upstream.health_timeout_seconds", DEFAULT_HEALTH_TIMEOUT_SECONDS)?
            .set_default("upstream.rebar_base_url", DEFAULT_REBAR_BASE_URL)?
            .set_default("analyzer.model", DEFAULT_MODEL)?
            .set_default("analyzer.max_tokens", DEFAULT_MAX_TOKENS)?
            .set_default("analyzer.temperature", f64::from(DEFAULT_TEMPERATURE))?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("analyzer.openai_api_key", well_known_var("OPENAI_API_KEY"))?
            .set_override_option("analyzer.model", well_known_var("OPENAI_MODEL"))?
            .set_override_option("upstream.hiro_api_key", well_known_var("HIRO_API_KEY"))?
            .set_override_option("upstream.rebar_api_key", well_known_var("REBAR_API_KEY"))?;

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;
        server_config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid timeout configuration: {e}")))?;

        Ok(server_config)
    }

    /// Check that every upstream call finishes before the request timeout
    ///
    /// Otherwise the server-wide timeout answers first and the caller never
    /// sees the upstream's own timeout error.
    pub fn validate(&self) -> Result<()> {
        let request_timeout = self.timeout_seconds.value();
        for (name, timeout) in self.upstream.timeouts() {
            ensure!(
                timeout.value() < request_timeout,
                "{name} ({}s) must be shorter than timeout_seconds ({}s)",
                timeout.value().as_secs(),
                request_timeout.as_secs()
            );
        }
        Ok(())
    }

    /// Create configuration optimized for testing
    ///
    /// Rate limiting is off, analysis is disabled and upstreams keep their
    /// public defaults until a test points them elsewhere.
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            rate_limiting: RateLimitingConfig {
                enabled: false,
                requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            },
            upstream: UpstreamConfig::for_testing(),
            analyzer: AnalyzerConfig::default(),
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }

    /// Client settings for the upstream registry
    pub fn registry_config(&self) -> RegistryConfig {
        let upstream = &self.upstream;

        let bitcoin = upstream
            .bitcoin_base_url
            .as_deref()
            .map_or_else(BitcoinConfig::default, BitcoinConfig::with_base_url);
        let client_timeout = upstream.client_timeout_seconds.value().as_secs();
        let bitcoin = BitcoinConfig {
            timeout_seconds: client_timeout,
            ..bitcoin
        };

        let mut stacks = upstream
            .stacks_base_url
            .as_deref()
            .map_or_else(StacksConfig::default, StacksConfig::with_base_url);
        stacks.hiro_api_key.clone_from(&upstream.hiro_api_key);
        stacks.timeout_seconds = client_timeout;

        RegistryConfig {
            bitcoin,
            stacks,
            rebar: RebarConfig {
                base_url: upstream.rebar_base_url.clone(),
                api_key: upstream.rebar_api_key.clone(),
                timeout_seconds: client_timeout,
            },
            proxy: ProxyConfig {
                timeout: upstream.proxy_timeout_seconds.value(),
                api_keys: vec![
                    HostApiKey::hiro(upstream.hiro_api_key.clone()),
                    HostApiKey::rebar(upstream.rebar_api_key.clone()),
                ],
            },
            health: HealthCheckConfig {
                timeout: upstream.health_timeout_seconds.value(),
            },
        }
    }

    /// OpenAI settings, `None` when no API key is configured
    pub fn openai_config(&self) -> Option<OpenAiConfig> {
        let analyzer = &self.analyzer;
        let api_key = analyzer
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())?;

        let mut config = OpenAiConfig::new(api_key.to_string())
            .with_model(analyzer.model.clone())
            .with_max_tokens(analyzer.max_tokens)
            .with_temperature(analyzer.temperature);
        if let Some(base_url) = &analyzer.openai_base_url {
            config = config.with_base_url(base_url.clone());
        }
        Some(config)
    }
}

fn well_known_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use shared_types::{BitcoinNetwork, StacksNetwork};

    use super::*;

    #[test]
    fn timeout_validation() {
        assert!(TimeoutSeconds::new(0).is_err());
        assert!(TimeoutSeconds::new(400).is_err());

        assert!(TimeoutSeconds::new(30).is_ok());
        assert!(TimeoutSeconds::new(1).is_ok());
        assert!(TimeoutSeconds::new(300).is_ok());
    }

    #[test]
    fn server_port_validation() {
        // Port 0 should only be valid in testing environment
        assert!(ServerPort::new(0, Environment::Testing).is_ok());
        assert!(ServerPort::new(0, Environment::Development).is_err());
        assert!(ServerPort::new(0, Environment::Production).is_err());

        assert!(ServerPort::new(3000, Environment::Development).is_ok());
        assert!(ServerPort::new(443, Environment::Production).is_ok());
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Testing.to_string(), "testing");
    }

    #[test]
    fn base_url_overrides_every_network() {
        let mut config = ServerConfig::for_testing();
        config.upstream.bitcoin_base_url = Some("http://127.0.0.1:9001".to_string());
        config.upstream.stacks_base_url = Some("http://127.0.0.1:9002".to_string());
        config.upstream.hiro_api_key = Some("hiro-key".to_string());

        let registry = config.registry_config();
        for network in BitcoinNetwork::all() {
            assert_eq!(registry.bitcoin.base_urls[network], "http://127.0.0.1:9001");
        }
        for network in StacksNetwork::all() {
            assert_eq!(registry.stacks.base_urls[network], "http://127.0.0.1:9002");
        }
        assert_eq!(registry.stacks.hiro_api_key.as_deref(), Some("hiro-key"));
        assert_eq!(registry.proxy.timeout, Duration::from_secs(4));
        assert_eq!(registry.bitcoin.timeout_seconds, 4);
        assert_eq!(registry.stacks.timeout_seconds, 4);
        assert_eq!(registry.rebar.timeout_seconds, 4);
        assert_eq!(registry.health.timeout, Duration::from_secs(4));
        assert!(
            registry
                .proxy
                .api_keys
                .iter()
                .any(|rule| rule.key.as_deref() == Some("hiro-key"))
        );
    }

    #[test]
    fn upstream_timeouts_must_fit_request_timeout() {
        assert!(ServerConfig::default().validate().is_ok());
        assert!(ServerConfig::for_testing().validate().is_ok());

        let mut config = ServerConfig::for_testing();
        config.upstream.proxy_timeout_seconds = config.timeout_seconds;
        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("upstream.proxy_timeout_seconds"), "{error}");

        let mut config = ServerConfig::default();
        config.timeout_seconds = TimeoutSeconds::new(8).unwrap();
        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("upstream.client_timeout_seconds"), "{error}");
    }

    #[test]
    fn openai_config_requires_key() {
        let mut config = ServerConfig::for_testing();
        assert!(config.openai_config().is_none());

        config.analyzer.openai_api_key = Some("   ".to_string());
        assert!(config.openai_config().is_none());

        config.analyzer.openai_api_key = Some("sk-test".to_string());
        config.analyzer.model = "gpt-4o".to_string();
        let openai = config.openai_config().unwrap();
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.model, "gpt-4o");
        assert_eq!(openai.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }

    #[test]
    fn api_keys_are_not_serialized() {
        let mut config = ServerConfig::for_testing();
        config.upstream.rebar_api_key = Some("rebar-secret".to_string());
        config.analyzer.openai_api_key = Some("sk-secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("rebar-secret"));
        assert!(!json.contains("sk-secret"));
    }
}
