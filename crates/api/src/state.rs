// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the explorer API server:
//! configuration, the upstream registry, the transaction analyzer and the
//! cancellation token used for coordinated shutdown.

use std::{collections::HashMap, sync::Arc};

use api_client::HealthReport;
use external_apis::ApiRegistry;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tx_analyzer::TransactionAnalyzer;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Upstream explorer clients
    api_registry: Arc<ApiRegistry>,
    /// Streamed transaction explanations
    analyzer: Arc<TransactionAnalyzer>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: ServerConfig,
        api_registry: Arc<ApiRegistry>,
        analyzer: Arc<TransactionAnalyzer>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            api_registry,
            analyzer,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the API registry for upstream operations
    pub fn api_registry(&self) -> &Arc<ApiRegistry> {
        &self.api_registry
    }

    /// Get the transaction analyzer
    pub fn analyzer(&self) -> &Arc<TransactionAnalyzer> {
        &self.analyzer
    }

    /// Probe every upstream and summarize
    ///
    /// The service is `Up` when every upstream is up, otherwise `Degraded`
    /// naming the upstreams that are not.
    pub async fn health_check(&self) -> HealthCheck {
        let api_clients = self.api_registry.get_overall_health().await;

        let mut unhealthy: Vec<&str> = api_clients
            .iter()
            .filter(|(_, report)| report.status != api_client::HealthStatus::Up)
            .map(|(name, _)| name.as_str())
            .collect();
        unhealthy.sort_unstable();

        let status = if unhealthy.is_empty() {
            HealthStatus::Up
        } else {
            HealthStatus::Degraded {
                reason: format!("upstream issues: {}", unhealthy.join(", ")).into_boxed_str(),
            }
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            analysis_enabled: self.analyzer.is_configured(),
            api_clients,
        }
    }
}

/// Health status of the service
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Every upstream is responding normally
    Up,

    /// Service is not operational
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Some upstreams are failing; routes that use them will error
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Whether `/api/chat` has an OpenAI key
    pub analysis_enabled: bool,
    /// Probe result per upstream client
    #[schema(value_type = Object)]
    pub api_clients: HashMap<String, HealthReport>,
}
