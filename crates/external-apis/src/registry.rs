// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Registry owning every upstream client
//!
//! The registry is built once at startup and shared read-only by the HTTP
//! handlers. It also answers the cross-chain questions that need more than
//! one client method: normalized transaction details and wallet activity.

use std::{collections::HashMap, time::Instant};

use api_client::{
    ActivityFeed, ApiClient, HealthCheckConfig, HealthReport, HealthStatus, TransactionDetails,
    WalletInfo,
};
use serde_json::Value;
use shared_types::{BitcoinNetwork, Chain, StacksNetwork};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    bitcoin::{BitcoinClient, BitcoinConfig},
    proxy::{BlockchainProxy, ProxyConfig},
    rebar::{RebarClient, RebarConfig},
    stacks::{StacksClient, StacksConfig},
    upstream::UpstreamError,
};

/// Message returned for an unrecognized `network` query value
pub const INVALID_NETWORK_MESSAGE: &str = "Invalid network parameter";

/// Configuration for every upstream client
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Bitcoin explorer settings
    pub bitcoin: BitcoinConfig,
    /// Hiro Stacks API settings
    pub stacks: StacksConfig,
    /// Rebar Labs settings
    pub rebar: RebarConfig,
    /// Generic proxy settings
    pub proxy: ProxyConfig,
    /// Health probe settings
    pub health: HealthCheckConfig,
}

/// Registry of upstream clients
#[derive(Debug)]
pub struct ApiRegistry {
    bitcoin: BitcoinClient,
    stacks: StacksClient,
    rebar: RebarClient,
    proxy: BlockchainProxy,
    health: HealthCheckConfig,
}

/// Parse a Bitcoin `network` query value
pub fn bitcoin_network(param: Option<&str>) -> Result<BitcoinNetwork, UpstreamError> {
    BitcoinNetwork::from_param(param)
        .map_err(|_| UpstreamError::invalid_parameter(INVALID_NETWORK_MESSAGE))
}

/// Parse a Stacks `network` query value
pub fn stacks_network(param: Option<&str>) -> Result<StacksNetwork, UpstreamError> {
    StacksNetwork::from_param(param)
        .map_err(|_| UpstreamError::invalid_parameter(INVALID_NETWORK_MESSAGE))
}

impl ApiRegistry {
    /// Create every client from configuration
    ///
    /// # Errors
    ///
    /// Returns the first client construction error
    pub fn new(config: RegistryConfig) -> Result<Self, UpstreamError> {
        let registry = Self {
            bitcoin: BitcoinClient::new(config.bitcoin)?,
            stacks: StacksClient::new(config.stacks)?,
            rebar: RebarClient::new(config.rebar)?,
            proxy: BlockchainProxy::new(config.proxy)?,
            health: config.health,
        };

        info!(clients = ?registry.client_names(), "initialized API registry");
        Ok(registry)
    }

    /// Bitcoin explorer client
    pub fn bitcoin(&self) -> &BitcoinClient {
        &self.bitcoin
    }

    /// Hiro Stacks client
    pub fn stacks(&self) -> &StacksClient {
        &self.stacks
    }

    /// Rebar Labs client
    pub fn rebar(&self) -> &RebarClient {
        &self.rebar
    }

    /// Generic proxy
    pub fn proxy(&self) -> &BlockchainProxy {
        &self.proxy
    }

    /// Names of all registered clients
    pub fn client_names(&self) -> Vec<&'static str> {
        vec![self.bitcoin.name(), self.stacks.name(), self.rebar.name()]
    }

    /// Fetch a transaction on `chain` and normalize it
    ///
    /// The network is validated before the id, matching the HTTP routes.
    pub async fn transaction_details(
        &self,
        chain: Chain,
        network: Option<&str>,
        id: &str,
    ) -> Result<TransactionDetails, UpstreamError> {
        match chain {
            Chain::Bitcoin => {
                let network = bitcoin_network(network)?;
                self.bitcoin
                    .transfer_details(network, id)
                    .await
                    .map(TransactionDetails::Bitcoin)
            }
            Chain::Stacks => {
                let network = stacks_network(network)?;
                self.stacks
                    .transfer_details(network, id)
                    .await
                    .map(TransactionDetails::Stacks)
            }
        }
    }

    /// Recent transactions touching the wallet address, newest first
    pub async fn address_activity(&self, wallet: &WalletInfo) -> Result<ActivityFeed, UpstreamError> {
        let network = Some(wallet.network.as_str());

        let (network, transactions) = match wallet.chain {
            Chain::Bitcoin => {
                let network = bitcoin_network(network)?;
                let body = self
                    .bitcoin
                    .address_transactions(network, wallet.address())
                    .await?;
                (network.to_string(), Self::transaction_items(body))
            }
            Chain::Stacks => {
                let network = stacks_network(network)?;
                let body = self
                    .stacks
                    .address_transactions(network, wallet.address(), None)
                    .await?;
                (network.to_string(), Self::transaction_items(body))
            }
        };

        debug!(
            address = wallet.address(),
            chain = wallet.chain.name(),
            count = transactions.len(),
            "built activity feed"
        );

        Ok(ActivityFeed {
            address: wallet.address().to_string(),
            chain: wallet.chain,
            network,
            transactions,
        })
    }

    /// mempool.space answers with a bare array, Hiro wraps it in `results`
    fn transaction_items(body: Value) -> Vec<Value> {
        match body {
            Value::Array(items) => items,
            Value::Object(mut object) => match object.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Probe every client concurrently
    ///
    /// Each probe is bounded by the configured health timeout; a probe that
    /// errors or times out is reported as down.
    pub async fn get_overall_health(&self) -> HashMap<String, HealthReport> {
        let (bitcoin, stacks, rebar) = tokio::join!(
            self.probe(&self.bitcoin),
            self.probe(&self.stacks),
            self.probe(&self.rebar),
        );

        [bitcoin, stacks, rebar].into_iter().collect()
    }

    async fn probe<C: ApiClient>(&self, client: &C) -> (String, HealthReport) {
        let started = Instant::now();
        let status = match timeout(self.health.timeout, client.health_check()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!(client = client.name(), error = %e, "health check failed");
                HealthStatus::Down {
                    reason: format!("Health check failed: {e}"),
                }
            }
            Err(_) => {
                warn!(client = client.name(), timeout = ?self.health.timeout, "health check timed out");
                HealthStatus::Down {
                    reason: "Health check timed out".to_string(),
                }
            }
        };

        (
            client.name().to_string(),
            HealthReport::new(status, started.elapsed()),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registry_creation() {
        let registry = ApiRegistry::new(RegistryConfig::default()).unwrap();
        assert_eq!(registry.client_names(), vec!["bitcoin", "stacks", "rebar"]);
    }

    #[test]
    fn invalid_network_message() {
        let error = bitcoin_network(Some("regtest")).unwrap_err();
        assert_eq!(error.to_string(), "Invalid network parameter");
        assert_eq!(error.status_code(), 400);

        assert_eq!(stacks_network(None).unwrap(), StacksNetwork::Mainnet);
        assert!(stacks_network(Some("signet")).is_err());
    }

    #[test]
    fn transaction_items_shapes() {
        assert_eq!(
            ApiRegistry::transaction_items(json!([{"txid": "a"}, {"txid": "b"}])).len(),
            2
        );
        assert_eq!(
            ApiRegistry::transaction_items(json!({"limit": 20, "results": [{"tx_id": "0x1"}]})).len(),
            1
        );
        assert!(ApiRegistry::transaction_items(json!("unexpected")).is_empty());
    }

    #[tokio::test]
    async fn invalid_network_fails_before_any_request() {
        let registry = ApiRegistry::new(RegistryConfig::default()).unwrap();
        let result = registry
            .transaction_details(Chain::Stacks, Some("invalid"), "0x01")
            .await;
        assert!(matches!(result, Err(UpstreamError::InvalidParameter { .. })));
    }
}
