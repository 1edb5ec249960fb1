// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bitcoin explorer integration
//!
//! This module provides an implementation of the `ApiClient` trait for
//! mempool.space style Bitcoin REST APIs (mempool.space, blockstream esplora).

use std::{collections::HashMap, sync::LazyLock, time::Duration};

use api_client::{
    ApiClient, ApiError, BitcoinTransferDetails, FeeEstimate, HealthStatus, TransferLeg,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use shared_types::BitcoinNetwork;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    non_empty_string::NonEmptyString,
    upstream::{UpstreamClient, UpstreamError, endpoint, parse_base_url},
};

const DEFAULT_BITCOIN_TIMEOUT_SECONDS: u64 = 10;

static HEX_HASH: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9a-fA-F]{64}$").expect("static regex is valid")
});

/// Configuration for the Bitcoin API client
#[derive(Debug, Clone)]
pub struct BitcoinConfig {
    /// REST root per network
    pub base_urls: HashMap<BitcoinNetwork, String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            base_urls: BitcoinNetwork::all()
                .iter()
                .map(|network| (*network, network.config().api_base_url.to_string()))
                .collect(),
            timeout_seconds: DEFAULT_BITCOIN_TIMEOUT_SECONDS,
        }
    }
}

impl BitcoinConfig {
    /// Serve every network from a single REST root
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_urls: BitcoinNetwork::all()
                .iter()
                .map(|network| (*network, base_url.clone()))
                .collect(),
            ..Self::default()
        }
    }
}

/// Raw mempool.space transaction
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MempoolTransaction {
    txid: String,
    fee: u64,
    size: u64,
    weight: u64,
    vin: Vec<MempoolInput>,
    vout: Vec<MempoolOutput>,
    status: MempoolTxStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MempoolInput {
    prevout: Option<MempoolOutput>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct MempoolOutput {
    scriptpubkey_address: Option<String>,
    value: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MempoolTxStatus {
    confirmed: bool,
    block_height: Option<u64>,
    block_hash: Option<String>,
    block_time: Option<u64>,
}

/// Bitcoin explorer API client
#[derive(Debug)]
pub struct BitcoinClient {
    upstream: UpstreamClient,
    base_urls: HashMap<BitcoinNetwork, Url>,
}

impl BitcoinClient {
    /// Create a new Bitcoin API client
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL is invalid, a network has no base URL,
    /// or the HTTP client cannot be created
    pub fn new(config: BitcoinConfig) -> Result<Self, UpstreamError> {
        let mut base_urls = HashMap::new();
        for network in BitcoinNetwork::all() {
            let raw = config.base_urls.get(network).ok_or_else(|| {
                UpstreamError::Config(format!("no base URL configured for bitcoin {network}"))
            })?;
            base_urls.insert(*network, parse_base_url(raw)?);
        }

        let upstream = UpstreamClient::new(Duration::from_secs(config.timeout_seconds))?;

        Ok(Self {
            upstream,
            base_urls,
        })
    }

    fn url(&self, network: BitcoinNetwork, segments: &[&str]) -> Result<Url, UpstreamError> {
        let base = self.base_urls.get(&network).ok_or_else(|| {
            UpstreamError::Config(format!("no base URL configured for bitcoin {network}"))
        })?;
        endpoint(base, segments)
    }

    async fn get(&self, network: BitcoinNetwork, segments: &[&str]) -> Result<Value, UpstreamError> {
        let url = self.url(network, segments)?;
        self.upstream.get_json(url, &[]).await.inspect_err(|e| {
            error!(network = %network, path = %segments.join("/"), error = %e, "bitcoin request failed");
        })
    }

    /// Validate a 64 character hex transaction id or block hash
    pub fn validate_hash(field: &str, value: &str) -> Result<String, UpstreamError> {
        let value = NonEmptyString::required(field, value).map_err(UpstreamError::invalid_parameter)?;
        if HEX_HASH.is_match(value.as_str()) {
            Ok(value.as_str().to_lowercase())
        } else {
            Err(UpstreamError::invalid_parameter(format!(
                "{field} must be a 64 character hex string"
            )))
        }
    }

    /// `GET /tx/{txid}`
    pub async fn transaction(&self, network: BitcoinNetwork, txid: &str) -> Result<Value, UpstreamError> {
        let txid = Self::validate_hash("id", txid)?;
        self.get(network, &["tx", &txid]).await
    }

    /// `GET /tx/{txid}/status`
    pub async fn transaction_status(
        &self,
        network: BitcoinNetwork,
        txid: &str,
    ) -> Result<Value, UpstreamError> {
        let txid = Self::validate_hash("id", txid)?;
        self.get(network, &["tx", &txid, "status"]).await
    }

    /// `GET /address/{address}`
    pub async fn address(&self, network: BitcoinNetwork, address: &str) -> Result<Value, UpstreamError> {
        let address = NonEmptyString::required("id", address).map_err(UpstreamError::invalid_parameter)?;
        self.get(network, &["address", address.as_str()]).await
    }

    /// `GET /address/{address}/txs`, newest first
    pub async fn address_transactions(
        &self,
        network: BitcoinNetwork,
        address: &str,
    ) -> Result<Value, UpstreamError> {
        let address = NonEmptyString::required("id", address).map_err(UpstreamError::invalid_parameter)?;
        self.get(network, &["address", address.as_str(), "txs"]).await
    }

    /// `GET /address/{address}/utxo`
    pub async fn address_utxos(
        &self,
        network: BitcoinNetwork,
        address: &str,
    ) -> Result<Value, UpstreamError> {
        let address = NonEmptyString::required("id", address).map_err(UpstreamError::invalid_parameter)?;
        self.get(network, &["address", address.as_str(), "utxo"]).await
    }

    /// `GET /block/{hash}`; a numeric id is resolved through `/block-height/{height}` first
    pub async fn block(&self, network: BitcoinNetwork, id: &str) -> Result<Value, UpstreamError> {
        let id = NonEmptyString::required("id", id).map_err(UpstreamError::invalid_parameter)?;

        let hash = if let Ok(height) = id.as_str().parse::<u64>() {
            let url = self.url(network, &["block-height", &height.to_string()])?;
            let hash = self.upstream.get_text(url, &[]).await?;
            debug!(height, hash = %hash, "resolved block height");
            Self::validate_hash("block hash", &hash).map_err(|_| UpstreamError::InvalidResponse {
                message: format!("unexpected block hash for height {height}: {hash}"),
            })?
        } else {
            Self::validate_hash("id", id.as_str())?
        };

        self.get(network, &["block", &hash]).await
    }

    /// `GET /v1/blocks`, the most recent blocks
    pub async fn recent_blocks(&self, network: BitcoinNetwork) -> Result<Value, UpstreamError> {
        self.get(network, &["v1", "blocks"]).await
    }

    /// `GET /mempool/recent`, the most recent unconfirmed transactions
    pub async fn mempool_recent(&self, network: BitcoinNetwork) -> Result<Value, UpstreamError> {
        self.get(network, &["mempool", "recent"]).await
    }

    /// `GET /blocks/tip/height`
    pub async fn tip_height(&self, network: BitcoinNetwork) -> Result<u64, UpstreamError> {
        let url = self.url(network, &["blocks", "tip", "height"])?;
        let text = self.upstream.get_text(url, &[]).await?;
        text.parse().map_err(|_| UpstreamError::InvalidResponse {
            message: format!("unexpected tip height: {text}"),
        })
    }

    /// `GET /v1/fees/recommended`, missing rates default to zero
    pub async fn fee_estimate(&self, network: BitcoinNetwork) -> Result<FeeEstimate, UpstreamError> {
        let url = self.url(network, &["v1", "fees", "recommended"])?;
        self.upstream.get_typed(url, &[]).await.inspect_err(|e| {
            error!(network = %network, error = %e, "failed to fetch fee estimate");
        })
    }

    /// Fetch a transaction and project it into [`BitcoinTransferDetails`]
    pub async fn transfer_details(
        &self,
        network: BitcoinNetwork,
        txid: &str,
    ) -> Result<BitcoinTransferDetails, UpstreamError> {
        let txid = Self::validate_hash("id", txid)?;
        let url = self.url(network, &["tx", &txid])?;
        let raw: MempoolTransaction = self.upstream.get_typed(url, &[]).await?;
        info!(txid = %raw.txid, network = %network, "fetched bitcoin transaction");
        Ok(Self::convert_transaction(raw))
    }

    fn convert_transaction(raw: MempoolTransaction) -> BitcoinTransferDetails {
        let inputs: Vec<TransferLeg> = raw
            .vin
            .into_iter()
            .map(|input| {
                let prevout = input.prevout.unwrap_or_default();
                TransferLeg {
                    address: prevout.scriptpubkey_address,
                    value: prevout.value,
                }
            })
            .collect();
        let outputs: Vec<TransferLeg> = raw
            .vout
            .into_iter()
            .map(|output| TransferLeg {
                address: output.scriptpubkey_address,
                value: output.value,
            })
            .collect();

        BitcoinTransferDetails {
            txid: raw.txid,
            confirmed: raw.status.confirmed,
            block_height: raw.status.block_height,
            block_hash: raw.status.block_hash,
            block_time: raw.status.block_time,
            fee: raw.fee,
            size: raw.size,
            weight: raw.weight,
            total_input: inputs.iter().map(|leg| leg.value).sum(),
            total_output: outputs.iter().map(|leg| leg.value).sum(),
            inputs,
            outputs,
        }
    }
}

impl ApiClient for BitcoinClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url(BitcoinNetwork::Mainnet, &["blocks", "tip", "height"])?;
        debug!(url = %url, "performing health check on Bitcoin API");

        let status = self.upstream.probe(url, &[]).await?;
        let health = HealthStatus::from_probe_status(status);
        if !matches!(health, HealthStatus::Up) {
            warn!(status = status.as_u16(), "Bitcoin API health check failed");
        }
        Ok(health)
    }

    fn name(&self) -> &'static str {
        "bitcoin"
    }
}
