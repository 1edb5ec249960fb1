// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Hiro Stacks API integration
//!
//! Implements the `ApiClient` trait for the Hiro Stacks API. When a Hiro API
//! key is configured every request carries it in the `x-hiro-api-key` header.

use std::{collections::HashMap, time::Duration};

use api_client::{
    ApiClient, ApiError, ContractCall, HealthStatus, StacksTransferDetails, TokenTransfer,
};
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::StacksNetwork;
use tracing::{debug, error, info, warn};
use url::Url;
use utoipa::ToSchema;

use crate::{
    non_empty_string::NonEmptyString,
    proxy::HIRO_API_KEY_HEADER,
    upstream::{UpstreamClient, UpstreamError, api_key_header, endpoint, parse_base_url},
};

const DEFAULT_STACKS_TIMEOUT_SECONDS: u64 = 10;

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size the Hiro API accepts
pub const MAX_LIMIT: u32 = 50;

const SBTC_MAINNET_CONTRACT: &str = "SM3VDXK3WZZSA84XXFKAFAF15NNZX32CTSG82JFQ4.sbtc-token";
const SBTC_TESTNET_CONTRACT: &str = "ST1F7QA2MDF17S807EPA36TSS8AMEFY4KA9TVGWXT.sbtc-token";

/// Configuration for the Stacks API client
#[derive(Debug, Clone)]
pub struct StacksConfig {
    /// REST root per network
    pub base_urls: HashMap<StacksNetwork, String>,
    /// Optional Hiro API key
    pub hiro_api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for StacksConfig {
    fn default() -> Self {
        Self {
            base_urls: StacksNetwork::all()
                .iter()
                .map(|network| (*network, network.config().api_base_url.to_string()))
                .collect(),
            hiro_api_key: None,
            timeout_seconds: DEFAULT_STACKS_TIMEOUT_SECONDS,
        }
    }
}

impl StacksConfig {
    /// Serve every network from a single REST root
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_urls: StacksNetwork::all()
                .iter()
                .map(|network| (*network, base_url.clone()))
                .collect(),
            ..Self::default()
        }
    }
}

/// sBTC holdings of a principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SbtcBalance {
    /// Queried principal
    pub principal: String,
    /// Network queried
    pub network: StacksNetwork,
    /// Fungible token key of the sBTC asset, when the principal holds it
    pub asset_identifier: Option<String>,
    /// Balance in satoshis as a decimal string, `"0"` when not held
    pub balance: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HiroTransaction {
    tx_id: String,
    tx_type: String,
    tx_status: String,
    sender_address: String,
    fee_rate: String,
    nonce: u64,
    block_height: Option<u64>,
    burn_block_time: Option<u64>,
    token_transfer: Option<HiroTokenTransfer>,
    contract_call: Option<HiroContractCall>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HiroTokenTransfer {
    recipient_address: String,
    amount: String,
    memo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HiroContractCall {
    contract_id: String,
    function_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HiroBalances {
    fungible_tokens: HashMap<String, HiroTokenBalance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HiroTokenBalance {
    balance: String,
}

/// Hiro Stacks API client
#[derive(Debug)]
pub struct StacksClient {
    upstream: UpstreamClient,
    base_urls: HashMap<StacksNetwork, Url>,
    api_key: Option<(HeaderName, HeaderValue)>,
}

impl StacksClient {
    /// Create a new Stacks API client
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL or the API key is invalid, or the HTTP
    /// client cannot be created
    pub fn new(config: StacksConfig) -> Result<Self, UpstreamError> {
        let mut base_urls = HashMap::new();
        for network in StacksNetwork::all() {
            let raw = config.base_urls.get(network).ok_or_else(|| {
                UpstreamError::Config(format!("no base URL configured for stacks {network}"))
            })?;
            base_urls.insert(*network, parse_base_url(raw)?);
        }

        let api_key = config
            .hiro_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| api_key_header(&HIRO_API_KEY_HEADER, key))
            .transpose()?;

        if api_key.is_none() {
            debug!("no Hiro API key configured, using anonymous rate limits");
        }

        Ok(Self {
            upstream: UpstreamClient::new(Duration::from_secs(config.timeout_seconds))?,
            base_urls,
            api_key,
        })
    }

    /// Clamp a requested page size to `1..=50`, defaulting to 20
    pub fn clamp_limit(limit: Option<u32>) -> u32 {
        limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Normalize a transaction id to the `0x` prefixed form Hiro expects
    pub fn normalize_tx_id(id: &str) -> Result<String, UpstreamError> {
        let id = NonEmptyString::required("id", id).map_err(UpstreamError::invalid_parameter)?;
        let id = id.as_str();
        let hex = id
            .strip_prefix("0x")
            .or_else(|| id.strip_prefix("0X"))
            .unwrap_or(id);
        Ok(format!("0x{}", hex.to_lowercase()))
    }

    /// sBTC token contract for a network
    pub fn sbtc_contract(network: StacksNetwork) -> &'static str {
        match network {
            StacksNetwork::Mainnet => SBTC_MAINNET_CONTRACT,
            StacksNetwork::Testnet => SBTC_TESTNET_CONTRACT,
        }
    }

    fn url(
        &self,
        network: StacksNetwork,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Url, UpstreamError> {
        let base = self.base_urls.get(&network).ok_or_else(|| {
            UpstreamError::Config(format!("no base URL configured for stacks {network}"))
        })?;
        let mut url = endpoint(base, segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        self.api_key.iter().cloned().collect()
    }

    async fn get(
        &self,
        network: StacksNetwork,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, UpstreamError> {
        let url = self.url(network, segments, query)?;
        self.upstream
            .get_json(url, &self.headers())
            .await
            .inspect_err(|e| {
                error!(network = %network, path = %segments.join("/"), error = %e, "stacks request failed");
            })
    }

    /// `GET /extended/v1/tx/{tx_id}`
    pub async fn transaction(&self, network: StacksNetwork, id: &str) -> Result<Value, UpstreamError> {
        let tx_id = Self::normalize_tx_id(id)?;
        self.get(network, &["extended", "v1", "tx", &tx_id], &[]).await
    }

    /// `GET /extended/v1/address/{principal}/balances`
    pub async fn address(&self, network: StacksNetwork, principal: &str) -> Result<Value, UpstreamError> {
        let principal =
            NonEmptyString::required("id", principal).map_err(UpstreamError::invalid_parameter)?;
        self.get(
            network,
            &["extended", "v1", "address", principal.as_str(), "balances"],
            &[],
        )
        .await
    }

    /// `GET /extended/v1/address/{principal}/transactions`
    pub async fn address_transactions(
        &self,
        network: StacksNetwork,
        principal: &str,
        limit: Option<u32>,
    ) -> Result<Value, UpstreamError> {
        let principal =
            NonEmptyString::required("id", principal).map_err(UpstreamError::invalid_parameter)?;
        self.get(
            network,
            &["extended", "v1", "address", principal.as_str(), "transactions"],
            &[("limit", Self::clamp_limit(limit).to_string())],
        )
        .await
    }

    /// `GET /extended/v2/blocks/{height_or_hash}`
    pub async fn block(&self, network: StacksNetwork, id: &str) -> Result<Value, UpstreamError> {
        let id = NonEmptyString::required("id", id).map_err(UpstreamError::invalid_parameter)?;
        self.get(network, &["extended", "v2", "blocks", id.as_str()], &[])
            .await
    }

    /// `GET /extended/v2/blocks`
    pub async fn recent_blocks(
        &self,
        network: StacksNetwork,
        limit: Option<u32>,
    ) -> Result<Value, UpstreamError> {
        self.get(
            network,
            &["extended", "v2", "blocks"],
            &[("limit", Self::clamp_limit(limit).to_string())],
        )
        .await
    }

    /// `GET /extended/v1/tx/mempool`
    pub async fn mempool(&self, network: StacksNetwork, limit: Option<u32>) -> Result<Value, UpstreamError> {
        self.get(
            network,
            &["extended", "v1", "tx", "mempool"],
            &[("limit", Self::clamp_limit(limit).to_string())],
        )
        .await
    }

    /// `GET /extended/v1/tx`
    pub async fn recent_transactions(
        &self,
        network: StacksNetwork,
        limit: Option<u32>,
    ) -> Result<Value, UpstreamError> {
        self.get(
            network,
            &["extended", "v1", "tx"],
            &[("limit", Self::clamp_limit(limit).to_string())],
        )
        .await
    }

    /// Read the principal's balances and pick out the sBTC token entry
    pub async fn sbtc_balance(
        &self,
        network: StacksNetwork,
        principal: &str,
    ) -> Result<SbtcBalance, UpstreamError> {
        let principal =
            NonEmptyString::required("id", principal).map_err(UpstreamError::invalid_parameter)?;
        let url = self.url(
            network,
            &["extended", "v1", "address", principal.as_str(), "balances"],
            &[],
        )?;
        let balances: HiroBalances = self.upstream.get_typed(url, &self.headers()).await?;

        Ok(Self::extract_sbtc(network, principal.as_str(), balances))
    }

    fn extract_sbtc(network: StacksNetwork, principal: &str, balances: HiroBalances) -> SbtcBalance {
        let contract = Self::sbtc_contract(network);
        let entry = balances
            .fungible_tokens
            .into_iter()
            .find(|(asset, _)| asset.split("::").next() == Some(contract));

        match entry {
            Some((asset_identifier, token)) => SbtcBalance {
                principal: principal.to_string(),
                network,
                asset_identifier: Some(asset_identifier),
                balance: if token.balance.is_empty() {
                    "0".to_string()
                } else {
                    token.balance
                },
            },
            None => SbtcBalance {
                principal: principal.to_string(),
                network,
                asset_identifier: None,
                balance: "0".to_string(),
            },
        }
    }

    /// Fetch a transaction and project it into [`StacksTransferDetails`]
    pub async fn transfer_details(
        &self,
        network: StacksNetwork,
        id: &str,
    ) -> Result<StacksTransferDetails, UpstreamError> {
        let tx_id = Self::normalize_tx_id(id)?;
        let url = self.url(network, &["extended", "v1", "tx", &tx_id], &[])?;
        let raw: HiroTransaction = self.upstream.get_typed(url, &self.headers()).await?;
        info!(tx_id = %raw.tx_id, network = %network, "fetched stacks transaction");
        Ok(Self::convert_transaction(raw))
    }

    fn convert_transaction(raw: HiroTransaction) -> StacksTransferDetails {
        StacksTransferDetails {
            tx_id: raw.tx_id,
            tx_type: raw.tx_type,
            tx_status: raw.tx_status,
            sender_address: raw.sender_address,
            fee_rate: raw.fee_rate,
            nonce: raw.nonce,
            block_height: raw.block_height,
            burn_block_time: raw.burn_block_time,
            token_transfer: raw.token_transfer.map(|transfer| TokenTransfer {
                recipient: transfer.recipient_address,
                amount: transfer.amount,
                memo: transfer.memo,
            }),
            contract_call: raw.contract_call.map(|call| ContractCall {
                contract_id: call.contract_id,
                function_name: call.function_name,
            }),
        }
    }
}

impl ApiClient for StacksClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = self.url(StacksNetwork::Mainnet, &["extended"], &[])?;
        debug!(url = %url, "performing health check on Stacks API");

        let status = self.upstream.probe(url, &self.headers()).await?;
        let health = HealthStatus::from_probe_status(status);
        if !matches!(health, HealthStatus::Up) {
            warn!(status = status.as_u16(), "Stacks API health check failed");
        }
        Ok(health)
    }

    fn name(&self) -> &'static str {
        "stacks"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamping() {
        assert_eq!(StacksClient::clamp_limit(None), 20);
        assert_eq!(StacksClient::clamp_limit(Some(0)), 1);
        assert_eq!(StacksClient::clamp_limit(Some(10)), 10);
        assert_eq!(StacksClient::clamp_limit(Some(500)), 50);
    }

    #[test]
    fn tx_id_normalization() {
        assert_eq!(StacksClient::normalize_tx_id("ABCD").unwrap(), "0xabcd");
        assert_eq!(StacksClient::normalize_tx_id("0xabcd").unwrap(), "0xabcd");
        assert_eq!(StacksClient::normalize_tx_id(" 0XAbCd ").unwrap(), "0xabcd");
        assert!(StacksClient::normalize_tx_id("").is_err());
    }

    #[test]
    fn invalid_api_key_is_rejected() {
        let config = StacksConfig {
            hiro_api_key: Some("bad\nkey".to_string()),
            ..StacksConfig::default()
        };
        assert!(matches!(StacksClient::new(config), Err(UpstreamError::Config(_))));

        let config = StacksConfig {
            hiro_api_key: Some("  ".to_string()),
            ..StacksConfig::default()
        };
        let client = StacksClient::new(config).unwrap();
        assert!(client.headers().is_empty());
    }

    #[test]
    fn sbtc_extraction() {
        let balances: HiroBalances = serde_json::from_value(serde_json::json!({
            "stx": {"balance": "1000"},
            "fungible_tokens": {
                "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.arkadiko-token::diko": {"balance": "5"},
                "SM3VDXK3WZZSA84XXFKAFAF15NNZX32CTSG82JFQ4.sbtc-token::sbtc-token": {"balance": "250000"}
            }
        }))
        .unwrap();

        let sbtc = StacksClient::extract_sbtc(StacksNetwork::Mainnet, "SP123", balances);
        assert_eq!(sbtc.balance, "250000");
        assert_eq!(
            sbtc.asset_identifier.as_deref(),
            Some("SM3VDXK3WZZSA84XXFKAFAF15NNZX32CTSG82JFQ4.sbtc-token::sbtc-token")
        );

        let sbtc =
            StacksClient::extract_sbtc(StacksNetwork::Testnet, "ST123", HiroBalances::default());
        assert_eq!(sbtc.balance, "0");
        assert!(sbtc.asset_identifier.is_none());
    }

    #[test]
    fn convert_token_transfer() {
        let raw: HiroTransaction = serde_json::from_value(serde_json::json!({
            "tx_id": "0x01",
            "tx_type": "token_transfer",
            "tx_status": "success",
            "sender_address": "SP1SENDER",
            "fee_rate": "180",
            "nonce": 7,
            "block_height": 150_000,
            "burn_block_time": 1_700_000_000,
            "token_transfer": {"recipient_address": "SP2RECIPIENT", "amount": "1000000", "memo": "0x00"}
        }))
        .unwrap();

        let details = StacksClient::convert_transaction(raw);
        assert_eq!(details.nonce, 7);
        let transfer = details.token_transfer.unwrap();
        assert_eq!(transfer.recipient, "SP2RECIPIENT");
        assert_eq!(transfer.amount, "1000000");
        assert!(details.contract_call.is_none());
    }
}
