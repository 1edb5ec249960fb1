// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bitcoin and Stacks explorer routes
//!
//! Both routes take a `type` discriminator selecting one client method.
//! Parameters are checked in a fixed order: `network`, then `type`, then `id`,
//! and every check happens before any upstream call.

use std::str::FromStr;

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use external_apis::{bitcoin_network, stacks_network};
use serde::Deserialize;
use serde_with::{NoneAsEmptyString, serde_as};
use utoipa::IntoParams;

use super::handlers::{required, resource_type};
use crate::{error::ServerResult, extractors::QueryExtractor, metrics::observe_upstream, state::ServerState};

/// Query shared by `/api/bitcoin` and `/api/stacks`
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExplorerQuery {
    /// Resource to fetch
    #[serde(rename = "type", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub resource: Option<String>,
    /// Transaction id, block hash or height, address or principal
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub id: Option<String>,
    /// Network name, `mainnet` when absent
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub network: Option<String>,
    /// Page size for Stacks lists, clamped to 1..=50
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `type` values accepted by `/api/bitcoin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitcoinResource {
    /// `transaction`
    Transaction,
    /// `transaction-status`
    TransactionStatus,
    /// `address`
    Address,
    /// `address-transactions`
    AddressTransactions,
    /// `utxos`
    Utxos,
    /// `block`, by hash or height
    Block,
    /// `recent-blocks`
    RecentBlocks,
    /// `mempool`
    Mempool,
    /// `tip-height`
    TipHeight,
    /// `fees`
    Fees,
}

impl FromStr for BitcoinResource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" | "tx" => Ok(Self::Transaction),
            "transaction-status" => Ok(Self::TransactionStatus),
            "address" => Ok(Self::Address),
            "address-transactions" => Ok(Self::AddressTransactions),
            "utxos" => Ok(Self::Utxos),
            "block" => Ok(Self::Block),
            "recent-blocks" => Ok(Self::RecentBlocks),
            "mempool" => Ok(Self::Mempool),
            "tip-height" => Ok(Self::TipHeight),
            "fees" => Ok(Self::Fees),
            _ => Err(()),
        }
    }
}

/// `type` values accepted by `/api/stacks`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StacksResource {
    /// `transaction`
    Transaction,
    /// `address`, the principal's balances
    Address,
    /// `address-transactions`
    AddressTransactions,
    /// `block`, by height or hash
    Block,
    /// `recent-blocks`
    RecentBlocks,
    /// `mempool`
    Mempool,
    /// `recent-transactions`
    RecentTransactions,
    /// `sbtc-balance`
    SbtcBalance,
}

impl FromStr for StacksResource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" | "tx" => Ok(Self::Transaction),
            "address" => Ok(Self::Address),
            "address-transactions" => Ok(Self::AddressTransactions),
            "block" => Ok(Self::Block),
            "recent-blocks" => Ok(Self::RecentBlocks),
            "mempool" => Ok(Self::Mempool),
            "recent-transactions" => Ok(Self::RecentTransactions),
            "sbtc-balance" => Ok(Self::SbtcBalance),
            _ => Err(()),
        }
    }
}

/// Bitcoin explorer data from mempool.space
#[utoipa::path(
    get,
    path = "/api/bitcoin",
    tag = "explorer",
    summary = "Bitcoin explorer data",
    description = "type is one of transaction, transaction-status, address, address-transactions, utxos, block, recent-blocks, mempool, tip-height, fees. Upstream JSON is returned unchanged except for tip-height (a number) and fees (a normalized fee estimate).",
    params(ExplorerQuery),
    responses(
        (status = 200, description = "Upstream JSON", body = serde_json::Value),
        (status = 400, description = "Invalid network or type, or missing id", body = serde_json::Value),
        (status = 404, description = "Forwarded upstream status", body = serde_json::Value)
    )
)]
pub async fn bitcoin_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<ExplorerQuery>,
) -> ServerResult<Response> {
    let network = bitcoin_network(query.network.as_deref())?;
    let resource: BitcoinResource = resource_type(query.resource.as_deref())?;
    let id = || required("id", query.id.as_deref());
    let client = state.api_registry().bitcoin();

    let response = match resource {
        BitcoinResource::Transaction => {
            Json(observe_upstream("bitcoin", client.transaction(network, id()?)).await?).into_response()
        }
        BitcoinResource::TransactionStatus => Json(
            observe_upstream("bitcoin", client.transaction_status(network, id()?)).await?,
        )
        .into_response(),
        BitcoinResource::Address => {
            Json(observe_upstream("bitcoin", client.address(network, id()?)).await?).into_response()
        }
        BitcoinResource::AddressTransactions => Json(
            observe_upstream("bitcoin", client.address_transactions(network, id()?)).await?,
        )
        .into_response(),
        BitcoinResource::Utxos => {
            Json(observe_upstream("bitcoin", client.address_utxos(network, id()?)).await?)
                .into_response()
        }
        BitcoinResource::Block => {
            Json(observe_upstream("bitcoin", client.block(network, id()?)).await?).into_response()
        }
        BitcoinResource::RecentBlocks => {
            Json(observe_upstream("bitcoin", client.recent_blocks(network)).await?).into_response()
        }
        BitcoinResource::Mempool => {
            Json(observe_upstream("bitcoin", client.mempool_recent(network)).await?).into_response()
        }
        BitcoinResource::TipHeight => {
            Json(observe_upstream("bitcoin", client.tip_height(network)).await?).into_response()
        }
        BitcoinResource::Fees => {
            Json(observe_upstream("bitcoin", client.fee_estimate(network)).await?).into_response()
        }
    };

    Ok(response)
}

/// Stacks explorer data from the Hiro API
#[utoipa::path(
    get,
    path = "/api/stacks",
    tag = "explorer",
    summary = "Stacks explorer data",
    description = "type is one of transaction, address, address-transactions, block, recent-blocks, mempool, recent-transactions, sbtc-balance. List types accept limit (1..=50, default 20).",
    params(ExplorerQuery),
    responses(
        (status = 200, description = "Upstream JSON", body = serde_json::Value),
        (status = 400, description = "Invalid network or type, or missing id", body = serde_json::Value),
        (status = 404, description = "Forwarded upstream status", body = serde_json::Value)
    )
)]
pub async fn stacks_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<ExplorerQuery>,
) -> ServerResult<Response> {
    let network = stacks_network(query.network.as_deref())?;
    let resource: StacksResource = resource_type(query.resource.as_deref())?;
    let id = || required("id", query.id.as_deref());
    let limit = query.limit;
    let client = state.api_registry().stacks();

    let response = match resource {
        StacksResource::Transaction => {
            Json(observe_upstream("stacks", client.transaction(network, id()?)).await?).into_response()
        }
        StacksResource::Address => {
            Json(observe_upstream("stacks", client.address(network, id()?)).await?).into_response()
        }
        StacksResource::AddressTransactions => Json(
            observe_upstream(
                "stacks",
                client.address_transactions(network, id()?, limit),
            )
            .await?,
        )
        .into_response(),
        StacksResource::Block => {
            Json(observe_upstream("stacks", client.block(network, id()?)).await?).into_response()
        }
        StacksResource::RecentBlocks => {
            Json(observe_upstream("stacks", client.recent_blocks(network, limit)).await?)
                .into_response()
        }
        StacksResource::Mempool => {
            Json(observe_upstream("stacks", client.mempool(network, limit)).await?).into_response()
        }
        StacksResource::RecentTransactions => Json(
            observe_upstream("stacks", client.recent_transactions(network, limit)).await?,
        )
        .into_response(),
        StacksResource::SbtcBalance => {
            Json(observe_upstream("stacks", client.sbtc_balance(network, id()?)).await?)
                .into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitcoin_resource_names() {
        assert_eq!("tx".parse(), Ok(BitcoinResource::Transaction));
        assert_eq!("tip-height".parse(), Ok(BitcoinResource::TipHeight));
        assert_eq!("utxos".parse(), Ok(BitcoinResource::Utxos));
        assert!("sbtc-balance".parse::<BitcoinResource>().is_err());
    }

    #[test]
    fn stacks_resource_names() {
        assert_eq!("sbtc-balance".parse(), Ok(StacksResource::SbtcBalance));
        assert_eq!(
            "recent-transactions".parse(),
            Ok(StacksResource::RecentTransactions)
        );
        assert!("fees".parse::<StacksResource>().is_err());
    }
}
