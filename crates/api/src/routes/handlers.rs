// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Health checks, the generic proxy, normalized transaction lookups and the
//! wallet activity feed, plus the parameter helpers shared by every route.

use std::str::FromStr;

use api_client::{ActivityFeed, TransactionDetails, WalletInfo};
use axum::{Json, extract::State};
use external_apis::{bitcoin_network, stacks_network};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, serde_as};
use shared_types::Chain;
use tracing::debug;
use utoipa::IntoParams;

use crate::{
    error::{ServerError, ServerResult},
    extractors::QueryExtractor,
    metrics::observe_upstream,
    state::{HealthCheck, ServerState},
};

/// Trimmed value of a required query parameter
pub(crate) fn required<'a>(field: &str, value: Option<&'a str>) -> ServerResult<&'a str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServerError::invalid_parameter(format!("{field} is required")))
}

/// Parse the `type` discriminator
pub(crate) fn resource_type<R: FromStr>(value: Option<&str>) -> ServerResult<R> {
    let value = required("type", value)?;
    value
        .to_lowercase()
        .parse()
        .map_err(|_| ServerError::invalid_parameter(format!("Invalid type parameter: {value}")))
}

fn chain(value: Option<&str>) -> ServerResult<Chain> {
    required("chain", value)?
        .parse()
        .map_err(|_| ServerError::invalid_parameter("Invalid chain parameter"))
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the service version and environment, whether transaction analysis is configured and a probe result for every upstream API (mempool.space, Hiro, Rebar Labs).",
    responses(
        (status = 200, description = "Health report", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check().await)
}

/// Query for `/api/proxy`
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProxyQuery {
    /// Absolute `http` or `https` upstream URL
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub url: Option<String>,
}

/// Generic blockchain data proxy
///
/// Hosts under `hiro.so` and `rebarlabs.io` receive the configured API key
/// header; any other host is fetched without credentials.
#[utoipa::path(
    get,
    path = "/api/proxy",
    tag = "proxy",
    summary = "Fetch an upstream URL",
    params(ProxyQuery),
    responses(
        (status = 200, description = "Upstream JSON body, unchanged", body = serde_json::Value),
        (status = 400, description = "Missing or invalid url", body = serde_json::Value),
        (status = 500, description = "Timeout or transport failure", body = serde_json::Value)
    )
)]
pub async fn proxy_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<ProxyQuery>,
) -> ServerResult<Json<Value>> {
    let url = required("url", query.url.as_deref())?;
    let body = observe_upstream("proxy", state.api_registry().proxy().fetch(url)).await?;
    Ok(Json(body))
}

/// Query for `/api/transaction`
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    /// `bitcoin` or `stacks`
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub chain: Option<String>,
    /// Transaction id
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub id: Option<String>,
    /// Network name, `mainnet` when absent
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub network: Option<String>,
}

/// Normalized transaction details
#[utoipa::path(
    get,
    path = "/api/transaction",
    tag = "transactions",
    summary = "Normalized transaction details",
    description = "Fetches a Bitcoin or Stacks transaction and projects it into a chain-tagged summary with inputs, outputs, fees and confirmation status.",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Transaction details", body = TransactionDetails),
        (status = 400, description = "Missing or invalid chain, network or id", body = serde_json::Value)
    )
)]
pub async fn transaction_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<TransactionQuery>,
) -> ServerResult<Json<TransactionDetails>> {
    let chain = chain(query.chain.as_deref())?;
    // The registry checks the network before the id
    let id = query.id.as_deref().unwrap_or_default();

    let details = observe_upstream(
        chain.name(),
        state
            .api_registry()
            .transaction_details(chain, query.network.as_deref(), id),
    )
    .await?;
    Ok(Json(details))
}

/// Query for `/api/activity`
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Wallet address or Stacks principal
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub address: Option<String>,
    /// `bitcoin` or `stacks`
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub chain: Option<String>,
    /// Network name, `mainnet` when absent
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub network: Option<String>,
}

/// Recent transactions for a connected wallet
#[utoipa::path(
    get,
    path = "/api/activity",
    tag = "transactions",
    summary = "Wallet activity feed",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent transactions, newest first", body = ActivityFeed),
        (status = 400, description = "Missing or invalid parameter", body = serde_json::Value)
    )
)]
pub async fn activity_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<ActivityQuery>,
) -> ServerResult<Json<ActivityFeed>> {
    let chain = chain(query.chain.as_deref())?;
    let network = match chain {
        Chain::Bitcoin => bitcoin_network(query.network.as_deref())?.to_string(),
        Chain::Stacks => stacks_network(query.network.as_deref())?.to_string(),
    };
    let address = required("address", query.address.as_deref())?;

    let wallet =
        WalletInfo::new(address, chain, network.as_str()).map_err(ServerError::invalid_parameter)?;
    debug!(address = wallet.address(), chain = %chain, network = %network, "fetching wallet activity");

    let feed = observe_upstream(chain.name(), state.api_registry().address_activity(&wallet)).await?;
    Ok(Json(feed))
}
