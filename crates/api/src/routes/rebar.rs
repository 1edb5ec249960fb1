// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rebar Labs routes: the passthrough plus typed runes, BRC-20 and
//! inscription queries

use std::str::FromStr;

use axum::{Json, extract::State};
use external_apis::Page;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{NoneAsEmptyString, serde_as};
use tracing::debug;
use utoipa::IntoParams;

use super::handlers::{required, resource_type};
use crate::{
    error::ServerResult, extractors::QueryExtractor, metrics::observe_upstream,
    state::ServerState,
};

const ENDPOINT_PARAM: &str = "endpoint";

/// Forward a relative Rebar Labs endpoint
///
/// Every query parameter other than `endpoint` is forwarded unchanged.
#[utoipa::path(
    get,
    path = "/api/rebar",
    tag = "rebar",
    summary = "Rebar Labs passthrough",
    description = "Forwards endpoint (a relative path such as runes/v1/etchings) to Rebar Labs with the remaining query parameters. Absolute URLs and dot segments are rejected.",
    params(
        ("endpoint" = String, Query, description = "Relative Rebar Labs path")
    ),
    responses(
        (status = 200, description = "Upstream JSON", body = serde_json::Value),
        (status = 400, description = "Missing or invalid endpoint", body = serde_json::Value)
    )
)]
pub async fn rebar_handler(
    State(state): State<ServerState>,
    QueryExtractor(params): QueryExtractor<Vec<(String, String)>>,
) -> ServerResult<Json<Value>> {
    let endpoint = params
        .iter()
        .find(|(key, _)| key == ENDPOINT_PARAM)
        .map(|(_, value)| value.as_str());
    let endpoint = required(ENDPOINT_PARAM, endpoint)?;

    let forwarded: Vec<(String, String)> = params
        .iter()
        .filter(|(key, _)| key != ENDPOINT_PARAM)
        .cloned()
        .collect();
    debug!(endpoint, forwarded = forwarded.len(), "rebar passthrough");

    let body = observe_upstream(
        "rebar",
        state.api_registry().rebar().passthrough(endpoint, &forwarded),
    )
    .await?;
    Ok(Json(body))
}

/// Query for the typed Rebar routes
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RebarQuery {
    /// Resource to fetch
    #[serde(rename = "type", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub resource: Option<String>,
    /// Rune id or name, BRC-20 ticker, or address depending on `type`
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub id: Option<String>,
    /// Ticker filter for `brc20?type=tokens`
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub ticker: Option<String>,
    /// Items to skip
    #[serde(default)]
    pub offset: Option<u32>,
    /// Page size, capped at 60
    #[serde(default)]
    pub limit: Option<u32>,
}

impl RebarQuery {
    fn page(&self) -> Page {
        Page {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// `type` values accepted by `/api/rebar/runes`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunesResource {
    /// `etchings`, every rune
    Etchings,
    /// `etching`, one rune by id or name
    Etching,
    /// `holders` of a rune
    Holders,
    /// `balances` of an address
    Balances,
}

impl FromStr for RunesResource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "etchings" => Ok(Self::Etchings),
            "etching" => Ok(Self::Etching),
            "holders" => Ok(Self::Holders),
            "balances" => Ok(Self::Balances),
            _ => Err(()),
        }
    }
}

/// `type` values accepted by `/api/rebar/brc20`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brc20Resource {
    /// `tokens`, optionally filtered by `ticker`
    Tokens,
    /// `token` by ticker
    Token,
    /// `balances` of an address
    Balances,
}

impl FromStr for Brc20Resource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tokens" => Ok(Self::Tokens),
            "token" => Ok(Self::Token),
            "balances" => Ok(Self::Balances),
            _ => Err(()),
        }
    }
}

/// Runes etchings, holders and balances
#[utoipa::path(
    get,
    path = "/api/rebar/runes",
    tag = "rebar",
    summary = "Runes queries",
    description = "type is one of etchings, etching, holders, balances. etching and holders take a rune id or name as id; balances takes an address.",
    params(RebarQuery),
    responses(
        (status = 200, description = "Upstream JSON", body = serde_json::Value),
        (status = 400, description = "Invalid type or missing id", body = serde_json::Value)
    )
)]
pub async fn runes_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<RebarQuery>,
) -> ServerResult<Json<Value>> {
    let resource: RunesResource = resource_type(query.resource.as_deref())?;
    let id = || required("id", query.id.as_deref());
    let page = query.page();
    let client = state.api_registry().rebar();

    let body = match resource {
        RunesResource::Etchings => observe_upstream("rebar", client.runes(page)).await?,
        RunesResource::Etching => observe_upstream("rebar", client.rune(id()?)).await?,
        RunesResource::Holders => {
            observe_upstream("rebar", client.rune_holders(id()?, page)).await?
        }
        RunesResource::Balances => {
            observe_upstream("rebar", client.address_rune_balances(id()?, page)).await?
        }
    };
    Ok(Json(body))
}

/// BRC-20 tokens and balances
#[utoipa::path(
    get,
    path = "/api/rebar/brc20",
    tag = "rebar",
    summary = "BRC-20 queries",
    description = "type is one of tokens, token, balances. token takes a ticker as id; balances takes an address.",
    params(RebarQuery),
    responses(
        (status = 200, description = "Upstream JSON", body = serde_json::Value),
        (status = 400, description = "Invalid type or missing id", body = serde_json::Value)
    )
)]
pub async fn brc20_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<RebarQuery>,
) -> ServerResult<Json<Value>> {
    let resource: Brc20Resource = resource_type(query.resource.as_deref())?;
    let id = || required("id", query.id.as_deref());
    let page = query.page();
    let client = state.api_registry().rebar();

    let body = match resource {
        Brc20Resource::Tokens => {
            observe_upstream("rebar", client.brc20_tokens(query.ticker.as_deref(), page)).await?
        }
        Brc20Resource::Token => observe_upstream("rebar", client.brc20_token(id()?)).await?,
        Brc20Resource::Balances => {
            observe_upstream("rebar", client.brc20_balances(id()?, page)).await?
        }
    };
    Ok(Json(body))
}

/// Ordinals inscriptions owned by an address
#[utoipa::path(
    get,
    path = "/api/rebar/inscriptions",
    tag = "rebar",
    summary = "Inscriptions by address",
    params(RebarQuery),
    responses(
        (status = 200, description = "Upstream JSON", body = serde_json::Value),
        (status = 400, description = "Missing id", body = serde_json::Value)
    )
)]
pub async fn inscriptions_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<RebarQuery>,
) -> ServerResult<Json<Value>> {
    let address = required("id", query.id.as_deref())?;
    let body = observe_upstream(
        "rebar",
        state.api_registry().rebar().inscriptions(address, query.page()),
    )
    .await?;
    Ok(Json(body))
}
