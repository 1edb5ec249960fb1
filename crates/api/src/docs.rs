// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document definition

use api_client::{
    ActivityFeed, BitcoinTransferDetails, ContractCall, FeeEstimate, StacksTransferDetails,
    TokenTransfer, TransactionDetails, TransferLeg,
};
use external_apis::SbtcBalance;
use shared_types::Chain;
use tx_analyzer::{ChatMessage, ChatRequest, ChatRole};
use utoipa::OpenApi;

use crate::{
    config::Environment,
    routes::{chat, explorer, handlers, rebar},
    state::{HealthCheck, HealthStatus},
};

/// Explorer API documentation
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Explorer API",
        description = "Bitcoin and Stacks explorer data from mempool.space, Hiro and Rebar Labs, with streamed transaction analysis. Upstream JSON is passed through unchanged; errors use the envelope {\"error\", \"status\", \"details\"?}."
    ),
    paths(
        handlers::health_handler,
        handlers::proxy_handler,
        handlers::transaction_handler,
        handlers::activity_handler,
        explorer::bitcoin_handler,
        explorer::stacks_handler,
        rebar::rebar_handler,
        rebar::runes_handler,
        rebar::brc20_handler,
        rebar::inscriptions_handler,
        chat::chat_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        Environment,
        Chain,
        TransactionDetails,
        BitcoinTransferDetails,
        StacksTransferDetails,
        TransferLeg,
        TokenTransfer,
        ContractCall,
        FeeEstimate,
        ActivityFeed,
        SbtcBalance,
        ChatRequest,
        ChatMessage,
        ChatRole,
    )),
    tags(
        (name = "health", description = "Service and upstream health"),
        (name = "proxy", description = "Generic upstream URL proxy"),
        (name = "explorer", description = "Bitcoin and Stacks explorer data"),
        (name = "rebar", description = "Runes, BRC-20 and inscriptions from Rebar Labs"),
        (name = "transactions", description = "Normalized transactions and wallet activity"),
        (name = "analysis", description = "Streamed LLM transaction explanations")
    )
)]
pub struct ApiDoc;
