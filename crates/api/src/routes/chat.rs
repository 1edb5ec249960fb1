// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Streamed transaction analysis route

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use futures::{StreamExt, TryStreamExt};
use shared_types::AnalysisNetwork;
use tracing::{error, info};
use tx_analyzer::ChatRequest;

use crate::{error::ServerResult, extractors::JsonExtractor, metrics, state::ServerState};

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Explain a transaction with a streamed chat completion
///
/// When `txHash` is set and `network` is `bitcoin` or `stacks`, the mainnet
/// transaction is fetched first and embedded in the system prompt. Failures
/// before the first byte are JSON error envelopes; once streaming has started
/// an upstream failure ends the body early.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "analysis",
    summary = "Streamed transaction analysis",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Completion text, streamed as it is generated", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed body, empty messages or invalid transaction id", body = serde_json::Value),
        (status = 503, description = "OPENAI_API_KEY is not configured", body = serde_json::Value)
    )
)]
pub async fn chat_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<ChatRequest>,
) -> ServerResult<Response> {
    let requested = AnalysisNetwork::from_hint(request.network.as_deref());

    let stream = match state.analyzer().analyze(request).await {
        Ok(stream) => stream,
        Err(e) => {
            metrics::inc_chat_completions(requested.kind(), "rejected");
            return Err(e.into());
        }
    };

    let network = stream.network.kind();
    metrics::inc_chat_completions(network, "started");
    info!(network, "streaming chat completion");

    let deltas = stream
        .deltas
        .inspect_err(move |e| {
            metrics::inc_chat_completions(network, "interrupted");
            error!(network, error = %e, "chat completion stream failed");
        })
        .take_until(state.cancellation_token.clone().cancelled_owned());

    Ok((
        [
            (header::CONTENT_TYPE, TEXT_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(deltas),
    )
        .into_response())
}
