// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the explorer API
//! server.

pub mod chat;
pub mod explorer;
pub mod handlers;
pub mod rebar;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use chat::chat_handler;
use explorer::{bitcoin_handler, stacks_handler};
use handlers::{activity_handler, health_handler, proxy_handler, transaction_handler};
use rebar::{brc20_handler, inscriptions_handler, rebar_handler, runes_handler};

use crate::{
    metrics::metrics_handler,
    middleware::{RateLimiter, rate_limiting_middleware, track_requests},
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes with conditional rate limiting
#[allow(clippy::needless_pass_by_value)]
pub fn create_routes(rate_limiter: RateLimiter) -> Router<ServerState> {
    // Monitoring endpoints are not rate limited
    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let mut api_routes = Router::new()
        .route("/proxy", get(proxy_handler))
        .route("/bitcoin", get(bitcoin_handler))
        .route("/stacks", get(stacks_handler))
        .route("/rebar", get(rebar_handler))
        .route("/rebar/runes", get(runes_handler))
        .route("/rebar/brc20", get(brc20_handler))
        .route("/rebar/inscriptions", get(inscriptions_handler))
        .route("/transaction", get(transaction_handler))
        .route("/activity", get(activity_handler))
        .route("/chat", post(chat_handler));

    if rate_limiter.is_enabled() {
        api_routes = api_routes.layer(middleware::from_fn_with_state(
            rate_limiter.clone(),
            rate_limiting_middleware,
        ));
    }

    Router::new()
        .merge(health_routes)
        .merge(docs_routes)
        .nest("/api", api_routes)
        .layer(middleware::from_fn(track_requests))
}
