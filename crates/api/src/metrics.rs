// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::{future::Future, sync::LazyLock, time::Instant};

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use tracing::error;

/// Total number of API requests, labeled by matched route and status code.
pub static REQUESTS_BY_ROUTE: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "explorer_api_requests_total",
        "Total number of API requests, labeled by route and status",
        &["route", "status"]
    )
    .expect("Failed to create explorer_api_requests_total counter vec")
});

/// Histogram for upstream API request durations in seconds.
pub static UPSTREAM_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "explorer_api_upstream_request_duration",
        "Upstream API request durations in seconds",
        &["provider", "result"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create upstream request duration histogram")
});

/// Chat completions started, labeled by network kind and outcome.
pub static CHAT_COMPLETIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "explorer_api_chat_completions_total",
        "Total number of chat completions, labeled by network kind and result",
        &["network", "result"]
    )
    .expect("Failed to create explorer_api_chat_completions_total counter vec")
});

/// Increment the requests counter
///
/// # Arguments
/// * `route` - The matched route template, e.g. `/api/bitcoin`
/// * `status` - The response status code
pub fn inc_requests_by_route(route: &str, status: StatusCode) {
    REQUESTS_BY_ROUTE
        .with_label_values(&[route, status.as_str()])
        .inc();
}

/// Observe the duration of an upstream request
pub fn observe_upstream_duration(provider: &str, result: &str, duration_secs: f64) {
    UPSTREAM_REQUEST_DURATION
        .with_label_values(&[provider, result])
        .observe(duration_secs);
}

/// Count a chat completion
pub fn inc_chat_completions(network: &str, result: &str) {
    CHAT_COMPLETIONS.with_label_values(&[network, result]).inc();
}

/// Run an upstream call and record its duration under `provider`
pub async fn observe_upstream<T, E, F>(provider: &str, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let result = call.await;
    let outcome = if result.is_ok() { "success" } else { "error" };
    observe_upstream_duration(provider, outcome, started.elapsed().as_secs_f64());
    result
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
