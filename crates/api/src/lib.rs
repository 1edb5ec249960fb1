// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Explorer API Server Implementation
//!
//! This crate provides the HTTP server for the Bitcoin and Stacks explorer
//! backend, built with Axum. It fronts mempool.space, the Hiro Stacks API and
//! Rebar Labs, and streams LLM explanations of transactions.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and JSON error envelopes with proper status codes
//! - [`extractors`]: JSON body and query extractors that answer with the error envelope
//! - [`state`]: Shared application state and aggregated health checks
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: Rate limiting and request accounting
//! - [`metrics`]: Prometheus counters and histograms
//! - [`docs`] and [`openapi`]: `OpenAPI` document and Swagger UI
//!
//! # Key Features
//!
//! - **Upstream passthrough**: Explorer JSON is returned unchanged, with upstream status codes
//! - **Normalization**: Transaction details and wallet activity in one shape across chains
//! - **Streamed analysis**: Chat completions forwarded chunk by chunk as `text/plain`
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken` with timeouts
//! - **Rate Limiting**: IP-based request limiting with configurable requests per minute
//! - **Health Monitoring**: Aggregated health checks across all upstream providers

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
