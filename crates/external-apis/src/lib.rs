// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! External API integrations for blockchain data providers
//!
//! This crate provides implementations of the `ApiClient` trait for the
//! upstream services the explorer reads from, plus a generic URL proxy.
//!
//! # Architecture
//!
//! - **Client Implementations**: [`bitcoin`], [`stacks`], [`rebar`] - specific API integrations
//! - **Generic Proxy**: [`proxy::BlockchainProxy`] - host-scoped API key injection
//! - **Registry Pattern**: [`registry::ApiRegistry`] - owns every client and runs health checks
//! - **Shared HTTP Layer**: [`upstream::UpstreamClient`] - fixed timeouts, error classification
//! - **Validation Utilities**: [`non_empty_string::NonEmptyString`] - ensures non-empty string constraints
//!
//! # Features
//!
//! - **No Retries**: every request either fully succeeds or fully fails
//! - **Status Forwarding**: upstream non-2xx statuses are preserved in [`UpstreamError`]
//! - **Concurrent Health Checks**: Uses `tokio::join!` for efficient health monitoring
//! - **Testing Support**: wiremock backed integration tests under `tests/`

pub mod bitcoin;
pub mod non_empty_string;
pub mod proxy;
pub mod rebar;
pub mod registry;
pub mod stacks;
pub mod upstream;

pub use bitcoin::{BitcoinClient, BitcoinConfig};
pub use non_empty_string::NonEmptyString;
pub use proxy::{BlockchainProxy, HostApiKey, ProxyConfig};
pub use rebar::{Page, RebarClient, RebarConfig};
pub use registry::*;
pub use stacks::{SbtcBalance, StacksClient, StacksConfig};
pub use upstream::{UpstreamClient, UpstreamError};
