// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the explorer API service
//!
//! This crate provides common types that are shared across multiple crates
//! in the explorer API workspace, avoiding circular dependencies.

pub mod analysis;
pub mod networks;

pub use analysis::AnalysisNetwork;
pub use networks::{BitcoinNetwork, Chain, NetworkConfig, NetworkParseError, StacksNetwork};
