// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockchain network identifiers and static network configuration
//!
//! This module provides type-safe network identifiers for the Bitcoin and Stacks
//! chains together with the immutable [`NetworkConfig`] table that maps each
//! network to its upstream REST root and human-facing explorer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported blockchains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Bitcoin layer 1
    Bitcoin,
    /// Stacks layer 2
    Stacks,
}

impl Chain {
    /// Returns the lowercase name of the chain
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Stacks => "stacks",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(Self::Bitcoin),
            "stacks" | "stx" => Ok(Self::Stacks),
            _ => Err(NetworkParseError::InvalidChain(s.to_string())),
        }
    }
}

/// Static endpoint table for a single network
///
/// Loaded once as const data and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name as accepted by the `network` query parameter
    pub name: &'static str,
    /// Upstream REST root, without trailing slash
    pub api_base_url: &'static str,
    /// Human-facing block explorer root
    pub explorer_url: &'static str,
}

const BITCOIN_MAINNET: NetworkConfig = NetworkConfig {
    name: "mainnet",
    api_base_url: "https://mempool.space/api",
    explorer_url: "https://mempool.space",
};

const BITCOIN_TESTNET: NetworkConfig = NetworkConfig {
    name: "testnet",
    api_base_url: "https://mempool.space/testnet/api",
    explorer_url: "https://mempool.space/testnet",
};

const BITCOIN_SIGNET: NetworkConfig = NetworkConfig {
    name: "signet",
    api_base_url: "https://mempool.space/signet/api",
    explorer_url: "https://mempool.space/signet",
};

const STACKS_MAINNET: NetworkConfig = NetworkConfig {
    name: "mainnet",
    api_base_url: "https://api.hiro.so",
    explorer_url: "https://explorer.hiro.so",
};

const STACKS_TESTNET: NetworkConfig = NetworkConfig {
    name: "testnet",
    api_base_url: "https://api.testnet.hiro.so",
    explorer_url: "https://explorer.hiro.so",
};

impl NetworkConfig {
    /// Explorer link for a transaction
    pub fn transaction_url(&self, id: &str) -> String {
        self.explorer_link("tx", id)
    }

    /// Explorer link for an address
    pub fn address_url(&self, address: &str) -> String {
        self.explorer_link("address", address)
    }

    /// Explorer link for a block
    pub fn block_url(&self, id: &str) -> String {
        self.explorer_link("block", id)
    }

    fn explorer_link(&self, kind: &str, id: &str) -> String {
        // Hiro's explorer selects the network with a query parameter instead of a path prefix
        if self.explorer_url.contains("hiro.so") {
            format!("{}/{kind}/{id}?chain={}", self.explorer_url, self.name)
        } else {
            format!("{}/{kind}/{id}", self.explorer_url)
        }
    }
}

/// Bitcoin networks served by the mempool.space style REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BitcoinNetwork {
    /// Bitcoin mainnet
    #[default]
    Mainnet,
    /// Bitcoin testnet3
    Testnet,
    /// Bitcoin signet
    Signet,
}

impl BitcoinNetwork {
    /// Returns the static endpoint table for this network
    pub const fn config(self) -> &'static NetworkConfig {
        match self {
            Self::Mainnet => &BITCOIN_MAINNET,
            Self::Testnet => &BITCOIN_TESTNET,
            Self::Signet => &BITCOIN_SIGNET,
        }
    }

    /// Returns all Bitcoin networks
    pub const fn all() -> &'static [Self] {
        &[Self::Mainnet, Self::Testnet, Self::Signet]
    }

    /// Parses an optional query parameter, defaulting to mainnet when absent
    pub fn from_param(param: Option<&str>) -> Result<Self, NetworkParseError> {
        match param {
            None => Ok(Self::default()),
            Some(value) if value.trim().is_empty() => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }
}

impl fmt::Display for BitcoinNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().name)
    }
}

impl FromStr for BitcoinNetwork {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" | "test" | "testnet3" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            _ => Err(NetworkParseError::InvalidNetwork(s.to_string())),
        }
    }
}

/// Stacks networks served by the Hiro API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StacksNetwork {
    /// Stacks mainnet
    #[default]
    Mainnet,
    /// Stacks testnet
    Testnet,
}

impl StacksNetwork {
    /// Returns the static endpoint table for this network
    pub const fn config(self) -> &'static NetworkConfig {
        match self {
            Self::Mainnet => &STACKS_MAINNET,
            Self::Testnet => &STACKS_TESTNET,
        }
    }

    /// Returns all Stacks networks
    pub const fn all() -> &'static [Self] {
        &[Self::Mainnet, Self::Testnet]
    }

    /// Parses an optional query parameter, defaulting to mainnet when absent
    pub fn from_param(param: Option<&str>) -> Result<Self, NetworkParseError> {
        match param {
            None => Ok(Self::default()),
            Some(value) if value.trim().is_empty() => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }
}

impl fmt::Display for StacksNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().name)
    }
}

impl FromStr for StacksNetwork {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            _ => Err(NetworkParseError::InvalidNetwork(s.to_string())),
        }
    }
}

/// Error type for network and chain parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkParseError {
    /// Unknown network name
    #[error("unsupported network: {0}")]
    InvalidNetwork(String),
    /// Unknown chain name
    #[error("unsupported chain: {0}. Supported chains are: bitcoin, stacks")]
    InvalidChain(String),
}
