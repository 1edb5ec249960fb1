// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Network discriminator for transaction analysis requests

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const SIDECHAIN_PREFIX: &str = "sidechain-";

/// Network hint attached to a chat analysis request
///
/// Any value starting with `sidechain-` names a sidechain; anything that is
/// neither `bitcoin`, `stacks` nor a sidechain is [`AnalysisNetwork::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AnalysisNetwork {
    /// Bitcoin mainnet
    Bitcoin,
    /// Stacks mainnet
    Stacks,
    /// A named sidechain, e.g. `sidechain-thunder` carries `thunder`
    Sidechain(String),
    /// No hint or an unrecognised one
    #[default]
    Unknown,
}

impl AnalysisNetwork {
    /// Classifies an optional network hint
    pub fn from_hint(hint: Option<&str>) -> Self {
        let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
            return Self::Unknown;
        };

        let lower = hint.to_lowercase();
        match lower.as_str() {
            "bitcoin" | "btc" => Self::Bitcoin,
            "stacks" | "stx" => Self::Stacks,
            _ => match lower.strip_prefix(SIDECHAIN_PREFIX) {
                Some(name) if !name.is_empty() => Self::Sidechain(name.to_string()),
                _ => Self::Unknown,
            },
        }
    }

    /// Short label used for logging and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Stacks => "stacks",
            Self::Sidechain(_) => "sidechain",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AnalysisNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sidechain(name) => write!(f, "{SIDECHAIN_PREFIX}{name}"),
            other => f.write_str(other.kind()),
        }
    }
}

impl Serialize for AnalysisNetwork {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AnalysisNetwork {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hint = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_hint(hint.as_deref()))
    }
}
