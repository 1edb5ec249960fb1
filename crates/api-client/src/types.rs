// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Normalized data types shared by the upstream clients
//!
//! These are read-only projections of upstream JSON. Optional fields are
//! `None` when upstream omits them; numeric totals default to zero.

use serde::{Deserialize, Serialize};
use shared_types::Chain;
use utoipa::ToSchema;

/// One input or output of a Bitcoin transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferLeg {
    /// Address of the spent or created output, absent for non-standard scripts
    pub address: Option<String>,
    /// Value in satoshis
    pub value: u64,
}

/// Normalized view of a Bitcoin transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BitcoinTransferDetails {
    /// Transaction id
    pub txid: String,
    /// Whether the transaction is mined
    pub confirmed: bool,
    /// Height of the containing block
    pub block_height: Option<u64>,
    /// Hash of the containing block
    pub block_hash: Option<String>,
    /// Block timestamp, seconds since the epoch
    pub block_time: Option<u64>,
    /// Fee in satoshis
    pub fee: u64,
    /// Serialized size in bytes
    pub size: u64,
    /// Weight units
    pub weight: u64,
    /// Spent outputs
    pub inputs: Vec<TransferLeg>,
    /// Created outputs
    pub outputs: Vec<TransferLeg>,
    /// Sum of input values in satoshis
    pub total_input: u64,
    /// Sum of output values in satoshis
    pub total_output: u64,
}

impl BitcoinTransferDetails {
    /// Virtual size in vbytes, rounded up
    pub fn vsize(&self) -> u64 {
        self.weight.div_ceil(4)
    }

    /// Fee rate in sat/vB, `None` when the weight is unknown
    #[allow(clippy::cast_precision_loss)]
    pub fn fee_rate(&self) -> Option<f64> {
        let vsize = self.vsize();
        (vsize > 0).then(|| self.fee as f64 / vsize as f64)
    }
}

/// STX token transfer payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenTransfer {
    /// Recipient principal
    pub recipient: String,
    /// Amount in micro-STX, as a decimal string
    pub amount: String,
    /// Optional memo, hex encoded
    pub memo: Option<String>,
}

/// Contract call payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContractCall {
    /// Fully qualified contract id
    pub contract_id: String,
    /// Called function
    pub function_name: String,
}

/// Normalized view of a Stacks transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StacksTransferDetails {
    /// Transaction id, `0x` prefixed
    pub tx_id: String,
    /// Transaction type, e.g. `token_transfer` or `contract_call`
    pub tx_type: String,
    /// Transaction status, e.g. `success` or `pending`
    pub tx_status: String,
    /// Sender principal
    pub sender_address: String,
    /// Fee in micro-STX, as a decimal string
    pub fee_rate: String,
    /// Sender nonce
    pub nonce: u64,
    /// Stacks block height
    pub block_height: Option<u64>,
    /// Anchoring Bitcoin block time, seconds since the epoch
    pub burn_block_time: Option<u64>,
    /// Present for STX transfers
    pub token_transfer: Option<TokenTransfer>,
    /// Present for contract calls
    pub contract_call: Option<ContractCall>,
}

/// Normalized transaction of either chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "chain", rename_all = "lowercase")]
pub enum TransactionDetails {
    /// Bitcoin transaction
    Bitcoin(BitcoinTransferDetails),
    /// Stacks transaction
    Stacks(StacksTransferDetails),
}

impl TransactionDetails {
    /// Chain the transaction belongs to
    pub fn chain(&self) -> Chain {
        match self {
            Self::Bitcoin(_) => Chain::Bitcoin,
            Self::Stacks(_) => Chain::Stacks,
        }
    }

    /// Transaction id as reported upstream
    pub fn id(&self) -> &str {
        match self {
            Self::Bitcoin(tx) => &tx.txid,
            Self::Stacks(tx) => &tx.tx_id,
        }
    }
}

/// Recommended fee rates in sat/vB
///
/// Field names match the mempool.space `/v1/fees/recommended` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeEstimate {
    /// Next block
    pub fastest_fee: u64,
    /// Within three blocks
    pub half_hour_fee: u64,
    /// Within six blocks
    pub hour_fee: u64,
    /// Low priority
    pub economy_fee: u64,
    /// Mempool purge floor
    pub minimum_fee: u64,
}

/// Wallet identity supplied by the UI after a wallet handshake
///
/// Only the address, chain and network are interpreted; the session blob is
/// opaque and never stored server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WalletInfo {
    address: String,
    /// Chain the wallet is connected to
    pub chain: Chain,
    /// Network name on that chain, e.g. `mainnet`
    pub network: String,
    /// Opaque wallet SDK session data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub session: Option<serde_json::Value>,
}

impl WalletInfo {
    /// Create wallet info, rejecting blank addresses
    pub fn new(
        address: impl Into<String>,
        chain: Chain,
        network: impl Into<String>,
    ) -> Result<Self, String> {
        let address = address.into().trim().to_string();
        if address.is_empty() {
            return Err("wallet address cannot be empty".to_string());
        }

        Ok(Self {
            address,
            chain,
            network: network.into(),
            session: None,
        })
    }

    /// Attach opaque session data
    #[must_use]
    pub fn with_session(mut self, session: serde_json::Value) -> Self {
        self.session = Some(session);
        self
    }

    /// Wallet address
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Recent activity for a wallet address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityFeed {
    /// Wallet address
    pub address: String,
    /// Chain queried
    pub chain: Chain,
    /// Network queried
    pub network: String,
    /// Upstream transaction items in upstream order
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitcoin_details() -> BitcoinTransferDetails {
        BitcoinTransferDetails {
            txid: "ab".repeat(32),
            confirmed: true,
            block_height: Some(840_000),
            block_hash: None,
            block_time: Some(1_713_571_767),
            fee: 1_410,
            size: 222,
            weight: 561,
            inputs: vec![TransferLeg {
                address: Some("bc1qsender".to_string()),
                value: 100_000,
            }],
            outputs: vec![TransferLeg {
                address: Some("bc1qrecipient".to_string()),
                value: 98_590,
            }],
            total_input: 100_000,
            total_output: 98_590,
        }
    }

    #[test]
    fn bitcoin_fee_rate() {
        let details = bitcoin_details();
        assert_eq!(details.vsize(), 141);
        let rate = details.fee_rate().unwrap();
        assert!((rate - 10.0).abs() < f64::EPSILON);

        let unknown_weight = BitcoinTransferDetails {
            weight: 0,
            ..details
        };
        assert!(unknown_weight.fee_rate().is_none());
    }

    #[test]
    fn transaction_details_tagging() {
        let details = TransactionDetails::Bitcoin(bitcoin_details());
        assert_eq!(details.chain(), Chain::Bitcoin);
        assert_eq!(details.id(), "ab".repeat(32));

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["chain"], "bitcoin");
        assert_eq!(json["fee"], 1_410);
    }

    #[test]
    fn fee_estimate_defaults_missing_fields() {
        let estimate: FeeEstimate =
            serde_json::from_str(r#"{"fastestFee": 12, "hourFee": 5}"#).unwrap();
        assert_eq!(estimate.fastest_fee, 12);
        assert_eq!(estimate.hour_fee, 5);
        assert_eq!(estimate.half_hour_fee, 0);
        assert_eq!(estimate.minimum_fee, 0);

        let json = serde_json::to_value(estimate).unwrap();
        assert_eq!(json["fastestFee"], 12);
    }

    #[test]
    fn wallet_info_rejects_blank_address() {
        assert!(WalletInfo::new("   ", Chain::Bitcoin, "mainnet").is_err());

        let wallet = WalletInfo::new(" SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7 ", Chain::Stacks, "mainnet")
            .unwrap()
            .with_session(serde_json::json!({"provider": "leather"}));
        assert_eq!(wallet.address(), "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7");
        assert!(wallet.session.is_some());
    }
}
