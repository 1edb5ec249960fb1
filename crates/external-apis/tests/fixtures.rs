// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Upstream test fixtures
//!
//! Canned mempool.space, Hiro and Rebar Labs responses shared by the
//! integration tests.

use serde_json::{Value, json};

pub const TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
pub const BLOCK_HASH: &str = "0000000000000000000320283a032748cef8227873ff4872689bf23f1cda83a5";
pub const BTC_ADDRESS: &str = "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh";
pub const STACKS_TX_ID: &str = "0x3f1d6b8b0f3c5c6d2b1a9e8f7d6c5b4a39281706f5e4d3c2b1a0f9e8d7c6b5a4";
pub const STACKS_PRINCIPAL: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";

/// mempool.space `/tx/{txid}` body
pub fn mempool_transaction() -> Value {
    json!({
        "txid": TXID,
        "version": 2,
        "locktime": 0,
        "vin": [
            {
                "txid": "f".repeat(64),
                "vout": 0,
                "prevout": {
                    "scriptpubkey_address": "bc1qsender0000000000000000000000000000000",
                    "scriptpubkey_type": "v0_p2wpkh",
                    "value": 150_000
                },
                "is_coinbase": false
            }
        ],
        "vout": [
            {"scriptpubkey_address": BTC_ADDRESS, "scriptpubkey_type": "v0_p2wpkh", "value": 100_000},
            {"scriptpubkey_address": "bc1qchange000000000000000000000000000000", "value": 48_590}
        ],
        "size": 222,
        "weight": 561,
        "fee": 1_410,
        "status": {
            "confirmed": true,
            "block_height": 840_000,
            "block_hash": BLOCK_HASH,
            "block_time": 1_713_571_767
        }
    })
}

/// mempool.space `/v1/fees/recommended` body
pub fn recommended_fees() -> Value {
    json!({
        "fastestFee": 24,
        "halfHourFee": 18,
        "hourFee": 12,
        "economyFee": 6,
        "minimumFee": 3
    })
}

/// Hiro `/extended/v1/tx/{id}` body for an STX transfer
pub fn hiro_token_transfer() -> Value {
    json!({
        "tx_id": STACKS_TX_ID,
        "nonce": 12,
        "fee_rate": "3000",
        "sender_address": STACKS_PRINCIPAL,
        "tx_status": "success",
        "tx_type": "token_transfer",
        "block_height": 172_345,
        "burn_block_time": 1_724_000_000,
        "token_transfer": {
            "recipient_address": "SP3FBR2AGK5H9QBDH3EEN6DF8EK8JY7RX8QJ5SVTE",
            "amount": "2500000",
            "memo": "0x00000000"
        }
    })
}

/// Hiro `/extended/v1/address/{principal}/balances` body
pub fn hiro_balances() -> Value {
    json!({
        "stx": {"balance": "12000000", "total_sent": "0", "total_received": "12000000"},
        "fungible_tokens": {
            "SM3VDXK3WZZSA84XXFKAFAF15NNZX32CTSG82JFQ4.sbtc-token::sbtc-token": {
                "balance": "150000",
                "total_sent": "0",
                "total_received": "150000"
            }
        },
        "non_fungible_tokens": {}
    })
}

/// Hiro paginated list body
pub fn hiro_list(results: Vec<Value>) -> Value {
    json!({
        "limit": 20,
        "offset": 0,
        "total": results.len(),
        "results": results
    })
}

/// Rebar `/runes/v1/etchings/{id}` body
pub fn rune_etching() -> Value {
    json!({
        "id": "840000:1",
        "name": "DOGGOTOTHEMOON",
        "spaced_name": "DOG•GO•TO•THE•MOON",
        "number": 3,
        "divisibility": 5,
        "symbol": "🐕"
    })
}
