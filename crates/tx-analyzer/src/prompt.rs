// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! System prompt construction
//!
//! The prompt is a flat conditional on [`AnalysisNetwork`]: shared base
//! instructions, one network section, then the fetched transaction as pretty
//! printed JSON when there is one.

use api_client::TransactionDetails;
use shared_types::{AnalysisNetwork, BitcoinNetwork, StacksNetwork};

use crate::error::AnalyzerResult;

const BASE_INSTRUCTIONS: &str = "You are a blockchain explorer assistant. Explain transactions \
in plain language for someone who is not a protocol expert. Be precise about amounts, fees and \
confirmation status, and never invent data that is not present in the context you are given.";

const BITCOIN_SECTION: &str = "Network: Bitcoin. Amounts are in satoshis (1 BTC = 100,000,000 \
sats). Inputs spend earlier outputs; the fee is total input minus total output. Fee rates are in \
sat/vB. An output returning value to an input address is usually change.";

const STACKS_SECTION: &str = "Network: Stacks, a Bitcoin layer that settles to Bitcoin blocks. \
STX amounts are in micro-STX (1 STX = 1,000,000 micro-STX). Transactions are token transfers, \
contract calls, contract deployments or coinbase transactions. sBTC is a Bitcoin-pegged asset \
on Stacks.";

const UNKNOWN_SECTION: &str = "The network was not specified. Answer general questions about \
Bitcoin and Stacks and ask for a transaction hash and network if the user wants a specific \
transaction explained.";

/// Builds the system prompt for a chat completion
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Create a prompt builder
    pub fn new() -> Self {
        Self
    }

    /// System prompt for `network`, embedding `transaction` when present
    pub fn system_prompt(
        &self,
        network: &AnalysisNetwork,
        transaction: Option<&TransactionDetails>,
    ) -> AnalyzerResult<String> {
        let mut prompt = String::from(BASE_INSTRUCTIONS);
        prompt.push_str("\n\n");

        match network {
            AnalysisNetwork::Bitcoin => prompt.push_str(BITCOIN_SECTION),
            AnalysisNetwork::Stacks => prompt.push_str(STACKS_SECTION),
            AnalysisNetwork::Sidechain(name) => {
                prompt.push_str(&format!(
                    "Network: the BIP300 sidechain \"{name}\". No indexed data source is \
                     available for this sidechain, so no transaction data could be fetched. Say \
                     so plainly and limit the answer to what the user has provided."
                ));
            }
            AnalysisNetwork::Unknown => prompt.push_str(UNKNOWN_SECTION),
        }

        if let Some(transaction) = transaction {
            let json = serde_json::to_string_pretty(transaction)?;
            prompt.push_str(&format!(
                "\n\nTransaction {} ({}):\n```json\n{json}\n```",
                transaction.id(),
                Self::explorer_link(transaction),
            ));
        }

        Ok(prompt)
    }

    /// Mainnet explorer page for the transaction
    fn explorer_link(transaction: &TransactionDetails) -> String {
        match transaction {
            TransactionDetails::Bitcoin(tx) => {
                BitcoinNetwork::Mainnet.config().transaction_url(&tx.txid)
            }
            TransactionDetails::Stacks(tx) => {
                StacksNetwork::Mainnet.config().transaction_url(&tx.tx_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use api_client::{BitcoinTransferDetails, StacksTransferDetails, TransferLeg};

    use super::*;

    fn bitcoin_tx() -> TransactionDetails {
        TransactionDetails::Bitcoin(BitcoinTransferDetails {
            txid: "ab".repeat(32),
            confirmed: false,
            block_height: None,
            block_hash: None,
            block_time: None,
            fee: 500,
            size: 150,
            weight: 600,
            inputs: vec![TransferLeg {
                address: Some("bc1qsender".to_string()),
                value: 10_500,
            }],
            outputs: vec![TransferLeg {
                address: Some("bc1qrecipient".to_string()),
                value: 10_000,
            }],
            total_input: 10_500,
            total_output: 10_000,
        })
    }

    #[test]
    fn sections_by_network() {
        let builder = PromptBuilder::new();

        let prompt = builder.system_prompt(&AnalysisNetwork::Bitcoin, None).unwrap();
        assert!(prompt.starts_with(BASE_INSTRUCTIONS));
        assert!(prompt.contains("satoshis"));
        assert!(!prompt.contains("```json"));

        let prompt = builder.system_prompt(&AnalysisNetwork::Stacks, None).unwrap();
        assert!(prompt.contains("micro-STX"));

        let prompt = builder.system_prompt(&AnalysisNetwork::Unknown, None).unwrap();
        assert!(prompt.contains("not specified"));
    }

    #[test]
    fn sidechain_prompt_has_no_data() {
        let network = AnalysisNetwork::Sidechain("thunder".to_string());
        let prompt = PromptBuilder::new().system_prompt(&network, None).unwrap();
        assert!(prompt.contains("\"thunder\""));
        assert!(prompt.contains("No indexed data source"));
    }

    #[test]
    fn transaction_is_embedded_as_json() {
        let tx = bitcoin_tx();
        let prompt = PromptBuilder::new()
            .system_prompt(&AnalysisNetwork::Bitcoin, Some(&tx))
            .unwrap();

        assert!(prompt.contains("```json"));
        assert!(prompt.contains("\"chain\": \"bitcoin\""));
        assert!(prompt.contains("\"total_input\": 10500"));
        assert!(prompt.contains(&format!("https://mempool.space/tx/{}", "ab".repeat(32))));
    }

    #[test]
    fn stacks_transaction_link() {
        let tx = TransactionDetails::Stacks(StacksTransferDetails {
            tx_id: "0x01".to_string(),
            tx_type: "contract_call".to_string(),
            tx_status: "pending".to_string(),
            sender_address: "SP1".to_string(),
            fee_rate: "200".to_string(),
            nonce: 0,
            block_height: None,
            burn_block_time: None,
            token_transfer: None,
            contract_call: None,
        });
        let prompt = PromptBuilder::new()
            .system_prompt(&AnalysisNetwork::Stacks, Some(&tx))
            .unwrap();
        assert!(prompt.contains("explorer.hiro.so"));
        assert!(prompt.contains("\"tx_status\": \"pending\""));
    }
}
