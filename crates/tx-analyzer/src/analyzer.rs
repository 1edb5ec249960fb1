// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Transaction analysis orchestration
//!
//! Validates a chat request, fetches the referenced transaction when the
//! network has a data source, builds the system prompt and opens the streamed
//! completion.

use std::{fmt, sync::Arc};

use api_client::TransactionDetails;
use external_apis::ApiRegistry;
use shared_types::{AnalysisNetwork, Chain};
use tracing::{debug, info, warn};

use crate::{
    config::OpenAiConfig,
    error::{AnalyzerError, AnalyzerResult},
    openai::{DeltaStream, OpenAiClient},
    prompt::PromptBuilder,
    types::{ChatMessage, ChatRequest},
};

/// A validated request ready to be sent to the model
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChat {
    /// Network the request was classified as
    pub network: AnalysisNetwork,
    /// Fetched transaction, if any
    pub transaction: Option<TransactionDetails>,
    /// System prompt followed by the caller's messages
    pub messages: Vec<ChatMessage>,
}

/// An open completion stream
pub struct AnalysisStream {
    /// Network the request was classified as
    pub network: AnalysisNetwork,
    /// Text deltas in arrival order
    pub deltas: DeltaStream,
}

impl fmt::Debug for AnalysisStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisStream")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

/// Explains transactions with a streamed chat completion
#[derive(Debug)]
pub struct TransactionAnalyzer {
    registry: Arc<ApiRegistry>,
    openai: Option<OpenAiClient>,
    prompts: PromptBuilder,
}

impl TransactionAnalyzer {
    /// Create an analyzer; without an OpenAI configuration every analysis
    /// fails with [`AnalyzerError::NotConfigured`]
    ///
    /// # Errors
    ///
    /// Returns an error if the OpenAI configuration is invalid
    pub fn new(registry: Arc<ApiRegistry>, openai: Option<OpenAiConfig>) -> AnalyzerResult<Self> {
        let openai = openai.map(OpenAiClient::new).transpose()?;

        match &openai {
            Some(client) => info!(model = client.model(), "Transaction analysis enabled"),
            None => warn!("OPENAI_API_KEY not configured, transaction analysis disabled"),
        }

        Ok(Self {
            registry,
            openai,
            prompts: PromptBuilder::new(),
        })
    }

    /// Whether an OpenAI client is configured
    pub fn is_configured(&self) -> bool {
        self.openai.is_some()
    }

    /// Validate the request and gather its context
    ///
    /// Transactions are looked up on mainnet. Lookup failures propagate
    /// unchanged.
    pub async fn prepare(&self, request: ChatRequest) -> AnalyzerResult<PreparedChat> {
        if request.messages.is_empty() {
            return Err(AnalyzerError::invalid_request("messages are required"));
        }
        if request
            .messages
            .iter()
            .any(|message| message.content.trim().is_empty())
        {
            return Err(AnalyzerError::invalid_request(
                "message content cannot be empty",
            ));
        }

        let network = AnalysisNetwork::from_hint(request.network.as_deref());
        let tx_hash = request
            .tx_hash
            .as_deref()
            .map(str::trim)
            .filter(|hash| !hash.is_empty());

        let transaction = match (tx_hash, &network) {
            (Some(hash), AnalysisNetwork::Bitcoin) => Some(
                self.registry
                    .transaction_details(Chain::Bitcoin, None, hash)
                    .await?,
            ),
            (Some(hash), AnalysisNetwork::Stacks) => Some(
                self.registry
                    .transaction_details(Chain::Stacks, None, hash)
                    .await?,
            ),
            (Some(_), AnalysisNetwork::Sidechain(name)) => {
                debug!(sidechain = %name, "no data source for sidechain, skipping lookup");
                None
            }
            (Some(_), AnalysisNetwork::Unknown) => {
                debug!("network not specified, skipping transaction lookup");
                None
            }
            (None, _) => None,
        };

        let system_prompt = self.prompts.system_prompt(&network, transaction.as_ref())?;

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(request.messages);

        debug!(
            network = %network,
            has_transaction = transaction.is_some(),
            message_count = messages.len(),
            "Prepared chat request"
        );

        Ok(PreparedChat {
            network,
            transaction,
            messages,
        })
    }

    /// Prepare the request and open the completion stream
    pub async fn analyze(&self, request: ChatRequest) -> AnalyzerResult<AnalysisStream> {
        let Some(openai) = &self.openai else {
            return Err(AnalyzerError::NotConfigured);
        };

        let prepared = self.prepare(request).await?;
        let deltas = openai.stream_chat(&prepared.messages).await?;

        Ok(AnalysisStream {
            network: prepared.network,
            deltas,
        })
    }
}
