// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Streamed LLM explanations of blockchain transactions
//!
//! Given a conversation, an optional transaction hash and a network hint, the
//! analyzer looks the transaction up, embeds it into a network specific system
//! prompt and streams an OpenAI chat completion back as text deltas.
//!
//! # Architecture
//!
//! - [`analyzer`]: request validation, transaction lookup and orchestration
//! - [`prompt`]: system prompt construction per network kind
//! - [`openai`]: streaming OpenAI client and server-sent event decoder
//! - [`config`]: OpenAI client configuration
//! - [`error`]: error types and their HTTP status mapping
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use external_apis::{ApiRegistry, RegistryConfig};
//! use futures::StreamExt;
//! use tx_analyzer::{ChatMessage, ChatRequest, OpenAiConfig, TransactionAnalyzer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ApiRegistry::new(RegistryConfig::default())?);
//! let analyzer = TransactionAnalyzer::new(
//!     registry,
//!     Some(OpenAiConfig::new("sk-your-api-key".to_string())),
//! )?;
//!
//! let request = ChatRequest {
//!     messages: vec![ChatMessage::user("What does this transaction do?")],
//!     tx_hash: Some("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b".to_string()),
//!     network: Some("bitcoin".to_string()),
//! };
//!
//! let mut stream = analyzer.analyze(request).await?;
//! while let Some(delta) = stream.deltas.next().await {
//!     print!("{}", delta?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod openai;
pub mod prompt;
pub mod types;

// Re-export main types for convenience
pub use analyzer::{AnalysisStream, PreparedChat, TransactionAnalyzer};
pub use config::OpenAiConfig;
pub use error::{AnalyzerError, AnalyzerResult};
pub use openai::{DeltaStream, OpenAiClient, SseDecoder};
pub use prompt::PromptBuilder;
pub use types::{ChatMessage, ChatRequest, ChatRole};
