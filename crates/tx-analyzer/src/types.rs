// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chat request and message types

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model
    System,
    /// End user
    User,
    /// Earlier model output
    Assistant,
}

impl ChatRole {
    /// Wire name of the role
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: ChatRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Transaction to explain
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// Network hint: `bitcoin`, `stacks` or `sidechain-<name>`
    #[serde(default)]
    pub network: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chat_request_wire_format() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "What happened here?"}],
            "txHash": "abc",
            "network": "bitcoin"
        }))
        .unwrap();

        assert_eq!(request.messages, vec![ChatMessage::user("What happened here?")]);
        assert_eq!(request.tx_hash.as_deref(), Some("abc"));

        let minimal: ChatRequest =
            serde_json::from_value(json!({"messages": []})).unwrap();
        assert!(minimal.tx_hash.is_none());
        assert!(minimal.network.is_none());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let result = serde_json::from_value::<ChatMessage>(json!({"role": "tool", "content": "x"}));
        assert!(result.is_err());
    }
}
