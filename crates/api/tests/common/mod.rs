// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Shared helpers for the end-to-end server tests
//!
//! Every upstream is a wiremock server; the API server binds an ephemeral
//! port and is stopped through its cancellation token.

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::MockServer;

pub const TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

/// A running server and the mocks behind it
pub struct TestApp {
    pub addr: SocketAddr,
    pub token: CancellationToken,
    pub upstream: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Point every explorer upstream at one mock server
pub fn config_for(upstream: &MockServer) -> ServerConfig {
    let mut config = ServerConfig::for_testing();
    config.upstream.bitcoin_base_url = Some(upstream.uri());
    config.upstream.stacks_base_url = Some(upstream.uri());
    config.upstream.rebar_base_url = upstream.uri();
    config
}

/// Enable analysis against a mock OpenAI server
pub fn with_openai(mut config: ServerConfig, openai: &MockServer) -> ServerConfig {
    config.analyzer.openai_api_key = Some("sk-test".to_string());
    config.analyzer.openai_base_url = Some(Url::parse(&format!("{}/v1", openai.uri())).unwrap());
    config
}

pub async fn spawn_with(config: ServerConfig, upstream: MockServer) -> TestApp {
    let (addr, token) = Server::new(config, ShutdownConfig::default())
        .unwrap()
        .run_for_testing()
        .await
        .unwrap();

    TestApp {
        addr,
        token,
        upstream,
        client: reqwest::Client::new(),
    }
}

pub async fn spawn() -> TestApp {
    let upstream = MockServer::start().await;
    let config = config_for(&upstream);
    spawn_with(config, upstream).await
}

/// OpenAI server-sent events carrying the given deltas
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": delta}, "finish_reason": null}]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// mempool.space `/tx/{txid}` body
pub fn mempool_transaction() -> Value {
    json!({
        "txid": TXID,
        "vin": [{"prevout": {"scriptpubkey_address": "bc1qsender", "value": 101_410}}],
        "vout": [{"scriptpubkey_address": "bc1qrecipient", "value": 100_000}],
        "size": 222,
        "weight": 561,
        "fee": 1_410,
        "status": {"confirmed": true, "block_height": 840_000, "block_time": 1_713_571_767}
    })
}
