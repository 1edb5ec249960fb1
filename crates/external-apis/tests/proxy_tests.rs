// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `BlockchainProxy`

use std::time::Duration;

use external_apis::{
    BlockchainProxy, HostApiKey, ProxyConfig, UpstreamError, proxy::HIRO_API_KEY_HEADER,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn keyed_proxy(host_suffix: &str, timeout: Duration) -> BlockchainProxy {
    BlockchainProxy::new(ProxyConfig {
        timeout,
        api_keys: vec![HostApiKey {
            host_suffix: host_suffix.to_string(),
            header: HIRO_API_KEY_HEADER,
            key: Some("test-hiro-key".to_string()),
        }],
    })
    .unwrap()
}

#[tokio::test]
async fn forwards_json_body_verbatim() {
    let mock_server = MockServer::start().await;
    let body = json!({"height": 840_000, "nested": {"list": [1, 2, 3]}});

    Mock::given(method("GET"))
        .and(path("/extended/v1/status"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let proxy = BlockchainProxy::new(ProxyConfig::default()).unwrap();
    let result = proxy
        .fetch(&format!("{}/extended/v1/status", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(result, body);
}

#[tokio::test]
async fn attaches_key_for_matching_host() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/mempool"))
        .and(header("x-hiro-api-key", "test-hiro-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let proxy = keyed_proxy("127.0.0.1", Duration::from_secs(5));
    let result = proxy
        .fetch(&format!("{}/extended/v1/tx/mempool", mock_server.uri()))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn unrelated_host_gets_no_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let proxy = keyed_proxy("hiro.so", Duration::from_secs(5));
    proxy
        .fetch(&format!("{}/api/blocks", mock_server.uri()))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("x-hiro-api-key"));
}

#[tokio::test]
async fn forwards_upstream_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tx/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Transaction not found"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let proxy = BlockchainProxy::new(ProxyConfig::default()).unwrap();

    let error = proxy
        .fetch(&format!("{}/api/tx/missing", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(error.status_code(), 404);
    let envelope = error.envelope();
    assert_eq!(envelope.status, 404);
    assert_eq!(envelope.details.as_deref(), Some("Transaction not found"));

    let error = proxy
        .fetch(&format!("{}/api/limited", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(error.status_code(), 429);
    assert!(error.envelope().details.is_none());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"late": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let proxy = BlockchainProxy::new(ProxyConfig {
        timeout: Duration::from_secs(1),
        ..ProxyConfig::default()
    })
    .unwrap();

    let error = proxy
        .fetch(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(error, UpstreamError::Timeout { timeout_seconds: 1 }));
    assert_eq!(error.status_code(), 500);
}

#[tokio::test]
async fn non_json_body_becomes_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK: indexer synced\n"))
        .mount(&mock_server)
        .await;

    let proxy = BlockchainProxy::new(ProxyConfig::default()).unwrap();
    let result = proxy
        .fetch(&format!("{}/api/status", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(result, json!("OK: indexer synced"));
}

#[tokio::test]
async fn invalid_urls_never_reach_upstream() {
    let proxy = BlockchainProxy::new(ProxyConfig::default()).unwrap();

    for raw in ["", "ftp://example.com/file", "not a url"] {
        let error = proxy.fetch(raw).await.unwrap_err();
        assert!(error.is_client_error(), "{raw:?}");
        assert_eq!(error.status_code(), 400);
    }
}

#[tokio::test]
async fn key_never_follows_cross_host_redirect() {
    let keyed_host = MockServer::start().await;
    let other_host = MockServer::start().await;
    let landing = format!("http://localhost:{}/land", other_host.address().port());

    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", landing.as_str()))
        .expect(1)
        .mount(&keyed_host)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stolen": true})))
        .expect(0)
        .mount(&other_host)
        .await;

    let proxy = keyed_proxy("127.0.0.1", Duration::from_secs(5));
    let error = proxy
        .fetch(&format!("{}/hop", keyed_host.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), 302);
    let requests = other_host.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|request| !request.headers.contains_key("x-hiro-api-key"))
    );
}

#[tokio::test]
async fn same_host_redirect_is_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .and(header("x-hiro-api-key", "test-hiro-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"moved": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let proxy = keyed_proxy("127.0.0.1", Duration::from_secs(5));
    let result = proxy
        .fetch(&format!("{}/old", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(result, json!({"moved": true}));
}
