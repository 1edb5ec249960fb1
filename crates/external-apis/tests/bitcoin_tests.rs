// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `BitcoinClient`

use api_client::{ApiClient, FeeEstimate, HealthStatus};
use external_apis::{BitcoinClient, BitcoinConfig, UpstreamError};
use serde_json::json;
use shared_types::BitcoinNetwork;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

mod fixtures;
use fixtures::*;

fn client(mock_server: &MockServer) -> BitcoinClient {
    BitcoinClient::new(BitcoinConfig::with_base_url(mock_server.uri())).unwrap()
}

#[tokio::test]
async fn transaction_is_returned_unchanged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tx/{TXID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(mempool_transaction()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .transaction(BitcoinNetwork::Mainnet, TXID)
        .await
        .unwrap();

    assert_eq!(result, mempool_transaction());
}

#[tokio::test]
async fn transfer_details_projection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tx/{TXID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(mempool_transaction()))
        .mount(&mock_server)
        .await;

    let details = client(&mock_server)
        .transfer_details(BitcoinNetwork::Testnet, &TXID.to_uppercase())
        .await
        .unwrap();

    assert_eq!(details.txid, TXID);
    assert!(details.confirmed);
    assert_eq!(details.block_hash.as_deref(), Some(BLOCK_HASH));
    assert_eq!(details.fee, 1_410);
    assert_eq!(details.total_input, 150_000);
    assert_eq!(details.total_output, 148_590);
    assert_eq!(details.outputs[0].address.as_deref(), Some(BTC_ADDRESS));
    assert_eq!(details.vsize(), 141);
}

#[tokio::test]
async fn block_by_height_resolves_hash_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/block-height/840000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BLOCK_HASH))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/block/{BLOCK_HASH}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": BLOCK_HASH, "height": 840_000})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let by_height = client.block(BitcoinNetwork::Mainnet, "840000").await.unwrap();
    let by_hash = client.block(BitcoinNetwork::Mainnet, BLOCK_HASH).await.unwrap();

    assert_eq!(by_height, by_hash);
    assert_eq!(by_height["height"], 840_000);
}

#[tokio::test]
async fn address_endpoints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/address/{BTC_ADDRESS}/txs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([mempool_transaction()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/address/{BTC_ADDRESS}/utxo")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"txid": TXID, "vout": 0, "value": 100_000}])))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let txs = client
        .address_transactions(BitcoinNetwork::Signet, BTC_ADDRESS)
        .await
        .unwrap();
    assert_eq!(txs.as_array().map(Vec::len), Some(1));

    let utxos = client
        .address_utxos(BitcoinNetwork::Signet, BTC_ADDRESS)
        .await
        .unwrap();
    assert_eq!(utxos[0]["value"], 100_000);
}

#[tokio::test]
async fn tip_height_and_fees() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blocks/tip/height"))
        .respond_with(ResponseTemplate::new(200).set_body_string("840123"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/fees/recommended"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fastestFee": 24, "hourFee": 12})))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    assert_eq!(client.tip_height(BitcoinNetwork::Mainnet).await.unwrap(), 840_123);

    let fees = client.fee_estimate(BitcoinNetwork::Mainnet).await.unwrap();
    assert_eq!(
        fees,
        FeeEstimate {
            fastest_fee: 24,
            hour_fee: 12,
            ..FeeEstimate::default()
        }
    );
}

#[tokio::test]
async fn invalid_ids_never_reach_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let error = client.transaction(BitcoinNetwork::Mainnet, "").await.unwrap_err();
    assert_eq!(error.to_string(), "id is required");
    assert!(client.transaction(BitcoinNetwork::Mainnet, "xyz").await.is_err());
    assert!(client.address(BitcoinNetwork::Mainnet, "  ").await.is_err());
    assert!(client.block(BitcoinNetwork::Mainnet, "not-a-hash").await.is_err());
}

#[tokio::test]
async fn upstream_status_is_preserved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tx/{TXID}")))
        .respond_with(ResponseTemplate::new(404).set_body_string("Transaction not found"))
        .mount(&mock_server)
        .await;

    let error = client(&mock_server)
        .transaction(BitcoinNetwork::Mainnet, TXID)
        .await
        .unwrap_err();

    assert!(matches!(error, UpstreamError::Status { status: 404, .. }));
}

#[tokio::test]
async fn health_check_reports_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blocks/tip/height"))
        .respond_with(ResponseTemplate::new(200).set_body_string("840000"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blocks/tip/height"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    assert_eq!(client.name(), "bitcoin");
    assert_eq!(client.health_check().await.unwrap(), HealthStatus::Up);
    assert!(client.health_check().await.unwrap().is_down());
}
