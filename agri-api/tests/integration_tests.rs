//! Integration tests for the gateway API
//!
//! Each test runs a full stack: in-memory repository, stub-mode signature
//! verifier, mock anchoring backend, real router.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::{TestServer, TestServerConfig};
use serde_json::Value;

use agri_api::{create_router, AppState};
use agri_chain::MockBlockchainClient;
use agri_core::canon::{canonical_input, sha256_hex};
use agri_core::crypto::{BasicSignatureVerifier, PublicKeyMap, VerifierMode};
use agri_db::{InMemoryTelemetryRepository, TelemetryRepository};
use agri_ingest::IngestService;

fn create_test_state() -> AppState {
    let repository: Arc<dyn TelemetryRepository> = Arc::new(InMemoryTelemetryRepository::new());

    let mut keys = PublicKeyMap::new();
    keys.insert("default-pubkey".to_owned(), "unused".to_owned());
    let verifier = Arc::new(BasicSignatureVerifier::with_mode(keys, VerifierMode::Stub));

    let ingest = Arc::new(IngestService::new(
        repository.clone(),
        verifier,
        Arc::new(MockBlockchainClient::new()),
    ));

    AppState::new(ingest, repository)
}

fn create_test_server() -> TestServer {
    TestServer::new(create_router(create_test_state())).unwrap()
}

/// WebSocket upgrades need a real transport.
fn create_http_test_server() -> TestServer {
    let config = TestServerConfig::builder().http_transport().build();
    TestServer::new_with_config(create_router(create_test_state()), config).unwrap()
}

/// Build a valid ingest body in stub-signature form.
fn ingest_body(device_id: &str, timestamp: u64, telemetry: &str, batch_code: &str) -> String {
    let hash = sha256_hex(canonical_input(device_id, timestamp, telemetry).as_bytes());
    let signature = format!("{hash}:default-pubkey");

    let mut body = format!(
        r#"{{"deviceId":"{device_id}","timestamp":{timestamp},"telemetry":{telemetry},"hash":"{hash}","signature":"{signature}""#
    );
    if !batch_code.is_empty() {
        body.push_str(&format!(r#","batchCode":"{batch_code}""#));
    }
    body.push('}');
    body
}

// ============ Health ============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

// ============ Ingest ============

#[tokio::test]
async fn test_ingest_accepts_valid_packet() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/ingest")
        .text(ingest_body(
            "stm32-node-1",
            1700001000,
            r#"{"temperature":24.5,"humidity":62.3}"#,
            "",
        ))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["accepted"], true);
    assert_eq!(body["message"], "accepted");
    assert_eq!(body["recordId"], 1);
    assert!(body["processingMs"].is_u64());
    assert_eq!(body["receipt"]["txHash"].as_str().unwrap().len(), 64);
    assert!(body["receipt"]["blockHeight"].as_u64().unwrap() >= 100_000);
}

#[tokio::test]
async fn test_ingest_decode_error_is_400() {
    let server = create_test_server();

    let response = server.post("/api/v1/ingest").text("{}").await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "missing deviceId");
}

#[tokio::test]
async fn test_ingest_rejection_is_400_with_result_body() {
    let server = create_test_server();

    let mut body = ingest_body("stm32-node-1", 1700001000, r#"{"temperature":24.5}"#, "");
    let tampered_hash = sha256_hex(b"tampered");
    // Swap in a well-formed but wrong digest.
    let original_hash =
        sha256_hex(canonical_input("stm32-node-1", 1700001000, r#"{"temperature":24.5}"#).as_bytes());
    body = body.replacen(&format!(r#""hash":"{original_hash}""#), &format!(r#""hash":"{tampered_hash}""#), 1);

    let response = server.post("/api/v1/ingest").text(body).await;

    response.assert_status_bad_request();
    let result: Value = response.json();
    assert_eq!(result["accepted"], false);
    assert_eq!(result["message"], "hash mismatch with payload");
    assert_eq!(result["receipt"], Value::Null);

    let metrics: Value = server.get("/api/v1/metrics/overview").await.json();
    assert_eq!(metrics["repositorySize"], 0);
}

// ============ Metrics ============

#[tokio::test]
async fn test_metrics_overview_counts_requests() {
    let server = create_test_server();

    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 100, r#"{"t":1}"#, ""))
        .await;
    server.post("/api/v1/ingest").text("{}").await; // decode error, not counted
    let rejected = ingest_body("dev-1", 0, r#"{"t":1}"#, "");
    server.post("/api/v1/ingest").text(rejected).await;

    let response = server.get("/api/v1/metrics/overview").await;
    response.assert_status_ok();
    let metrics: Value = response.json();
    assert_eq!(metrics["totalRequests"], 2);
    assert_eq!(metrics["acceptedRequests"], 1);
    assert_eq!(metrics["rejectedRequests"], 1);
    assert_eq!(metrics["repositorySize"], 1);
    assert!(metrics["averageProcessingMs"].is_u64());
}

// ============ Record lookups ============

#[tokio::test]
async fn test_latest_by_device() {
    let server = create_test_server();

    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 100, r#"{"t":1}"#, ""))
        .await;
    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 300, r#"{"t":3}"#, ""))
        .await;
    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 200, r#"{"t":2}"#, ""))
        .await;

    let response = server.get("/api/v1/devices/dev-1/latest").await;
    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["deviceId"], "dev-1");
    assert_eq!(record["timestamp"], 300);
    assert_eq!(record["recordId"], 2);
    assert_eq!(record["telemetry"]["t"], 3);
    // Unbatched records omit the batch code entirely.
    assert!(record.get("batchCode").is_none());
    assert!(record["receipt"]["txHash"].is_string());
}

#[tokio::test]
async fn test_latest_by_device_not_found() {
    let server = create_test_server();

    let response = server.get("/api/v1/devices/ghost/latest").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], "device not found");
}

#[tokio::test]
async fn test_batch_trace() {
    let server = create_test_server();

    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 300, r#"{"t":3}"#, "LOT-7"))
        .await;
    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-2", 100, r#"{"t":1}"#, "LOT-7"))
        .await;
    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-3", 200, r#"{"t":2}"#, "other"))
        .await;

    let response = server.get("/api/v1/batches/LOT-7/trace").await;
    response.assert_status_ok();
    let trace: Value = response.json();
    assert_eq!(trace["batchCode"], "LOT-7");
    assert_eq!(trace["count"], 2);

    let timestamps: Vec<u64> = trace["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["timestamp"].as_u64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![100, 300]);
    assert_eq!(trace["records"][0]["batchCode"], "LOT-7");
}

#[tokio::test]
async fn test_find_by_transaction() {
    let server = create_test_server();

    let ingested: Value = server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 100, r#"{"t":1}"#, ""))
        .await
        .json();
    let tx_hash = ingested["receipt"]["txHash"].as_str().unwrap().to_owned();

    let response = server.get(&format!("/api/v1/transactions/{tx_hash}")).await;
    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["recordId"], 1);
    assert_eq!(record["receipt"]["txHash"], tx_hash.as_str());

    let missing = server.get("/api/v1/transactions/0xmissing").await;
    missing.assert_status_not_found();
    let body: Value = missing.json();
    assert_eq!(body["error"], "transaction not found");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = create_test_server();

    let response = server.get("/api/v1/does-not-exist").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"], "route not found");
}

// ============ Streams ============

#[tokio::test]
async fn test_telemetry_stream_receives_accepted_events() {
    let server = create_http_test_server();

    let mut subscriber = server
        .get_websocket("/ws/telemetry")
        .await
        .into_websocket()
        .await;

    server
        .post("/api/v1/ingest")
        .text(ingest_body("stm32-node-1", 1700001000, r#"{"temperature":24.5}"#, ""))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let event: Value = serde_json::from_str(&subscriber.receive_text().await).unwrap();
    assert_eq!(event["type"], "telemetry.ingested");
    assert_eq!(event["deviceId"], "stm32-node-1");
    assert_eq!(event["recordId"], 1);
    assert_eq!(event["timestamp"], 1700001000);
    assert_eq!(event["transport"], "wifi");
    assert_eq!(event["txHash"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_alerts_stream_receives_rejections() {
    let server = create_http_test_server();

    let mut subscriber = server
        .get_websocket("/ws/alerts")
        .await
        .into_websocket()
        .await;

    let mut body = ingest_body("stm32-node-1", 1700001000, r#"{"temperature":24.5}"#, "");
    body = body.replacen(r#""signature":""#, r#""signature":"00"#, 1);

    server
        .post("/api/v1/ingest")
        .text(body)
        .await
        .assert_status_bad_request();

    let event: Value = serde_json::from_str(&subscriber.receive_text().await).unwrap();
    assert_eq!(event["type"], "ingest.rejected");
    assert_eq!(event["deviceId"], "stm32-node-1");
    assert_eq!(event["message"], "signature verification failed");
}

#[tokio::test]
async fn test_stream_fan_out_reaches_every_subscriber() {
    let server = create_http_test_server();

    let mut first = server
        .get_websocket("/ws/telemetry")
        .await
        .into_websocket()
        .await;
    let mut second = server
        .get_websocket("/ws/telemetry")
        .await
        .into_websocket()
        .await;

    server
        .post("/api/v1/ingest")
        .text(ingest_body("dev-1", 100, r#"{"t":1}"#, ""))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let from_first: Value = serde_json::from_str(&first.receive_text().await).unwrap();
    let from_second: Value = serde_json::from_str(&second.receive_text().await).unwrap();
    assert_eq!(from_first, from_second);
    assert_eq!(from_first["type"], "telemetry.ingested");
}
