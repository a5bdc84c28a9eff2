//! Ethereum JSON-RPC anchoring backend
//!
//! Submits the digest as transaction data via `eth_sendTransaction`, then
//! polls `eth_getTransactionReceipt` until the transaction is mined or the
//! configured wait cap elapses. Hitting the cap returns the receipt with
//! whatever block height has been learned (0 if none); the transaction is
//! already on the wire and will confirm on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use agri_core::canon::current_utc_iso8601;
use agri_core::BlockchainReceipt;

use crate::client::BlockchainClient;
use crate::config::EthereumRpcConfig;
use crate::error::{ChainError, ChainResult};

/// Attempts per RPC call, including the first
const RPC_MAX_ATTEMPTS: u32 = 3;
/// Backoff between attempts
const RPC_RETRY_DELAY: Duration = Duration::from_millis(100);

/// JSON-RPC request envelope
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

/// JSON-RPC error object; every member is optional on the wire
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: Option<i64>,
    message: Option<String>,
    data: Option<Value>,
}

/// Render an RPC error object as `rpc error <code>: <message> (<data>)`,
/// degrading gracefully when members are absent.
fn describe_rpc_error(error: &RpcErrorBody) -> String {
    let mut decoded = match error.code {
        Some(code) => {
            let mut text = format!("rpc error {code}");
            if let Some(message) = error.message.as_deref().filter(|m| !m.is_empty()) {
                text.push_str(": ");
                text.push_str(message);
            }
            text
        }
        None => match error.message.as_deref().filter(|m| !m.is_empty()) {
            Some(message) => message.to_owned(),
            None => "unknown rpc error".to_owned(),
        },
    };

    if let Some(data) = &error.data {
        let text = match data.as_str() {
            Some(text) => text.to_owned(),
            None => data.to_string(),
        };
        if !text.is_empty() {
            decoded.push_str(" (");
            decoded.push_str(&text);
            decoded.push(')');
        }
    }

    decoded
}

fn parse_hex_u64(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// [`BlockchainClient`] over an Ethereum-compatible JSON-RPC endpoint.
pub struct EthereumRpcClient {
    client: Client,
    config: EthereumRpcConfig,
    request_id: AtomicU64,
}

impl EthereumRpcClient {
    /// Create a client; an empty `to_address` falls back to `from_address`.
    pub fn new(mut config: EthereumRpcConfig) -> ChainResult<Self> {
        if config.to_address.is_empty() {
            config.to_address = config.from_address.clone();
        }

        let client = Client::builder()
            .build()
            .map_err(|error| ChainError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            config,
            request_id: AtomicU64::new(1),
        })
    }

    async fn call_once(&self, method: &str, params: Value) -> ChainResult<RpcResponse> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(method, id, "ethereum rpc call");

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|error| ChainError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::HttpStatus(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|error| ChainError::Transport(error.to_string()))
    }

    /// One RPC call with bounded retry on transient failures.
    async fn call(&self, method: &str, params: Value) -> ChainResult<RpcResponse> {
        let mut attempt = 1;
        loop {
            match self.call_once(method, params.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt < RPC_MAX_ATTEMPTS && error.is_transient() => {
                    warn!(method, attempt, error = %error, "rpc call failed, retrying");
                    tokio::time::sleep(RPC_RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl BlockchainClient for EthereumRpcClient {
    async fn submit_hash(
        &self,
        hash_hex: &str,
        _device_id: &str,
        _timestamp: u64,
    ) -> ChainResult<BlockchainReceipt> {
        if self.config.from_address.is_empty() || self.config.to_address.is_empty() {
            return Err(ChainError::AddressNotConfigured);
        }

        let params = json!([{
            "from": self.config.from_address,
            "to": self.config.to_address,
            "data": format!("0x{hash_hex}"),
        }]);

        let response = self.call("eth_sendTransaction", params).await?;
        if let Some(error) = response.error {
            return Err(ChainError::Rpc(describe_rpc_error(&error)));
        }

        let tx_hash = response
            .result
            .as_ref()
            .and_then(Value::as_str)
            .filter(|hash| !hash.is_empty())
            .ok_or(ChainError::MissingTxHash)?
            .to_owned();

        let mut receipt = BlockchainReceipt {
            tx_hash: tx_hash.clone(),
            block_height: 0,
            submitted_at: current_utc_iso8601(),
        };

        let started = Instant::now();
        loop {
            let response = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(error) = response.error {
                return Err(ChainError::Rpc(describe_rpc_error(&error)));
            }

            // `result: null` means the transaction is not yet mined.
            if let Some(result) = response.result {
                receipt.block_height = result
                    .get("blockNumber")
                    .and_then(Value::as_str)
                    .and_then(parse_hex_u64)
                    .unwrap_or(0);
                return Ok(receipt);
            }

            if started.elapsed() >= Duration::from_millis(self.config.max_wait_ms) {
                debug!(tx_hash = %receipt.tx_hash, "receipt poll cap reached, returning partial receipt");
                return Ok(receipt);
            }
            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct Script {
        responses: Arc<Mutex<VecDeque<(u16, String)>>>,
        hits: Arc<AtomicU64>,
    }

    async fn rpc_endpoint(State(script): State<Script>) -> impl IntoResponse {
        script.hits.fetch_add(1, Ordering::SeqCst);
        let (status, body) = script
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((200, r#"{"jsonrpc":"2.0","id":0,"result":null}"#.to_owned()));
        (
            StatusCode::from_u16(status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
    }

    async fn spawn_scripted_rpc(responses: Vec<(u16, &str)>) -> (String, Script) {
        let script = Script {
            responses: Arc::new(Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| (status, body.to_owned()))
                    .collect(),
            )),
            hits: Arc::new(AtomicU64::new(0)),
        };

        let app = Router::new()
            .route("/", post(rpc_endpoint))
            .with_state(script.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/"), script)
    }

    fn client_for(url: String) -> EthereumRpcClient {
        EthereumRpcClient::new(EthereumRpcConfig {
            rpc_url: url,
            from_address: "0xf00d".to_owned(),
            to_address: String::new(),
            poll_interval_ms: 10,
            max_wait_ms: 2_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_retry_on_500_then_submit_and_poll() {
        let (url, script) = spawn_scripted_rpc(vec![
            (500, "server exploded"),
            (200, r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#),
            (200, r#"{"jsonrpc":"2.0","id":2,"result":null}"#),
            (200, r#"{"jsonrpc":"2.0","id":3,"result":{"blockNumber":"0x2a"}}"#),
        ])
        .await;

        let receipt = client_for(url)
            .submit_hash(&"a".repeat(64), "dev-1", 1700001000)
            .await
            .unwrap();

        assert_eq!(receipt.tx_hash, "0xabc");
        assert_eq!(receipt.block_height, 42);
        assert_eq!(script.hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_rpc_error_decoding() {
        let (url, _script) = spawn_scripted_rpc(vec![(
            200,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"tx rejected","data":"nonce too low"}}"#,
        )])
        .await;

        let error = client_for(url)
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "rpc error -32000: tx rejected (nonce too low)");
    }

    #[tokio::test]
    async fn test_rpc_error_without_members() {
        let (url, _script) =
            spawn_scripted_rpc(vec![(200, r#"{"jsonrpc":"2.0","id":1,"error":{}}"#)]).await;

        let error = client_for(url)
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "unknown rpc error");
    }

    #[tokio::test]
    async fn test_missing_tx_hash() {
        let (url, _script) =
            spawn_scripted_rpc(vec![(200, r#"{"jsonrpc":"2.0","id":1,"result":""}"#)]).await;

        let error = client_for(url)
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "missing transaction hash in rpc response");
    }

    #[tokio::test]
    async fn test_4xx_is_not_retried() {
        let (url, script) = spawn_scripted_rpc(vec![(404, "nope")]).await;

        let error = client_for(url)
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "rpc http status 404");
        assert_eq!(script.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_5xx_exhausts_three_attempts() {
        let (url, script) =
            spawn_scripted_rpc(vec![(500, "a"), (502, "b"), (503, "c")]).await;

        let error = client_for(url)
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "rpc http status 503");
        assert_eq!(script.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_cap_returns_partial_receipt() {
        // Only the submission is scripted; every poll gets the default
        // null result, so the wait cap has to fire.
        let (url, _script) =
            spawn_scripted_rpc(vec![(200, r#"{"jsonrpc":"2.0","id":1,"result":"0xfeed"}"#)]).await;

        let client = EthereumRpcClient::new(EthereumRpcConfig {
            rpc_url: url,
            from_address: "0xf00d".to_owned(),
            to_address: String::new(),
            poll_interval_ms: 10,
            max_wait_ms: 50,
        })
        .unwrap();

        let receipt = client
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap();
        assert_eq!(receipt.tx_hash, "0xfeed");
        assert_eq!(receipt.block_height, 0);
    }

    #[tokio::test]
    async fn test_addresses_must_be_configured() {
        let client = EthereumRpcClient::new(EthereumRpcConfig::default()).unwrap();
        let error = client
            .submit_hash(&"a".repeat(64), "dev-1", 1)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "from/to address not configured");
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x2a"), Some(42));
        assert_eq!(parse_hex_u64("2a"), Some(42));
        assert_eq!(parse_hex_u64("0X10"), Some(16));
        assert_eq!(parse_hex_u64("0x"), None);
        assert_eq!(parse_hex_u64(""), None);
        assert_eq!(parse_hex_u64("zz"), None);
    }

    #[test]
    fn test_to_address_falls_back_to_from() {
        let client = EthereumRpcClient::new(EthereumRpcConfig {
            from_address: "0xf00d".to_owned(),
            to_address: String::new(),
            ..EthereumRpcConfig::default()
        })
        .unwrap();
        assert_eq!(client.config.to_address, "0xf00d");
    }
}
