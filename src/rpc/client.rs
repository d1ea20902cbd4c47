//! JSON-RPC Query Client
//!
//! Purpose:
//!     Blocking-style (one call in flight) JSON-RPC over HTTP with bounded
//!     retry and exponential backoff.
//!
//! Created: 2026-02-10
//!
//! Retry semantics:
//!     - Up to `max_attempts` attempts per call (default 5)
//!     - After failed attempt k (1-based) wait `backoff_base^k` seconds
//!     - Transport errors, non-2xx status, unparseable bodies and responses
//!       carrying an `error` member are all retried
//!     - After the final attempt the last failure is returned as-is
//!     - Every attempt gets a fresh request id from the client's counter

use super::error::RpcError;
use super::{ChainReader, LogFilter};
use crate::types::{quantity_hex, BlockHeader, RawLog, Receipt, TransactionBody};
use alloy::primitives::TxHash;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Default attempts per call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff base in seconds
pub const DEFAULT_BACKOFF_BASE: f64 = 1.5;

/// Bounded retry with exponential backoff (no jitter)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Wait before attempt `attempt + 1`, given that `attempt` (1-based) failed
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_base.powi(attempt as i32))
    }
}

/// JSON-RPC client bound to a single endpoint.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    policy: RetryPolicy,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client. `timeout` bounds each individual attempt.
    pub fn new(endpoint: impl Into<String>, policy: RetryPolicy, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            policy,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Number of request ids handed out so far (one per attempt)
    pub fn requests_sent(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }

    /// Call `method` with `params`, retrying per the policy.
    /// Returns the `result` member (JSON `null` when absent).
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut attempt = 1;
        loop {
            match self.attempt(method, &params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let wait = self.policy.delay_after(attempt);
                    warn!(
                        "RPC {} attempt {} failed ({}), retrying in {:.1}s",
                        method,
                        attempt,
                        e,
                        wait.as_secs_f64()
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Call and deserialize the result
    pub async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|source| RpcError::Decode {
            method: method.to_string(),
            source,
        })
    }

    /// One request/response round trip
    async fn attempt(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("RPC -> {} id={}", method, id);

        let response = self.http.post(&self.endpoint).json(&envelope).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| RpcError::Body(e.to_string()))?;
        unwrap_envelope(body)
    }
}

/// Extract `result`, turning an embedded `error` member into a failure
fn unwrap_envelope(mut body: Value) -> Result<Value, RpcError> {
    let error = body.get("error").filter(|e| !e.is_null());
    if let Some(err) = error {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or(-1);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(RpcError::Rpc { code, message });
    }
    Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError> {
        self.call_typed("eth_getTransactionReceipt", json!([tx_hash])).await
    }

    async fn transaction_by_hash(&self, tx_hash: TxHash) -> Result<Option<TransactionBody>, RpcError> {
        self.call_typed("eth_getTransactionByHash", json!([tx_hash])).await
    }

    async fn block_header(&self, number: u64) -> Result<Option<BlockHeader>, RpcError> {
        self.call_typed("eth_getBlockByNumber", json!([quantity_hex(number), false]))
            .await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        let logs: Option<Vec<RawLog>> = self.call_typed("eth_getLogs", json!([filter.to_param()])).await?;
        Ok(logs.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Tiny base so retry tests do not sleep for seconds
    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, 0.001)
    }

    fn client(server: &MockServer, policy: RetryPolicy) -> RpcClient {
        RpcClient::new(server.uri(), policy, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_after(1), Duration::from_secs_f64(1.5));
        assert_eq!(policy.delay_after(2), Duration::from_secs_f64(2.25));
        assert_eq!(policy.delay_after(4), Duration::from_secs_f64(1.5f64.powi(4)));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, 2.0).max_attempts, 1);
    }

    #[test]
    fn test_unwrap_envelope() {
        let ok = unwrap_envelope(json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}));
        assert_eq!(ok.unwrap(), json!("0x1"));

        let null = unwrap_envelope(json!({"jsonrpc": "2.0", "id": 1, "result": null}));
        assert_eq!(null.unwrap(), Value::Null);

        let err = unwrap_envelope(json!({"id": 1, "error": {"code": -32000, "message": "header not found"}}));
        match err {
            Err(RpcError::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "header not found");
            }
            other => panic!("expected RPC error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "0x2a"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rpc = client(&server, fast_policy(5));
        let result = assert_ok!(rpc.call("eth_blockNumber", json!([])).await);
        assert_eq!(result, json!("0x2a"));
    }

    #[tokio::test]
    async fn test_exhausts_exactly_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let rpc = client(&server, fast_policy(3));
        let err = assert_err!(rpc.call("eth_blockNumber", json!([])).await);
        assert!(matches!(err, RpcError::Status(503)));
        assert_eq!(rpc.requests_sent(), 3);
    }

    #[tokio::test]
    async fn test_embedded_error_is_retried_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "error": {"code": -32005, "message": "rate limited"}
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 3, "result": null
            })))
            .mount(&server)
            .await;

        let rpc = client(&server, fast_policy(5));
        let receipt = assert_ok!(rpc.transaction_receipt(TxHash::ZERO).await);
        assert!(receipt.is_none());
        assert_eq!(rpc.requests_sent(), 3);
    }

    #[tokio::test]
    async fn test_request_ids_increase_per_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let rpc = client(&server, fast_policy(2));
        let _ = rpc.call("eth_chainId", json!([])).await;
        let _ = rpc.call("eth_chainId", json!([])).await;

        let requests = server.received_requests().await.unwrap();
        let ids: Vec<u64> = requests
            .iter()
            .map(|r| r.body_json::<Value>().unwrap()["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(requests[0].body_json::<Value>().unwrap()["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn test_malformed_result_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": {"number": "0x1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rpc = client(&server, fast_policy(5));
        let err = assert_err!(rpc.block_header(1).await);
        assert!(matches!(err, RpcError::Decode { .. }));
    }
}
