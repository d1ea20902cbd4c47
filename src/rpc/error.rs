//! Query client error type

use thiserror::Error;

/// Failure of a single JSON-RPC attempt, or of a call once retries ran out.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Body(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("failed to decode {method} result: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    /// Whether another attempt may succeed. Result decoding happens after
    /// the call returned, so it is never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RpcError::Decode { .. })
    }
}
