//! Ledger Query Module
//!
//! Purpose:
//!     JSON-RPC access to the ledger endpoint. `RpcClient` owns the retry
//!     policy and request-id counter; `ChainReader` is the typed surface the
//!     correlation engine depends on, so engine tests can swap in an
//!     in-memory chain.
//!
//! Created: 2026-02-10
//!
//! Architecture:
//!     error.rs   - RpcError (per-attempt and final failures)
//!     client.rs  - RpcClient, RetryPolicy, ChainReader impl over HTTP

pub mod client;
pub mod error;

pub use client::{RetryPolicy, RpcClient};
pub use error::RpcError;

use crate::types::{quantity_hex, BlockHeader, RawLog, Receipt, TransactionBody};
use alloy::primitives::{Address, TxHash, B256};
use async_trait::async_trait;
use serde_json::{json, Value};

/// `eth_getLogs` filter. Each topic position holds a set of acceptable
/// values (OR within a position, AND across positions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Address,
    pub topics: Vec<Vec<B256>>,
}

impl LogFilter {
    /// Filter covering exactly one block, one emitter and a topic0 set
    pub fn single_block(block: u64, address: Address, topic0: &[B256]) -> Self {
        Self {
            from_block: block,
            to_block: block,
            address,
            topics: vec![topic0.to_vec()],
        }
    }

    /// True if `log` satisfies this filter (used by in-memory readers)
    pub fn accepts(&self, log: &RawLog) -> bool {
        let in_range = log
            .block_number
            .map_or(false, |b| b >= self.from_block && b <= self.to_block);
        in_range
            && log.address == self.address
            && self.topics.iter().enumerate().all(|(i, allowed)| {
                allowed.is_empty() || log.topics.get(i).map_or(false, |t| allowed.contains(t))
            })
    }

    /// JSON-RPC parameter object
    pub fn to_param(&self) -> Value {
        json!({
            "fromBlock": quantity_hex(self.from_block),
            "toBlock": quantity_hex(self.to_block),
            "address": crate::types::hex_address(&self.address),
            "topics": self.topics,
        })
    }
}

/// Typed ledger queries used by the correlation engine.
///
/// `Ok(None)` means the node answered `null` (unknown hash / block).
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError>;

    async fn transaction_by_hash(&self, tx_hash: TxHash) -> Result<Option<TransactionBody>, RpcError>;

    async fn block_header(&self, number: u64) -> Result<Option<BlockHeader>, RpcError>;

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, Bytes};

    #[test]
    fn test_filter_param_shape() {
        let pool = address!("0x00000000000000000000000000000000000000aa");
        let t0 = b256!("0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");
        let filter = LogFilter::single_block(255, pool, &[t0]);

        let param = filter.to_param();
        assert_eq!(param["fromBlock"], "0xff");
        assert_eq!(param["toBlock"], "0xff");
        assert_eq!(param["address"], "0x00000000000000000000000000000000000000aa");
        assert_eq!(
            param["topics"][0][0],
            "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67"
        );
    }

    #[test]
    fn test_filter_accepts() {
        let pool = address!("0x00000000000000000000000000000000000000aa");
        let t0 = b256!("0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");
        let filter = LogFilter::single_block(10, pool, &[t0]);

        let mut log = RawLog {
            address: pool,
            topics: vec![t0],
            data: Bytes::new(),
            log_index: Some(0),
            transaction_hash: None,
            transaction_index: Some(0),
            block_number: Some(10),
        };
        assert!(filter.accepts(&log));

        log.block_number = Some(11);
        assert!(!filter.accepts(&log));

        log.block_number = Some(10);
        log.topics = vec![B256::ZERO];
        assert!(!filter.accepts(&log));
    }
}
