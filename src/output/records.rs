//! Output record shapes
//!
//! One struct per stream line. Hashes and addresses are pre-formatted as
//! lowercase `0x` hex, profit values as decimal strings.

use crate::events::DecodedSwap;
use crate::types::{hex_address, hex_b256, RawLog};
use alloy::primitives::hex;
use serde::{Deserialize, Serialize};

/// `reason` for a transaction whose receipt is null
pub const REASON_RECEIPT_NULL: &str = "receipt_null";

/// `reason` for a receipt without any backrun log
pub const REASON_NO_BACKRUN_LOG: &str = "no_backrun_log";

/// Raw log echoed next to every decoded record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogRecord {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "logIndex")]
    pub log_index: Option<u64>,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Option<String>,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<u64>,
}

impl From<&RawLog> for RawLogRecord {
    fn from(log: &RawLog) -> Self {
        Self {
            address: hex_address(&log.address),
            topics: log.topics.iter().map(hex_b256).collect(),
            data: hex::encode_prefixed(&log.data),
            log_index: log.log_index,
            transaction_hash: log.transaction_hash.as_ref().map(hex_b256),
            block_number: log.block_number,
        }
    }
}

/// backruns.jsonl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackrunRecord {
    pub tx_hash: String,
    pub block_number: u64,
    pub block_time: String,
    pub backrun_log_index: Option<u64>,
    pub pool: String,
    pub profit_raw: String,
    pub profit_token: String,
    pub tx_to: String,
    pub tx_input_selector: String,
    pub raw_backrun_log: RawLogRecord,
}

/// tx_pool_swaps.jsonl - swaps on the pool inside the origin transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSwapRecord {
    pub tx_hash: String,
    pub block_number: u64,
    pub pool: String,
    pub swap_tx_hash: String,
    pub swap_log_index: Option<u64>,
    pub swap_topic0: String,
    pub decoded: Option<DecodedSwap>,
    pub raw_log: RawLogRecord,
}

/// same_block_pool_swaps.jsonl and next_blocks_pool_swaps.jsonl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSwapRecord {
    pub origin_tx_hash: String,
    pub origin_block_number: u64,
    pub pool: String,
    pub observed_block_number: Option<u64>,
    pub observed_block_time: String,
    pub swap_tx_hash: String,
    /// Present in the same-block window only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_tx_index: Option<u64>,
    pub swap_log_index: Option<u64>,
    pub swap_topic0: String,
    pub decoded: Option<DecodedSwap>,
    pub raw_log: RawLogRecord,
}

/// errors.jsonl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub tx_hash: String,
    pub reason: String,
}

impl ErrorRecord {
    pub fn new(tx_hash: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            reason: reason.into(),
        }
    }
}

/// summary.csv row (column order is fixed, see `SummaryCsvWriter::HEADERS`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub tx_hash: String,
    pub block_number: u64,
    pub pool: String,
    pub profit_raw: String,
    pub profit_token: String,
    pub tx_to: String,
    pub tx_input_selector: String,
    pub n_swaps_in_tx: usize,
    pub n_swaps_same_block_after: usize,
    pub n_swaps_next_3_blocks: usize,
}

impl SummaryRow {
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.tx_hash.clone(),
            self.block_number.to_string(),
            self.pool.clone(),
            self.profit_raw.clone(),
            self.profit_token.clone(),
            self.tx_to.clone(),
            self.tx_input_selector.clone(),
            self.n_swaps_in_tx.to_string(),
            self.n_swaps_same_block_after.to_string(),
            self.n_swaps_next_3_blocks.to_string(),
        ]
    }
}

/// One follow-up swap seen after an origin swap (alternate flow)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupSwap {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    /// 0 = same block after the origin transaction, 1..=3 = next blocks
    pub block_offset: u64,
    pub log_index: Option<u64>,
    pub swapper: String,
    pub raw_topics: Vec<String>,
    pub raw_data: String,
}

/// swap_followups.jsonl - one line per origin swap log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupRecord {
    pub original_tx: String,
    pub block_number: u64,
    pub block_time: String,
    pub pool: String,
    pub swap_log_index: Option<u64>,
    pub swapper: String,
    pub raw_topics: Vec<String>,
    pub raw_data: String,
    pub n_followup_swaps: usize,
    pub followup_swaps: Vec<FollowupSwap>,
}
