//! Backrun Event Decoder
//!
//! Backrun log layout (target contract, topic0 = BACKRUN_TOPIC0):
//!     topic1          - pool address (low 20 bytes)
//!     data[96..128]   - profit amount, uint256
//!     data[140..160]  - profit token address (low 20 bytes of word 4)
//!
//! Created: 2026-02-10

use super::{address_from_topic, word_at, BACKRUN_TOPIC0, TARGET_CONTRACT, WORD};
use crate::types::RawLog;
use alloy::primitives::{Address, U256};
use tracing::warn;

/// Byte offset of the profit word
pub const PROFIT_OFFSET: usize = 3 * WORD;

/// Byte offset of the word holding the profit token
pub const PROFIT_TOKEN_OFFSET: usize = 4 * WORD;

/// Minimum payload covering both fields
pub const BACKRUN_DATA_LEN: usize = 5 * WORD;

/// Fields decoded from one backrun log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackrunPayload {
    pub pool: Address,
    pub profit: U256,
    pub profit_token: Address,
}

/// Backrun logs of a receipt, in receipt order: emitted by the target
/// contract, topic0 = backrun signature, at least two topics.
pub fn find_backrun_logs(logs: &[RawLog]) -> Vec<&RawLog> {
    logs.iter()
        .filter(|l| l.address == TARGET_CONTRACT && l.topics.len() >= 2 && l.topics[0] == BACKRUN_TOPIC0)
        .collect()
}

/// Decode a backrun log. Total: a truncated payload reads missing bytes
/// as zero, and the caller guarantees topic1 via `find_backrun_logs`.
pub fn decode_backrun(log: &RawLog) -> BackrunPayload {
    let data = &log.data[..];
    if data.len() < BACKRUN_DATA_LEN {
        warn!(
            "Backrun log {:?} has {} data bytes (< {}), missing bytes read as zero",
            log.log_index,
            data.len(),
            BACKRUN_DATA_LEN
        );
    }

    let pool = log
        .topics
        .get(1)
        .map(address_from_topic)
        .unwrap_or(Address::ZERO);
    let profit = U256::from_be_bytes(word_at(data, PROFIT_OFFSET));
    let token_word = word_at(data, PROFIT_TOKEN_OFFSET);

    BackrunPayload {
        pool,
        profit,
        profit_token: Address::from_slice(&token_word[12..]),
    }
}
