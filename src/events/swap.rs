//! Swap Log Decoder
//!
//! Dispatches on topic0 to one of two decoding schemes:
//!     V3     - fixed 5-word layout (amount0, amount1, sqrtPriceX96,
//!              liquidity, tick) with sender/recipient in topics 1-2
//!     Custom - unknown layout; up to 8 raw signed words plus any
//!              addresses recoverable from indexed topics
//!
//! Created: 2026-02-10

use super::{address_from_topic, word_at, CUSTOM_SWAP_TOPIC0, V3_SWAP_TOPIC0, WORD};
use crate::types::{decimal, decimal_seq, hex_addr, opt_hex_addr, RawLog};
use alloy::primitives::{Address, B256, I256, U256};
use alloy::sol;
use serde::{Deserialize, Serialize};

/// Minimum V3 Swap payload: 5 ABI words
pub const V3_SWAP_DATA_LEN: usize = 5 * WORD;

/// Maximum raw words kept for a custom swap
pub const CUSTOM_MAX_WORDS: usize = 8;

sol! {
    /// Uniswap V3 pool Swap event. Only the signature hash is taken from
    /// here; the payload is decoded by hand so short data is not an error.
    event Swap(
        address indexed sender,
        address indexed recipient,
        int256 amount0,
        int256 amount1,
        uint160 sqrtPriceX96,
        uint128 liquidity,
        int24 tick
    );
}

/// Decoded swap log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodedSwap {
    V3 {
        #[serde(with = "hex_addr")]
        sender: Address,
        #[serde(with = "hex_addr")]
        recipient: Address,
        #[serde(with = "decimal")]
        amount0: I256,
        #[serde(with = "decimal")]
        amount1: I256,
        #[serde(rename = "sqrtPriceX96", with = "decimal")]
        sqrt_price_x96: U256,
        #[serde(with = "decimal")]
        liquidity: U256,
        #[serde(with = "decimal")]
        tick: I256,
    },
    Custom {
        topic0: B256,
        #[serde(default, with = "opt_hex_addr", skip_serializing_if = "Option::is_none")]
        topic1_addr: Option<Address>,
        #[serde(default, with = "opt_hex_addr", skip_serializing_if = "Option::is_none")]
        topic2_addr: Option<Address>,
        #[serde(with = "decimal_seq")]
        words: Vec<I256>,
    },
    /// Signature matched but the log is corrupt
    DecodeError { message: String },
    /// Payload too short for the structured layout
    NotDecodable,
}

impl DecodedSwap {
    /// First signed data word: `amount0` for V3, `words[0]` for custom.
    /// This is the direction-bearing amount used by capture analysis.
    pub fn directional_amount(&self) -> Option<I256> {
        match self {
            DecodedSwap::V3 { amount0, .. } => Some(*amount0),
            DecodedSwap::Custom { words, .. } => words.first().copied(),
            DecodedSwap::DecodeError { .. } | DecodedSwap::NotDecodable => None,
        }
    }
}

/// Decode a swap log. `None` for an empty topic list or an unknown topic0.
pub fn decode_swap(log: &RawLog) -> Option<DecodedSwap> {
    let topic0 = log.topic0()?;
    if *topic0 == V3_SWAP_TOPIC0 {
        Some(decode_v3_swap(log))
    } else if *topic0 == CUSTOM_SWAP_TOPIC0 {
        Some(decode_custom_swap(log))
    } else {
        None
    }
}

fn signed_word(data: &[u8], offset: usize) -> I256 {
    I256::from_raw(U256::from_be_bytes(word_at(data, offset)))
}

fn unsigned_word(data: &[u8], offset: usize) -> U256 {
    U256::from_be_bytes(word_at(data, offset))
}

fn decode_v3_swap(log: &RawLog) -> DecodedSwap {
    let data = &log.data[..];
    if data.len() < V3_SWAP_DATA_LEN {
        return DecodedSwap::NotDecodable;
    }
    if log.topics.len() < 3 {
        return DecodedSwap::DecodeError {
            message: format!(
                "V3 swap needs 3 topics (signature, sender, recipient), got {}",
                log.topics.len()
            ),
        };
    }

    DecodedSwap::V3 {
        sender: address_from_topic(&log.topics[1]),
        recipient: address_from_topic(&log.topics[2]),
        amount0: signed_word(data, 0),
        amount1: signed_word(data, WORD),
        sqrt_price_x96: unsigned_word(data, 2 * WORD),
        liquidity: unsigned_word(data, 3 * WORD),
        tick: signed_word(data, 4 * WORD),
    }
}

fn decode_custom_swap(log: &RawLog) -> DecodedSwap {
    let data = &log.data[..];
    let n_words = (data.len() / WORD).min(CUSTOM_MAX_WORDS);

    DecodedSwap::Custom {
        topic0: CUSTOM_SWAP_TOPIC0,
        topic1_addr: log.topics.get(1).map(address_from_topic),
        topic2_addr: log.topics.get(2).map(address_from_topic),
        words: (0..n_words).map(|i| signed_word(data, i * WORD)).collect(),
    }
}
