//! Event Decoder Module
//!
//! Purpose:
//!     Decode raw logs into typed backrun and swap records. Every decoder is
//!     total: it returns a value for any topic count and payload length.
//!
//! Created: 2026-02-10
//!
//! Supported topic0 signatures:
//!     0x4866868b…6fd7 - protocol backrun event (target contract only)
//!     0xc42079f9…ca67 - Swap(address,address,int256,int256,uint160,uint128,int24)
//!     0x121cb44e…9f79 - custom pool swap (layout unknown, decoded best-effort)

pub mod backrun;
pub mod swap;

pub use backrun::{decode_backrun, find_backrun_logs, BackrunPayload};
pub use swap::{decode_swap, DecodedSwap};

use alloy::primitives::{address, b256, Address, B256};

/// Protocol contract emitting backrun events
pub const TARGET_CONTRACT: Address = address!("0x74c51815f070803d53bb6879df6fc1648d741212");

/// Backrun event topic0
pub const BACKRUN_TOPIC0: B256 =
    b256!("0x4866868bf8ccc56c236dc0ed3f2d82a498301866dc9edbf731a9b2b4c8716fd7");

/// keccak256("Swap(address,address,int256,int256,uint160,uint128,int24)")
pub const V3_SWAP_TOPIC0: B256 =
    b256!("0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");

/// Custom swap topic0 seen on the protocol's pools
pub const CUSTOM_SWAP_TOPIC0: B256 =
    b256!("0x121cb44ee54098b1a04743c487e7460d8dd429b27f88b1f4d4767396e1a59f79");

/// Both swap signatures, in `eth_getLogs` topic-set order
pub const SWAP_TOPICS: [B256; 2] = [V3_SWAP_TOPIC0, CUSTOM_SWAP_TOPIC0];

/// ABI word size
pub const WORD: usize = 32;

/// Address stored in the low 20 bytes of a 32-byte topic
pub fn address_from_topic(topic: &B256) -> Address {
    Address::from_word(*topic)
}

/// 32-byte word at `offset`, zero-filled past the end of `data`
pub(crate) fn word_at(data: &[u8], offset: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    if offset < data.len() {
        let end = (offset + WORD).min(data.len());
        word[..end - offset].copy_from_slice(&data[offset..end]);
    }
    word
}
