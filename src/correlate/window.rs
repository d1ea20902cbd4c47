//! Correlation windows
//!
//! Three fixed-width scopes searched for swaps on one pool, shared by the
//! backrun flow and the follow-up flow:
//!     same transaction  - logs already in the origin receipt
//!     same block, after - one `eth_getLogs` over [block, block], keeping
//!                         transactions with a strictly greater index
//!     next blocks       - one `eth_getLogs` per block in +1..=+3

use crate::rpc::{ChainReader, LogFilter, RpcError};
use crate::types::RawLog;
use alloy::primitives::{Address, TxHash, B256};

/// Blocks after the origin block scanned for follow-up swaps
pub const NEXT_BLOCK_OFFSETS: [u64; 3] = [1, 2, 3];

/// Position of the origin transaction on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub transaction_index: u64,
}

/// Receipt logs emitted by `pool` with topic0 in `signatures`, in log order
pub fn same_transaction<'a>(logs: &'a [RawLog], pool: &Address, signatures: &[B256]) -> Vec<&'a RawLog> {
    logs.iter().filter(|l| l.matches(pool, signatures)).collect()
}

/// Swaps on `pool` later in the origin block. Excludes the origin
/// transaction itself and any transaction index <= the origin's.
pub async fn same_block_after<R>(
    reader: &R,
    origin: &Origin,
    pool: Address,
    signatures: &[B256],
) -> Result<Vec<RawLog>, RpcError>
where
    R: ChainReader + ?Sized,
{
    let filter = LogFilter::single_block(origin.block_number, pool, signatures);
    let logs = reader.logs(&filter).await?;

    Ok(logs
        .into_iter()
        .filter(|l| l.transaction_hash != Some(origin.tx_hash))
        .filter(|l| l.transaction_index.unwrap_or(0) > origin.transaction_index)
        .collect())
}

/// Every swap on `pool` in block `block` (the whole block is "after")
pub async fn in_block<R>(reader: &R, block: u64, pool: Address, signatures: &[B256]) -> Result<Vec<RawLog>, RpcError>
where
    R: ChainReader + ?Sized,
{
    reader.logs(&LogFilter::single_block(block, pool, signatures)).await
}
