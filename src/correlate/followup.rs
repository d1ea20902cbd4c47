//! Follow-up swap flow
//!
//! Investigates one user-chosen swap topic0 instead of the backrun event.
//! Every receipt log with that topic0 is an origin swap keyed by its own
//! pool; the origin swapper is the receipt sender. Follow-ups come from the
//! same-block-after window and the next three blocks, each with its acting
//! address resolved through `eth_getTransactionByHash`.
//!
//! Output is one JSONL record per origin swap. The output file is its own
//! checkpoint: transactions whose hash already appears are skipped.
//!
//! Created: 2026-02-12

use super::window::{in_block, same_block_after, Origin, NEXT_BLOCK_OFFSETS};
use crate::input::SwapRow;
use crate::output::{Checkpoint, FollowupRecord, FollowupSwap, JsonlWriter};
use crate::rpc::ChainReader;
use crate::types::{hex_address, hex_b256, RawLog};
use alloy::primitives::{hex, B256};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

/// Progress is logged every this many input rows
pub const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowupStats {
    pub processed: usize,
    pub skipped: usize,
    pub records: usize,
    pub errors: usize,
}

pub struct FollowupCorrelator<R> {
    reader: R,
    topic0: B256,
}

impl<R: ChainReader> FollowupCorrelator<R> {
    pub fn new(reader: R, topic0: B256) -> Self {
        Self { reader, topic0 }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Process `rows` in order, skipping those already in `checkpoint`.
    /// Records of one transaction are written together and flushed.
    pub async fn run(&self, rows: &[SwapRow], checkpoint: &mut Checkpoint, out: &mut JsonlWriter) -> Result<FollowupStats> {
        let total = rows.len();
        let mut stats = FollowupStats::default();

        for (i, row) in rows.iter().enumerate() {
            let hash = hex_b256(&row.tx_hash);
            if checkpoint.contains(&hash) {
                stats.skipped += 1;
                continue;
            }

            match self.correlate_row(row).await {
                Ok(records) => {
                    for record in &records {
                        out.write(record)?;
                    }
                    out.flush()?;
                    if !records.is_empty() {
                        checkpoint.insert(&hash);
                    }
                    stats.records += records.len();
                }
                Err(e) => {
                    error!("Failed {}: {:#}", hash, e);
                    stats.errors += 1;
                }
            }
            stats.processed += 1;

            if (i + 1) % PROGRESS_EVERY == 0 || i + 1 == total {
                info!(
                    "Processed {}/{} txs, swap records: {}, errors: {}",
                    i + 1,
                    total,
                    stats.records,
                    stats.errors
                );
            }
        }

        Ok(stats)
    }

    /// Records for every origin swap of one input row. Empty when the
    /// receipt is missing or holds no log with the chosen topic0.
    pub async fn correlate_row(&self, row: &SwapRow) -> Result<Vec<FollowupRecord>> {
        let hash = hex_b256(&row.tx_hash);
        let receipt = self
            .reader
            .transaction_receipt(row.tx_hash)
            .await
            .with_context(|| format!("eth_getTransactionReceipt {}", hash))?;
        let Some(receipt) = receipt else {
            error!("No receipt for {}", hash);
            return Ok(Vec::new());
        };

        if receipt.block_number != row.block_number {
            warn!(
                "{}: input says block {}, receipt says {}; using the receipt",
                hash, row.block_number, receipt.block_number
            );
        }

        let origin = Origin {
            tx_hash: row.tx_hash,
            block_number: receipt.block_number,
            transaction_index: receipt.transaction_index,
        };
        let swapper = receipt.from.as_ref().map(hex_address).unwrap_or_default();

        let swap_logs: Vec<&RawLog> = receipt
            .logs
            .iter()
            .filter(|l| l.topic0() == Some(&self.topic0))
            .collect();
        if swap_logs.is_empty() {
            warn!("No swap logs in {} (expected {})", hash, row.expected_count);
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(swap_logs.len());
        for log in swap_logs {
            let followup_swaps = self.followups(&origin, log).await?;
            records.push(FollowupRecord {
                original_tx: hash.clone(),
                block_number: origin.block_number,
                block_time: row.block_time.clone(),
                pool: hex_address(&log.address),
                swap_log_index: log.log_index,
                swapper: swapper.clone(),
                raw_topics: log.topics.iter().map(hex_b256).collect(),
                raw_data: hex::encode_prefixed(&log.data),
                n_followup_swaps: followup_swaps.len(),
                followup_swaps,
            });
        }

        Ok(records)
    }

    async fn followups(&self, origin: &Origin, swap: &RawLog) -> Result<Vec<FollowupSwap>> {
        let topics = [self.topic0];
        let mut found = Vec::new();

        for log in same_block_after(&self.reader, origin, swap.address, &topics)
            .await
            .with_context(|| format!("eth_getLogs block {}", origin.block_number))?
        {
            found.push(self.followup(&log, 0).await?);
        }

        for offset in NEXT_BLOCK_OFFSETS {
            let block = origin.block_number + offset;
            let logs = in_block(&self.reader, block, swap.address, &topics)
                .await
                .with_context(|| format!("eth_getLogs block {}", block))?;
            for log in &logs {
                found.push(self.followup(log, offset).await?);
            }
        }

        Ok(found)
    }

    async fn followup(&self, log: &RawLog, block_offset: u64) -> Result<FollowupSwap> {
        let swapper = match log.transaction_hash {
            Some(h) => self
                .reader
                .transaction_by_hash(h)
                .await
                .with_context(|| format!("eth_getTransactionByHash {}", hex_b256(&h)))?
                .and_then(|body| body.from)
                .as_ref()
                .map(hex_address)
                .unwrap_or_default(),
            None => String::new(),
        };

        Ok(FollowupSwap {
            tx_hash: log.transaction_hash.as_ref().map(hex_b256).unwrap_or_default(),
            block_number: log.block_number,
            block_offset,
            log_index: log.log_index,
            swapper,
            raw_topics: log.topics.iter().map(hex_b256).collect(),
            raw_data: hex::encode_prefixed(&log.data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CUSTOM_SWAP_TOPIC0;
    use crate::output::read_jsonl;
    use crate::testing::{raw_log, tx_hash, MockChain};
    use crate::types::{Receipt, TransactionBody};
    use alloy::primitives::{address, Address};
    use std::env;
    use std::fs;

    const POOL: Address = address!("0x00000000000000000000000000000000000000aa");
    const ALICE: Address = address!("0x000000000000000000000000000000000000a11c");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
    const BLOCK: u64 = 500;

    fn swap(tx: u8, tx_index: u64, log_index: u64, block: u64) -> RawLog {
        raw_log(POOL, vec![CUSTOM_SWAP_TOPIC0], vec![0u8; 32], tx_hash(tx), tx_index, log_index, block)
    }

    fn row(tx: u8) -> SwapRow {
        SwapRow {
            block_time: "2026-02-01 10:00:00".to_string(),
            tx_hash: tx_hash(tx),
            block_number: BLOCK,
            expected_count: 1,
        }
    }

    fn chain() -> MockChain {
        MockChain::new()
            .with_receipt(
                tx_hash(1),
                Receipt {
                    block_number: BLOCK,
                    transaction_index: 2,
                    from: Some(ALICE),
                    logs: vec![swap(1, 2, 4, BLOCK)],
                },
            )
            .with_tx(
                tx_hash(2),
                TransactionBody {
                    from: Some(BOB),
                    ..Default::default()
                },
            )
            // origin itself, one later tx in the block, one in block+3
            .with_log(swap(1, 2, 4, BLOCK))
            .with_log(swap(2, 5, 9, BLOCK))
            .with_log(swap(3, 0, 1, BLOCK + 3))
    }

    #[tokio::test]
    async fn test_followups_with_offsets_and_swappers() {
        let correlator = FollowupCorrelator::new(chain(), CUSTOM_SWAP_TOPIC0);
        let records = correlator.correlate_row(&row(1)).await.unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.original_tx, hex_b256(&tx_hash(1)));
        assert_eq!(r.pool, hex_address(&POOL));
        assert_eq!(r.swapper, hex_address(&ALICE));
        assert_eq!(r.swap_log_index, Some(4));
        assert_eq!(r.n_followup_swaps, 2);

        let f = &r.followup_swaps;
        assert_eq!((f[0].block_offset, f[0].swapper.as_str()), (0, hex_address(&BOB).as_str()));
        // no body for tx 3: swapper left empty
        assert_eq!((f[1].block_offset, f[1].swapper.as_str()), (3, ""));
        assert_eq!(f[1].block_number, Some(BLOCK + 3));

        let queries = correlator.reader().log_queries();
        assert_eq!(queries.len(), 4);
        assert!(queries.iter().all(|q| q.topics == vec![vec![CUSTOM_SWAP_TOPIC0]]));
        assert_eq!(correlator.reader().calls_to("eth_getTransactionByHash"), 2);
    }

    #[tokio::test]
    async fn test_missing_receipt_yields_nothing() {
        let correlator = FollowupCorrelator::new(MockChain::new(), CUSTOM_SWAP_TOPIC0);
        assert!(correlator.correlate_row(&row(9)).await.unwrap().is_empty());
        assert_eq!(correlator.reader().calls_to("eth_getLogs"), 0);
    }

    #[tokio::test]
    async fn test_resume_does_not_duplicate() {
        let dir = env::temp_dir().join("backrun_capture_followup_resume");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("swap_followups.jsonl");
        let correlator = FollowupCorrelator::new(chain(), CUSTOM_SWAP_TOPIC0);

        // first run sees only the first row
        let mut cp = Checkpoint::load(&path, "original_tx").unwrap();
        let mut out = JsonlWriter::create(&path).unwrap();
        let stats = correlator.run(&[row(1)], &mut cp, &mut out).await.unwrap();
        assert_eq!(stats.records, 1);
        drop(out);

        // restart over the full list
        let mut cp = Checkpoint::load(&path, "original_tx").unwrap();
        assert_eq!(cp.len(), 1);
        let mut out = JsonlWriter::append_to(&path).unwrap();
        let stats = correlator.run(&[row(1), row(7)], &mut cp, &mut out).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.processed, 1);
        drop(out);

        let records: Vec<FollowupRecord> = read_jsonl(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original_tx, hex_b256(&tx_hash(1)));

        let _ = fs::remove_dir_all(&dir);
    }
}
