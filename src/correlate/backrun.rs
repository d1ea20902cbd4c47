//! Backrun correlation
//!
//! Per transaction:
//!     receipt (null → `receipt_null`, stop)
//!     → transaction body (best effort)
//!     → origin block time (cache)
//!     → backrun logs (none → `no_backrun_log`, stop)
//!     → per backrun event: event record, three swap windows, summary row
//!
//! Created: 2026-02-10

use super::window::{in_block, same_block_after, same_transaction, Origin, NEXT_BLOCK_OFFSETS};
use crate::block_cache::BlockCache;
use crate::events::{decode_backrun, decode_swap, find_backrun_logs, SWAP_TOPICS};
use crate::output::{
    BackrunRecord, BackrunSink, ErrorRecord, RawLogRecord, SummaryRow, TxSwapRecord, WindowSwapRecord,
    REASON_NO_BACKRUN_LOG, REASON_RECEIPT_NULL,
};
use crate::rpc::ChainReader;
use crate::types::{hex_address, hex_b256, RawLog};
use alloy::primitives::TxHash;
use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

/// Progress is logged every this many transactions
pub const PROGRESS_EVERY: usize = 10;

/// How far one transaction got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    MissingReceipt,
    NoBackrunLog,
    Correlated { backruns: usize },
}

impl TxOutcome {
    pub fn backruns(&self) -> usize {
        match self {
            TxOutcome::Correlated { backruns } => *backruns,
            _ => 0,
        }
    }
}

/// Run totals. A transaction yielding no backrun event counts as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub backruns: usize,
    pub errors: usize,
}

/// Fields shared by every record of one origin transaction
struct TxContext {
    origin: Origin,
    tx_hash: String,
    block_time: String,
    tx_to: String,
    selector: String,
}

/// Drives the backrun flow over a `ChainReader`
pub struct BackrunCorrelator<R> {
    reader: R,
    blocks: BlockCache,
}

impl<R: ChainReader> BackrunCorrelator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            blocks: BlockCache::new(),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn block_cache(&self) -> &BlockCache {
        &self.blocks
    }

    /// Process every hash in input order. Per-transaction failures are
    /// written to the error stream and never abort the batch; only sink
    /// failures do.
    pub async fn run(&mut self, tx_hashes: &[TxHash], sink: &mut dyn BackrunSink) -> Result<RunStats> {
        let total = tx_hashes.len();
        let mut stats = RunStats::default();

        for (i, tx_hash) in tx_hashes.iter().enumerate() {
            match self.process_tx(*tx_hash, sink).await {
                Ok(outcome) => {
                    let n = outcome.backruns();
                    stats.backruns += n;
                    if n == 0 {
                        stats.errors += 1;
                    }
                }
                Err(e) => {
                    let hash = hex_b256(tx_hash);
                    error!("Failed tx {}: {:#}", hash, e);
                    sink.error(&ErrorRecord::new(hash, format!("{:#}", e)))?;
                    stats.errors += 1;
                }
            }
            stats.processed += 1;

            if (i + 1) % PROGRESS_EVERY == 0 || i + 1 == total {
                info!(
                    "Processed {}/{} txs, backruns found: {}, errors: {}",
                    i + 1,
                    total,
                    stats.backruns,
                    stats.errors
                );
            }
        }

        Ok(stats)
    }

    /// Correlate one transaction and write its records to `sink`
    pub async fn process_tx(&mut self, tx_hash: TxHash, sink: &mut dyn BackrunSink) -> Result<TxOutcome> {
        let hash = hex_b256(&tx_hash);

        let receipt = self
            .reader
            .transaction_receipt(tx_hash)
            .await
            .with_context(|| format!("eth_getTransactionReceipt {}", hash))?;
        let Some(receipt) = receipt else {
            sink.error(&ErrorRecord::new(hash, REASON_RECEIPT_NULL))?;
            return Ok(TxOutcome::MissingReceipt);
        };

        let body = match self.reader.transaction_by_hash(tx_hash).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Transaction body for {} unavailable: {}", hash, e);
                None
            }
        };
        let tx_to = body.as_ref().map(|b| b.to_hex()).unwrap_or_default();
        let selector = body
            .as_ref()
            .map(|b| b.selector_hex())
            .unwrap_or_else(|| "0x".to_string());

        let block_time = self
            .blocks
            .block_time(&self.reader, receipt.block_number)
            .await
            .with_context(|| format!("eth_getBlockByNumber {}", receipt.block_number))?;

        let backrun_logs = find_backrun_logs(&receipt.logs);
        if backrun_logs.is_empty() {
            sink.error(&ErrorRecord::new(hash, REASON_NO_BACKRUN_LOG))?;
            return Ok(TxOutcome::NoBackrunLog);
        }

        let ctx = TxContext {
            origin: Origin {
                tx_hash,
                block_number: receipt.block_number,
                transaction_index: receipt.transaction_index,
            },
            tx_hash: hash,
            block_time,
            tx_to,
            selector,
        };

        for log in &backrun_logs {
            self.correlate_event(&ctx, &receipt.logs, log, sink).await?;
        }

        Ok(TxOutcome::Correlated {
            backruns: backrun_logs.len(),
        })
    }

    async fn correlate_event(
        &mut self,
        ctx: &TxContext,
        receipt_logs: &[RawLog],
        backrun_log: &RawLog,
        sink: &mut dyn BackrunSink,
    ) -> Result<()> {
        let payload = decode_backrun(backrun_log);
        let pool = hex_address(&payload.pool);
        let block = ctx.origin.block_number;
        let profit_raw = payload.profit.to_string();
        let profit_token = hex_address(&payload.profit_token);

        sink.backrun(&BackrunRecord {
            tx_hash: ctx.tx_hash.clone(),
            block_number: block,
            block_time: ctx.block_time.clone(),
            backrun_log_index: backrun_log.log_index,
            pool: pool.clone(),
            profit_raw: profit_raw.clone(),
            profit_token: profit_token.clone(),
            tx_to: ctx.tx_to.clone(),
            tx_input_selector: ctx.selector.clone(),
            raw_backrun_log: RawLogRecord::from(backrun_log),
        })?;

        let in_tx = same_transaction(receipt_logs, &payload.pool, &SWAP_TOPICS);
        for log in &in_tx {
            sink.tx_swap(&TxSwapRecord {
                tx_hash: ctx.tx_hash.clone(),
                block_number: block,
                pool: pool.clone(),
                swap_tx_hash: ctx.tx_hash.clone(),
                swap_log_index: log.log_index,
                swap_topic0: topic0_hex(log),
                decoded: decode_swap(log),
                raw_log: RawLogRecord::from(*log),
            })?;
        }

        let same_block = same_block_after(&self.reader, &ctx.origin, payload.pool, &SWAP_TOPICS)
            .await
            .with_context(|| format!("eth_getLogs block {} pool {}", block, pool))?;
        for log in &same_block {
            let mut record = window_record(ctx, &pool, Some(block), &ctx.block_time, log);
            record.swap_tx_index = Some(log.transaction_index.unwrap_or(0));
            sink.same_block_swap(&record)?;
        }

        let mut n_next = 0;
        for offset in NEXT_BLOCK_OFFSETS {
            let next = block + offset;
            let next_time = self
                .blocks
                .block_time(&self.reader, next)
                .await
                .with_context(|| format!("eth_getBlockByNumber {}", next))?;
            let logs = in_block(&self.reader, next, payload.pool, &SWAP_TOPICS)
                .await
                .with_context(|| format!("eth_getLogs block {} pool {}", next, pool))?;
            for log in &logs {
                sink.next_block_swap(&window_record(ctx, &pool, log.block_number, &next_time, log))?;
            }
            n_next += logs.len();
        }

        debug!(
            "{} pool {}: {} in tx, {} same block after, {} next blocks",
            ctx.tx_hash,
            pool,
            in_tx.len(),
            same_block.len(),
            n_next
        );

        sink.summary(&SummaryRow {
            tx_hash: ctx.tx_hash.clone(),
            block_number: block,
            pool,
            profit_raw,
            profit_token,
            tx_to: ctx.tx_to.clone(),
            tx_input_selector: ctx.selector.clone(),
            n_swaps_in_tx: in_tx.len(),
            n_swaps_same_block_after: same_block.len(),
            n_swaps_next_3_blocks: n_next,
        })
    }
}

fn topic0_hex(log: &RawLog) -> String {
    log.topic0().map(hex_b256).unwrap_or_default()
}

fn window_record(
    ctx: &TxContext,
    pool: &str,
    observed_block: Option<u64>,
    observed_time: &str,
    log: &RawLog,
) -> WindowSwapRecord {
    WindowSwapRecord {
        origin_tx_hash: ctx.tx_hash.clone(),
        origin_block_number: ctx.origin.block_number,
        pool: pool.to_string(),
        observed_block_number: observed_block,
        observed_block_time: observed_time.to_string(),
        swap_tx_hash: log.transaction_hash.as_ref().map(hex_b256).unwrap_or_default(),
        swap_tx_index: None,
        swap_log_index: log.log_index,
        swap_topic0: topic0_hex(log),
        decoded: decode_swap(log),
        raw_log: RawLogRecord::from(log),
    }
}
