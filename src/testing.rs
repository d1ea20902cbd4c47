//! In-memory chain for engine tests

use crate::output::{BackrunRecord, BackrunSink, ErrorRecord, SummaryRow, TxSwapRecord, WindowSwapRecord};
use crate::rpc::{ChainReader, LogFilter, RpcError};
use crate::types::{BlockHeader, RawLog, Receipt, TransactionBody};
use alloy::primitives::{Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockChain {
    receipts: HashMap<TxHash, Receipt>,
    txs: HashMap<TxHash, TransactionBody>,
    blocks: HashMap<u64, u64>,
    logs: Vec<RawLog>,
    failing: HashSet<TxHash>,
    calls: Mutex<Vec<String>>,
    filters: Mutex<Vec<LogFilter>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, number: u64, timestamp: u64) -> Self {
        self.blocks.insert(number, timestamp);
        self
    }

    pub fn with_receipt(mut self, tx_hash: TxHash, receipt: Receipt) -> Self {
        self.receipts.insert(tx_hash, receipt);
        self
    }

    pub fn with_tx(mut self, tx_hash: TxHash, tx: TransactionBody) -> Self {
        self.txs.insert(tx_hash, tx);
        self
    }

    /// Log visible to `eth_getLogs`
    pub fn with_log(mut self, log: RawLog) -> Self {
        self.logs.push(log);
        self
    }

    /// Receipt lookups for `tx_hash` fail with an RPC error
    pub fn failing_receipt(mut self, tx_hash: TxHash) -> Self {
        self.failing.insert(tx_hash);
        self
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| m.as_str() == method).count()
    }

    pub fn log_queries(&self) -> Vec<LogFilter> {
        self.filters.lock().unwrap().clone()
    }

    fn record(&self, method: &str) {
        self.calls.lock().unwrap().push(method.to_string());
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError> {
        self.record("eth_getTransactionReceipt");
        if self.failing.contains(&tx_hash) {
            return Err(RpcError::Rpc {
                code: -32000,
                message: "upstream unavailable".to_string(),
            });
        }
        Ok(self.receipts.get(&tx_hash).cloned())
    }

    async fn transaction_by_hash(&self, tx_hash: TxHash) -> Result<Option<TransactionBody>, RpcError> {
        self.record("eth_getTransactionByHash");
        Ok(self.txs.get(&tx_hash).cloned())
    }

    async fn block_header(&self, number: u64) -> Result<Option<BlockHeader>, RpcError> {
        self.record("eth_getBlockByNumber");
        Ok(self
            .blocks
            .get(&number)
            .map(|&timestamp| BlockHeader { number, timestamp }))
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, RpcError> {
        self.record("eth_getLogs");
        self.filters.lock().unwrap().push(filter.clone());
        Ok(self.logs.iter().filter(|l| filter.accepts(l)).cloned().collect())
    }
}

/// Deterministic hash for test fixtures
pub fn tx_hash(n: u8) -> TxHash {
    B256::repeat_byte(n)
}

/// Log fixture
pub fn raw_log(
    address: Address,
    topics: Vec<B256>,
    data: Vec<u8>,
    tx: TxHash,
    tx_index: u64,
    log_index: u64,
    block: u64,
) -> RawLog {
    RawLog {
        address,
        topics,
        data: Bytes::from(data),
        log_index: Some(log_index),
        transaction_hash: Some(tx),
        transaction_index: Some(tx_index),
        block_number: Some(block),
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub backruns: Vec<BackrunRecord>,
    pub tx_swaps: Vec<TxSwapRecord>,
    pub same_block: Vec<WindowSwapRecord>,
    pub next_blocks: Vec<WindowSwapRecord>,
    pub errors: Vec<ErrorRecord>,
    pub summary: Vec<SummaryRow>,
}

impl BackrunSink for MemorySink {
    fn backrun(&mut self, record: &BackrunRecord) -> anyhow::Result<()> {
        self.backruns.push(record.clone());
        Ok(())
    }

    fn tx_swap(&mut self, record: &TxSwapRecord) -> anyhow::Result<()> {
        self.tx_swaps.push(record.clone());
        Ok(())
    }

    fn same_block_swap(&mut self, record: &WindowSwapRecord) -> anyhow::Result<()> {
        self.same_block.push(record.clone());
        Ok(())
    }

    fn next_block_swap(&mut self, record: &WindowSwapRecord) -> anyhow::Result<()> {
        self.next_blocks.push(record.clone());
        Ok(())
    }

    fn error(&mut self, record: &ErrorRecord) -> anyhow::Result<()> {
        self.errors.push(record.clone());
        Ok(())
    }

    fn summary(&mut self, row: &SummaryRow) -> anyhow::Result<()> {
        self.summary.push(row.clone());
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
