//! Output Sink
//!
//! Purpose:
//!     Persist correlation results as five JSONL streams plus one CSV
//!     summary under a single output directory.
//!
//! Created: 2026-02-10
//!
//! Files (all truncated at the start of a run):
//!     backruns.jsonl               - one line per decoded backrun event
//!     tx_pool_swaps.jsonl          - pool swaps inside the origin tx
//!     same_block_pool_swaps.jsonl  - pool swaps later in the same block
//!     next_blocks_pool_swaps.jsonl - pool swaps in blocks +1..+3
//!     errors.jsonl                 - {tx_hash, reason}
//!     summary.csv                  - one row per backrun event

pub mod checkpoint;
pub mod csv;
pub mod jsonl;
pub mod records;

pub use checkpoint::Checkpoint;
pub use csv::{read_summary, SummaryCsvWriter};
pub use jsonl::{read_jsonl, JsonlWriter};
pub use records::{
    BackrunRecord, ErrorRecord, FollowupRecord, FollowupSwap, RawLogRecord, SummaryRow, TxSwapRecord,
    WindowSwapRecord, REASON_NO_BACKRUN_LOG, REASON_RECEIPT_NULL,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BACKRUNS_FILE: &str = "backruns.jsonl";
pub const TX_SWAPS_FILE: &str = "tx_pool_swaps.jsonl";
pub const SAME_BLOCK_SWAPS_FILE: &str = "same_block_pool_swaps.jsonl";
pub const NEXT_BLOCKS_SWAPS_FILE: &str = "next_blocks_pool_swaps.jsonl";
pub const ERRORS_FILE: &str = "errors.jsonl";
pub const SUMMARY_FILE: &str = "summary.csv";

/// Destination for everything the primary flow produces
pub trait BackrunSink {
    fn backrun(&mut self, record: &BackrunRecord) -> Result<()>;
    fn tx_swap(&mut self, record: &TxSwapRecord) -> Result<()>;
    fn same_block_swap(&mut self, record: &WindowSwapRecord) -> Result<()>;
    fn next_block_swap(&mut self, record: &WindowSwapRecord) -> Result<()>;
    fn error(&mut self, record: &ErrorRecord) -> Result<()>;
    fn summary(&mut self, row: &SummaryRow) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// File-backed sink rooted at one output directory
pub struct OutputSink {
    dir: PathBuf,
    backruns: JsonlWriter,
    tx_swaps: JsonlWriter,
    same_block: JsonlWriter,
    next_blocks: JsonlWriter,
    errors: JsonlWriter,
    summary: SummaryCsvWriter,
}

impl OutputSink {
    /// Create `dir` if needed and truncate all six files
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create output directory: {:?}", dir))?;

        Ok(Self {
            backruns: JsonlWriter::create(dir.join(BACKRUNS_FILE))?,
            tx_swaps: JsonlWriter::create(dir.join(TX_SWAPS_FILE))?,
            same_block: JsonlWriter::create(dir.join(SAME_BLOCK_SWAPS_FILE))?,
            next_blocks: JsonlWriter::create(dir.join(NEXT_BLOCKS_SWAPS_FILE))?,
            errors: JsonlWriter::create(dir.join(ERRORS_FILE))?,
            summary: SummaryCsvWriter::create(dir.join(SUMMARY_FILE))?,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Flush everything and log per-file counts
    pub fn finish(mut self) -> Result<()> {
        self.flush()?;
        info!("Output written to {:?}", self.dir);
        for w in [&self.backruns, &self.tx_swaps, &self.same_block, &self.next_blocks, &self.errors] {
            info!("  {:?}: {} records", w.path(), w.records());
        }
        info!("  {:?}: {} rows", self.dir.join(SUMMARY_FILE), self.summary.rows());
        Ok(())
    }
}

impl BackrunSink for OutputSink {
    fn backrun(&mut self, record: &BackrunRecord) -> Result<()> {
        self.backruns.write(record)
    }

    fn tx_swap(&mut self, record: &TxSwapRecord) -> Result<()> {
        self.tx_swaps.write(record)
    }

    fn same_block_swap(&mut self, record: &WindowSwapRecord) -> Result<()> {
        self.same_block.write(record)
    }

    fn next_block_swap(&mut self, record: &WindowSwapRecord) -> Result<()> {
        self.next_blocks.write(record)
    }

    fn error(&mut self, record: &ErrorRecord) -> Result<()> {
        self.errors.write(record)
    }

    fn summary(&mut self, row: &SummaryRow) -> Result<()> {
        self.summary.write(row)
    }

    fn flush(&mut self) -> Result<()> {
        self.backruns.flush()?;
        self.tx_swaps.flush()?;
        self.same_block.flush()?;
        self.next_blocks.flush()?;
        self.errors.flush()?;
        self.summary.flush()
    }
}
