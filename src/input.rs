//! Input lists
//!
//! Primary flow: one transaction hash per line.
//! Follow-up flow: `block_time|tx_hash|block_number|expected_count` rows.
//! Blank lines are ignored in both. Rows that cannot be parsed are skipped
//! with a warning so one bad line does not sink a long batch.

use alloy::primitives::TxHash;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

/// One row of the follow-up flow input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRow {
    pub block_time: String,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub expected_count: u64,
}

pub fn load_tx_hashes<P: AsRef<Path>>(path: P) -> Result<Vec<TxHash>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read tx hash list: {:?}", path))?;
    Ok(parse_tx_hashes(&content))
}

pub fn parse_tx_hashes(content: &str) -> Vec<TxHash> {
    content
        .lines()
        .enumerate()
        .filter_map(|(n, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.parse::<TxHash>() {
                Ok(h) => Some(h),
                Err(e) => {
                    warn!("Line {}: invalid tx hash {:?} ({}), skipping", n + 1, line, e);
                    None
                }
            }
        })
        .collect()
}

pub fn load_swap_rows<P: AsRef<Path>>(path: P) -> Result<Vec<SwapRow>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read swap list: {:?}", path))?;
    Ok(parse_swap_rows(&content))
}

/// Rows with fewer than four `|`-separated fields are ignored
pub fn parse_swap_rows(content: &str) -> Vec<SwapRow> {
    let mut rows = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        if parts.len() < 4 {
            continue;
        }

        let row = (|| -> Result<SwapRow> {
            Ok(SwapRow {
                block_time: parts[0].to_string(),
                tx_hash: parts[1].parse().context("tx hash")?,
                block_number: parts[2].parse().context("block number")?,
                expected_count: parts[3].parse().context("expected count")?,
            })
        })();

        match row {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Line {}: {:#}, skipping", n + 1, e),
        }
    }
    rows
}
