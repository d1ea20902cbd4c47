//! Capture Efficiency
//!
//! Purpose:
//!     Estimate, per backrun event, how much of the rebalancing value the
//!     protocol kept versus leaked to market swaps in the next blocks.
//!
//! Created: 2026-02-14
//!
//! Inputs (materialised by `extract-backruns`):
//!     summary.csv                  - events and their profit
//!     tx_pool_swaps.jsonl          - protocol swaps, keyed by (tx, pool)
//!     next_blocks_pool_swaps.jsonl - market swaps, minus protocol txs
//!
//! A swap's direction is the sign of its first signed data word. The
//! leakage heuristic is a `LeakagePolicy`; `DirectionalVolumePolicy` is
//! the default.

use crate::output::{
    read_jsonl, read_summary, SummaryRow, TxSwapRecord, WindowSwapRecord, NEXT_BLOCKS_SWAPS_FILE, SUMMARY_FILE,
    TX_SWAPS_FILE,
};
use alloy::primitives::{I256, U256};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Report file written next to the extractor outputs
pub const EFFICIENCY_FILE: &str = "capture_efficiency.csv";

/// Efficiency at or above this counts as full capture
pub const FULL_CAPTURE_THRESHOLD: f64 = 1.0 - 1e-9;

/// Swaps attributed to one backrun event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSwaps {
    pub tx_hash: String,
    pub pool: String,
    pub profit: U256,
    /// Directional amounts of the protocol's own swaps on the pool
    pub protocol: Vec<I256>,
    /// Directional amounts of market swaps in the next blocks
    pub market: Vec<I256>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventEfficiency {
    pub tx_hash: String,
    pub pool: String,
    pub profit: f64,
    pub leaked: f64,
    pub efficiency: f64,
}

/// Value leaked to the market for one event, in profit-token units
pub trait LeakagePolicy {
    fn leaked(&self, profit: U256, protocol: &[I256], market: &[I256]) -> f64;
}

/// Prices leakage at the protocol's profit per unit of directional volume.
///
/// With `net` the sum of protocol amounts: no swaps or `net == 0` leak
/// nothing. Otherwise `ratio = profit / dir_vol`, where `dir_vol` is the
/// absolute volume of protocol swaps sharing `net`'s sign (or `|net|` if
/// that is zero), and every market swap of the opposite sign leaks
/// `|amount| * ratio`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionalVolumePolicy;

impl LeakagePolicy for DirectionalVolumePolicy {
    fn leaked(&self, profit: U256, protocol: &[I256], market: &[I256]) -> f64 {
        if protocol.is_empty() {
            return 0.0;
        }
        let net = protocol.iter().fold(I256::ZERO, |acc, a| acc.saturating_add(*a));
        if net.is_zero() {
            return 0.0;
        }

        let net_positive = net.is_positive();
        let mut dir_vol = protocol
            .iter()
            .filter(|a| a.is_positive() == net_positive)
            .fold(U256::ZERO, |acc, a| acc.saturating_add(a.unsigned_abs()));
        if dir_vol.is_zero() {
            dir_vol = net.unsigned_abs();
        }

        let ratio = to_f64(profit) / to_f64(dir_vol);
        market
            .iter()
            .filter(|m| m.is_positive() != net_positive)
            .map(|m| to_f64(m.unsigned_abs()) * ratio)
            .sum()
    }
}

fn to_f64(value: U256) -> f64 {
    value.to_string().parse().unwrap_or(f64::MAX)
}

/// `profit / (profit + leaked)`, or 1.0 when that denominator is not positive
pub fn capture_efficiency<P: LeakagePolicy + ?Sized>(event: &EventSwaps, policy: &P) -> EventEfficiency {
    let profit = to_f64(event.profit);
    let leaked = policy.leaked(event.profit, &event.protocol, &event.market);
    let efficiency = if profit + leaked > 0.0 {
        profit / (profit + leaked)
    } else {
        1.0
    };

    EventEfficiency {
        tx_hash: event.tx_hash.clone(),
        pool: event.pool.clone(),
        profit,
        leaked,
        efficiency,
    }
}

/// Per-event results plus aggregates
#[derive(Debug, Clone, Default)]
pub struct CaptureReport {
    pub events: Vec<EventEfficiency>,
}

impl CaptureReport {
    pub fn compute<P: LeakagePolicy + ?Sized>(events: &[EventSwaps], policy: &P) -> Self {
        Self {
            events: events.iter().map(|e| capture_efficiency(e, policy)).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn full_capture_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.efficiency >= FULL_CAPTURE_THRESHOLD)
            .count()
    }

    /// Median efficiency; mean of the two middle values for an even count
    pub fn median(&self) -> Option<f64> {
        let mut effs: Vec<f64> = self.events.iter().map(|e| e.efficiency).collect();
        if effs.is_empty() {
            return None;
        }
        effs.sort_by(|a, b| a.total_cmp(b));
        let mid = effs.len() / 2;
        Some(if effs.len() % 2 == 0 {
            (effs[mid - 1] + effs[mid]) / 2.0
        } else {
            effs[mid]
        })
    }

    /// `Σ profit / (Σ profit + Σ leaked)`
    pub fn weighted(&self) -> Option<f64> {
        let profit: f64 = self.events.iter().map(|e| e.profit).sum();
        let leaked: f64 = self.events.iter().map(|e| e.leaked).sum();
        (profit + leaked > 0.0).then(|| profit / (profit + leaked))
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut out = BufWriter::new(file);

        writeln!(out, "tx_hash,pool,profit_raw,leaked,efficiency")?;
        for e in &self.events {
            writeln!(out, "{},{},{},{},{}", e.tx_hash, e.pool, e.profit, e.leaked, e.efficiency)?;
        }
        out.flush().with_context(|| format!("Failed to flush {:?}", path))
    }
}

/// Join summary rows with their protocol and market swaps
pub fn build_events(
    summary: &[SummaryRow],
    tx_swaps: &[TxSwapRecord],
    next_swaps: &[WindowSwapRecord],
) -> Result<Vec<EventSwaps>> {
    let protocol_txs: HashSet<&str> = summary.iter().map(|r| r.tx_hash.as_str()).collect();

    let mut protocol: HashMap<(&str, &str), Vec<I256>> = HashMap::new();
    for s in tx_swaps {
        if let Some(a) = s.decoded.as_ref().and_then(|d| d.directional_amount()) {
            protocol.entry((s.tx_hash.as_str(), s.pool.as_str())).or_default().push(a);
        }
    }

    let mut market: HashMap<(&str, &str), Vec<I256>> = HashMap::new();
    for s in next_swaps {
        if protocol_txs.contains(s.swap_tx_hash.as_str()) {
            continue;
        }
        if let Some(a) = s.decoded.as_ref().and_then(|d| d.directional_amount()) {
            market.entry((s.origin_tx_hash.as_str(), s.pool.as_str())).or_default().push(a);
        }
    }

    summary
        .iter()
        .map(|row| {
            let key = (row.tx_hash.as_str(), row.pool.as_str());
            Ok(EventSwaps {
                tx_hash: row.tx_hash.clone(),
                pool: row.pool.clone(),
                profit: row
                    .profit_raw
                    .parse()
                    .with_context(|| format!("Bad profit {:?} for {}", row.profit_raw, row.tx_hash))?,
                protocol: protocol.get(&key).cloned().unwrap_or_default(),
                market: market.get(&key).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// Read the extractor outputs under `dir`
pub fn load_events<P: AsRef<Path>>(dir: P) -> Result<Vec<EventSwaps>> {
    let dir = dir.as_ref();
    let summary = read_summary(dir.join(SUMMARY_FILE))?;
    let tx_swaps: Vec<TxSwapRecord> = read_jsonl(dir.join(TX_SWAPS_FILE))?;
    let next_swaps: Vec<WindowSwapRecord> = read_jsonl(dir.join(NEXT_BLOCKS_SWAPS_FILE))?;
    build_events(&summary, &tx_swaps, &next_swaps)
}
