//! Capture Efficiency Report
//!
//! Purpose:
//!     Read the extract-backruns outputs and report how much rebalancing
//!     value the protocol captured versus leaked to next-block market swaps.
//!     Writes capture_efficiency.csv next to the inputs.
//!
//! Created: 2026-02-14
//!
//! Usage:
//!     cargo run --release --bin capture-report -- --out-dir out

use anyhow::Result;
use backrun_capture::efficiency::{load_events, EFFICIENCY_FILE};
use backrun_capture::logging::init_logging;
use backrun_capture::{CaptureReport, DirectionalVolumePolicy};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Compute per-event capture efficiency
#[derive(Parser)]
#[command(name = "capture-report")]
struct Args {
    /// Directory holding summary.csv and the swap JSONL files
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,
}

fn pct(v: Option<f64>) -> String {
    v.map(|x| format!("{:.1}%", x * 100.0)).unwrap_or_else(|| "n/a".to_string())
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let events = load_events(&args.out_dir)?;
    let report = CaptureReport::compute(&events, &DirectionalVolumePolicy);

    let path = args.out_dir.join(EFFICIENCY_FILE);
    report.write_csv(&path)?;

    info!("Events: {}  |  100%-eff: {}", report.count(), report.full_capture_count());
    info!("Median eff: {}  |  Weighted eff: {}", pct(report.median()), pct(report.weighted()));
    info!("Per-event results written to {:?}", path);

    Ok(())
}
