//! Follow-up Swap Extractor
//!
//! Purpose:
//!     For each origin swap (chosen by topic0) in the input list, record the
//!     swapper and every later swap on the same pool: the rest of the origin
//!     block and the next three blocks, each with its own swapper.
//!
//! Created: 2026-02-12
//!
//! Usage:
//!     cargo run --release --bin extract-swaps -- --rpc https://... \
//!         --topic0 0x121cb44ee54098b1a04743c487e7460d8dd429b27f88b1f4d4767396e1a59f79
//!
//! Notes:
//!     - Input rows: block_time|tx_hash|block_number|expected_count
//!     - Resume-capable: transactions already present in --out are skipped
//!       and new records are appended

use anyhow::{Context, Result};
use backrun_capture::config::{load_dotenv, redact_url, ExtractorSettings};
use backrun_capture::input::load_swap_rows;
use backrun_capture::logging::init_logging;
use backrun_capture::output::{Checkpoint, JsonlWriter};
use backrun_capture::types::hex_b256;
use backrun_capture::{FollowupCorrelator, RpcClient};
use alloy::primitives::B256;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Extract swaps by topic0 with their follow-up swaps
#[derive(Parser)]
#[command(name = "extract-swaps")]
struct Args {
    /// JSON-RPC endpoint
    #[arg(long, env = "RPC_URL")]
    rpc: String,

    /// Swap event topic0
    #[arg(long)]
    topic0: B256,

    /// Input rows (block_time|tx_hash|block_number|expected_count)
    #[arg(long, default_value = "swap_txs.txt")]
    input: PathBuf,

    /// Output JSONL path
    #[arg(long, default_value = "out/swap_followups.jsonl")]
    out: PathBuf,

    /// Optional TOML settings file ([rpc] max_attempts, backoff_base, timeout_secs)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let args = Args::parse();
    let settings = ExtractorSettings::load(args.config.as_deref())?;

    info!("===========================================");
    info!("   Follow-up Swap Extractor");
    info!("===========================================");
    info!("RPC: {}", redact_url(&args.rpc));
    info!("Topic0: {}", hex_b256(&args.topic0));

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }

    let rows = load_swap_rows(&args.input)?;
    info!("Loaded {} transactions", rows.len());

    let mut checkpoint = Checkpoint::load(&args.out, "original_tx")?;
    let mut out = if checkpoint.is_empty() {
        JsonlWriter::create(&args.out)?
    } else {
        info!("Resuming: {} txs already processed", checkpoint.len());
        JsonlWriter::append_to(&args.out)?
    };

    let client = RpcClient::new(
        args.rpc.clone(),
        settings.rpc.retry_policy(),
        settings.rpc.timeout(DEFAULT_TIMEOUT),
    )
    .context("Failed to build RPC client")?;
    let correlator = FollowupCorrelator::new(client, args.topic0);

    let start = Instant::now();
    let stats = correlator.run(&rows, &mut checkpoint, &mut out).await?;
    out.flush()?;

    info!("===========================================");
    info!("   Extraction Complete");
    info!("===========================================");
    info!("Output:          {:?}", args.out);
    info!("Swap records:    {}", stats.records);
    info!("Rows processed:  {}", stats.processed);
    info!("Rows skipped:    {}", stats.skipped);
    info!("Errors:          {}", stats.errors);
    info!("Duration:        {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
