//! Backrun Extractor
//!
//! Purpose:
//!     For every transaction hash in the input list, find the protocol's
//!     backrun events and the swaps on the same pool in the same
//!     transaction, later in the same block and in the next three blocks.
//!
//! Created: 2026-02-10
//!
//! Dependencies:
//!     - reqwest (JSON-RPC over HTTP, via RpcClient)
//!     - tokio (async runtime)
//!     - clap (CLI args)
//!     - anyhow (error handling)
//!     - tracing (logging)
//!
//! Usage:
//!     cargo run --release --bin extract-backruns -- --input tx_hashes.txt --out-dir out
//!     RPC_URL=https://... cargo run --release --bin extract-backruns
//!
//! Notes:
//!     - All six output files are truncated at start
//!     - Per-transaction failures go to errors.jsonl; the batch never aborts
//!       for one transaction

use anyhow::{Context, Result};
use backrun_capture::config::{load_dotenv, redact_url, ExtractorSettings};
use backrun_capture::events::{BACKRUN_TOPIC0, TARGET_CONTRACT, V3_SWAP_TOPIC0};
use backrun_capture::input::load_tx_hashes;
use backrun_capture::logging::init_logging;
use backrun_capture::types::{hex_address, hex_b256};
use backrun_capture::{BackrunCorrelator, OutputSink, RpcClient};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extract backrun events and correlated pool swaps
#[derive(Parser)]
#[command(name = "extract-backruns")]
struct Args {
    /// JSON-RPC endpoint
    #[arg(long, env = "RPC_URL")]
    rpc_url: String,

    /// File with one transaction hash per line
    #[arg(long, default_value = "tx_hashes.txt")]
    input: PathBuf,

    /// Output directory
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

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
    info!("   Backrun Capture Extractor");
    info!("===========================================");
    info!("RPC: {}", redact_url(&args.rpc_url));
    info!("Target contract: {}", hex_address(&TARGET_CONTRACT));
    info!("Backrun topic0: {}", hex_b256(&BACKRUN_TOPIC0));
    info!("V3 Swap topic0: {}", hex_b256(&V3_SWAP_TOPIC0));

    let tx_hashes = load_tx_hashes(&args.input)?;
    info!("Loaded {} transaction hashes from {:?}", tx_hashes.len(), args.input);

    let policy = settings.rpc.retry_policy();
    let client = RpcClient::new(args.rpc_url.clone(), policy, settings.rpc.timeout(DEFAULT_TIMEOUT))
        .context("Failed to build RPC client")?;
    info!(
        "Retry: {} attempts, backoff base {}s",
        policy.max_attempts, policy.backoff_base
    );

    let mut sink = OutputSink::create(&args.out_dir)?;
    let mut correlator = BackrunCorrelator::new(client);

    let start = Instant::now();
    let stats = correlator.run(&tx_hashes, &mut sink).await?;
    sink.finish()?;

    info!("===========================================");
    info!("   Extraction Complete");
    info!("===========================================");
    info!("Transactions processed: {}", stats.processed);
    info!("Backruns found:         {}", stats.backruns);
    info!("Errors:                 {}", stats.errors);
    info!("Blocks cached:          {}", correlator.block_cache().len());
    info!("RPC requests:           {}", correlator.reader().requests_sent());
    info!("Duration:               {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
