//! Backrun Capture Extractor Library
//!
//! Extracts a protocol's backrun events from transaction receipts and
//! correlates them with swaps on the same pool in the same transaction,
//! later in the same block and in the next three blocks. The outputs feed
//! a capture-efficiency report.
//!
//! Created: 2026-02-10
//!
//! Layers, leaves first:
//!     types / rpc      - JSON-RPC client with retry, typed ledger objects
//!     events           - backrun and swap log decoders
//!     block_cache      - per-run block metadata memo
//!     correlate        - window engine, backrun flow, follow-up flow
//!     output           - JSONL / CSV writers and resume checkpoint
//!     efficiency       - capture-efficiency report over the outputs

pub mod block_cache;
pub mod config;
pub mod correlate;
pub mod efficiency;
pub mod events;
pub mod input;
pub mod logging;
pub mod output;
pub mod rpc;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use block_cache::BlockCache;
pub use config::{load_dotenv, ExtractorSettings};
pub use correlate::{BackrunCorrelator, FollowupCorrelator, RunStats, TxOutcome};
pub use efficiency::{capture_efficiency, CaptureReport, DirectionalVolumePolicy, LeakagePolicy};
pub use events::{decode_backrun, decode_swap, DecodedSwap};
pub use output::{BackrunSink, OutputSink};
pub use rpc::{ChainReader, RetryPolicy, RpcClient, RpcError};
