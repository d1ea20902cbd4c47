//! Correlation Engine
//!
//! Purpose:
//!     Tie an origin event to the swaps on its pool found in three windows
//!     (same transaction, later in the same block, next three blocks).
//!
//! Created: 2026-02-10
//!
//! Architecture:
//!     window.rs   - window queries shared by both flows
//!     backrun.rs  - backrun flow: receipt → backrun events → windows → sink
//!     followup.rs - follow-up flow for one swap topic0, resumable
//!
//! Only the query client retries. Failures here are recorded per
//! transaction by the drivers and the batch continues.

pub mod backrun;
pub mod followup;
pub mod window;

pub use backrun::{BackrunCorrelator, RunStats, TxOutcome};
pub use followup::{FollowupCorrelator, FollowupStats};
pub use window::{Origin, NEXT_BLOCK_OFFSETS};
