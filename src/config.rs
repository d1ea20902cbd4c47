//! Extractor settings
//!
//! The RPC endpoint comes from the command line or `RPC_URL` (a `.env` in
//! the working directory is honoured). Retry and timeout tuning lives in an
//! optional TOML file:
//!
//! ```toml
//! [rpc]
//! max_attempts = 5
//! backoff_base = 1.5
//! timeout_secs = 30
//! ```
//!
//! Created: 2026-02-10

use crate::rpc::client::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS};
use crate::rpc::RetryPolicy;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorSettings {
    #[serde(default)]
    pub rpc: RpcSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
    /// Per-request timeout; each binary has its own default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_backoff_base() -> f64 { DEFAULT_BACKOFF_BASE }

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base: default_backoff_base(),
            timeout_secs: None,
        }
    }
}

impl RpcSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff_base)
    }

    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(default)
    }
}

impl ExtractorSettings {
    /// Defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML configuration: {}", path.display()))?;

        if !(settings.rpc.backoff_base.is_finite() && settings.rpc.backoff_base >= 0.0) {
            bail!("rpc.backoff_base must be a non-negative number, got {}", settings.rpc.backoff_base);
        }
        Ok(settings)
    }
}

/// Load `.env` if present. Missing files are not an error.
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

/// Endpoint for display: scheme and host only, credentials and paths
/// (often API keys) are cut.
pub fn redact_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let host = rest.split(['/', '?']).next().unwrap_or_default();
    let host = host.rsplit('@').next().unwrap_or(host);
    if scheme.is_empty() {
        host.to_string()
    } else {
        format!("{}://{}", scheme, host)
    }
}
