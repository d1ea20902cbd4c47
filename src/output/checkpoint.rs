//! Resume checkpoint
//!
//! The alternate-flow output doubles as its own checkpoint: every line
//! carries the origin transaction hash, so the set of hashes already in the
//! file is the set of work units to skip on restart.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Default, Clone)]
pub struct Checkpoint {
    done: HashSet<String>,
}

impl Checkpoint {
    /// Collect `key` from every line of `path`. A missing file yields an
    /// empty checkpoint; lines that are not JSON objects with a string
    /// `key` are skipped.
    pub fn load<P: AsRef<Path>>(path: P, key: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut done = HashSet::new();
        if !path.exists() {
            return Ok(Self { done });
        }

        let file = File::open(path).with_context(|| format!("Failed to open checkpoint {:?}", path))?;
        let mut skipped = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line)
                .ok()
                .and_then(|v| v.get(key).and_then(Value::as_str).map(str::to_lowercase))
            {
                Some(k) => {
                    done.insert(k);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Checkpoint {:?}: skipped {} malformed lines", path, skipped);
        }
        Ok(Self { done })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.done.contains(&key.to_lowercase())
    }

    pub fn insert(&mut self, key: &str) {
        self.done.insert(key.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_load_skips_malformed_lines() {
        let path = env::temp_dir().join("backrun_capture_checkpoint_test.jsonl");
        fs::write(
            &path,
            "{\"original_tx\":\"0xAB\",\"n\":1}\nnot json\n\n{\"other\":1}\n{\"original_tx\":\"0xcd\"}\n{\"original_tx\":\"0xab\"}\n",
        )
        .unwrap();

        let cp = Checkpoint::load(&path, "original_tx").unwrap();
        assert_eq!(cp.len(), 2);
        assert!(cp.contains("0xab"));
        assert!(cp.contains("0xCD"));
        assert!(!cp.contains("0xef"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let path = env::temp_dir().join("backrun_capture_checkpoint_missing.jsonl");
        let _ = fs::remove_file(&path);
        let cp = Checkpoint::load(&path, "original_tx").unwrap();
        assert!(cp.is_empty());
    }
}
