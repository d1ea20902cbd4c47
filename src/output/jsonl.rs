//! JSONL Stream Writer
//!
//! One JSON object per line. Streams are opened once per run, either
//! truncated (fresh run) or in append mode (resumed run), and flushed
//! explicitly so partial runs leave whole lines behind.
//!
//! Created: 2026-02-10

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered JSONL writer
pub struct JsonlWriter {
    path: PathBuf,
    out: BufWriter<File>,
    records: u64,
}

impl JsonlWriter {
    /// Open `path` for a fresh run, truncating any existing content
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path.as_ref(), false)
    }

    /// Open `path` in append mode, creating it if missing
    pub fn append_to<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path.as_ref(), true)
    }

    fn open(path: &Path, append: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .with_context(|| format!("Failed to open JSONL file: {:?}", path))?;

        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            records: 0,
        })
    }

    /// Serialize `record` as a single line
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to serialize record to JSON")?;
        writeln!(self.out, "{}", json).with_context(|| format!("Failed to write to {:?}", self.path))?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .with_context(|| format!("Failed to flush {:?}", self.path))
    }

    /// Records written by this writer (not counting pre-existing lines)
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every record of a JSONL file. Blank lines are skipped, any other
/// unparseable line is an error. A missing file reads as empty.
pub fn read_jsonl<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse {:?} line {}", path, n + 1))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::records::ErrorRecord;
    use std::env;
    use std::fs;

    #[test]
    fn test_create_truncates_and_append_keeps() {
        let dir = env::temp_dir().join("backrun_capture_jsonl_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("errors.jsonl");

        let mut w = JsonlWriter::create(&path).unwrap();
        w.write(&ErrorRecord::new("0x01", "receipt_null")).unwrap();
        w.flush().unwrap();
        drop(w);

        let mut w = JsonlWriter::append_to(&path).unwrap();
        w.write(&ErrorRecord::new("0x02", "no_backrun_log")).unwrap();
        w.flush().unwrap();
        assert_eq!(w.records(), 1);
        drop(w);

        let back: Vec<ErrorRecord> = read_jsonl(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].reason, "no_backrun_log");

        let w = JsonlWriter::create(&path).unwrap();
        drop(w);
        let back: Vec<ErrorRecord> = read_jsonl(&path).unwrap();
        assert!(back.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let path = env::temp_dir().join("backrun_capture_no_such_file.jsonl");
        let _ = fs::remove_file(&path);
        let back: Vec<ErrorRecord> = read_jsonl(&path).unwrap();
        assert!(back.is_empty());
    }
}
