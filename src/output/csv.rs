//! Summary CSV
//!
//! One row per decoded backrun event in summary.csv. Written with a fixed
//! header, read back by the capture report.
//!
//! Created: 2026-02-10

use super::records::SummaryRow;
use anyhow::{bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct SummaryCsvWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: u64,
}

impl SummaryCsvWriter {
    /// CSV headers matching `SummaryRow::fields`
    pub const HEADERS: &'static [&'static str] = &[
        "tx_hash",
        "block_number",
        "pool",
        "profit_raw",
        "profit_token",
        "tx_to",
        "tx_input_selector",
        "n_swaps_in_tx",
        "n_swaps_same_block_after",
        "n_swaps_next_3_blocks",
    ];

    /// Truncate `path` and write the header line
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open summary CSV: {:?}", path))?;

        let mut out = BufWriter::new(file);
        writeln!(out, "{}", Self::HEADERS.join(","))?;

        Ok(Self { path, out, rows: 0 })
    }

    pub fn write(&mut self, row: &SummaryRow) -> Result<()> {
        let line = row
            .fields()
            .iter()
            .map(|f| escape_csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.out, "{}", line).with_context(|| format!("Failed to write to {:?}", self.path))?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .with_context(|| format!("Failed to flush {:?}", self.path))
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }
}

/// Load summary.csv. The header must match `SummaryCsvWriter::HEADERS`.
pub fn read_summary<P: AsRef<Path>>(path: P) -> Result<Vec<SummaryRow>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let mut lines = content.lines();

    let header = lines.next().unwrap_or_default();
    if split_csv_line(header) != SummaryCsvWriter::HEADERS {
        bail!("Unexpected summary header in {:?}: {}", path, header);
    }

    let mut rows = Vec::new();
    for (n, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let f = split_csv_line(line);
        if f.len() != SummaryCsvWriter::HEADERS.len() {
            bail!("{:?} row {}: expected {} fields, got {}", path, n + 2, SummaryCsvWriter::HEADERS.len(), f.len());
        }
        let count = |i: usize| -> Result<usize> {
            f[i].parse()
                .with_context(|| format!("{:?} row {}: bad count {:?}", path, n + 2, f[i]))
        };
        rows.push(SummaryRow {
            tx_hash: f[0].clone(),
            block_number: f[1]
                .parse()
                .with_context(|| format!("{:?} row {}: bad block number {:?}", path, n + 2, f[1]))?,
            pool: f[2].clone(),
            profit_raw: f[3].clone(),
            profit_token: f[4].clone(),
            tx_to: f[5].clone(),
            tx_input_selector: f[6].clone(),
            n_swaps_in_tx: count(7)?,
            n_swaps_same_block_after: count(8)?,
            n_swaps_next_3_blocks: count(9)?,
        });
    }

    Ok(rows)
}

/// Escape a CSV field that may contain special characters
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Inverse of `escape_csv_field` for a single line
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    fields.push(cur);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn row() -> SummaryRow {
        SummaryRow {
            tx_hash: "0xaa".to_string(),
            block_number: 19_000_000,
            pool: "0xpool".to_string(),
            profit_raw: "1000".to_string(),
            profit_token: "0xtoken".to_string(),
            tx_to: "".to_string(),
            tx_input_selector: "0x".to_string(),
            n_swaps_in_tx: 2,
            n_swaps_same_block_after: 0,
            n_swaps_next_3_blocks: 1,
        }
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(escape_csv_field("simple"), "simple");
        assert_eq!(escape_csv_field("has,comma"), "\"has,comma\"");
        assert_eq!(escape_csv_field("has\"quote"), "\"has\"\"quote\"");
        assert_eq!(split_csv_line("a,\"b,c\",\"d\"\"e\","), vec!["a", "b,c", "d\"e", ""]);
    }

    #[test]
    fn test_summary_written_and_read_back() {
        let dir = env::temp_dir().join("backrun_capture_csv_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("summary.csv");

        let mut w = SummaryCsvWriter::create(&path).unwrap();
        w.write(&row()).unwrap();
        w.flush().unwrap();
        assert_eq!(w.rows(), 1);
        drop(w);

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "tx_hash,block_number,pool,profit_raw,profit_token,tx_to,tx_input_selector,n_swaps_in_tx,n_swaps_same_block_after,n_swaps_next_3_blocks"
        );
        assert_eq!(lines.next().unwrap(), "0xaa,19000000,0xpool,1000,0xtoken,,0x,2,0,1");

        let back = read_summary(&path).unwrap();
        assert_eq!(back, vec![row()]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_rejects_wrong_header() {
        let dir = env::temp_dir().join("backrun_capture_csv_bad_header");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("summary.csv");
        fs::write(&path, "a,b,c\n1,2,3\n").unwrap();

        assert!(read_summary(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
