//! Ledger Data Types
//!
//! Typed views of the JSON-RPC objects the extractor consumes: logs,
//! receipts, transaction bodies and block headers. Only the fields the
//! correlation engine reads are modelled; everything else in the node's
//! response is ignored.
//!
//! Created: 2026-02-10
//!
//! Dependencies:
//!     - alloy (Address, B256, TxHash, Bytes)
//!     - chrono (block time formatting)
//!     - serde (RPC response deserialization)

use alloy::primitives::{hex, Address, Bytes, TxHash, B256};
use chrono::DateTime;
use serde::{Deserialize, Deserializer};

/// Block time format used in every output stream (whole seconds, UTC)
pub const BLOCK_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Raw event log as returned inside a receipt or by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, deserialize_with = "quantity::opt")]
    pub log_index: Option<u64>,
    #[serde(default)]
    pub transaction_hash: Option<TxHash>,
    #[serde(default, deserialize_with = "quantity::opt")]
    pub transaction_index: Option<u64>,
    #[serde(default, deserialize_with = "quantity::opt")]
    pub block_number: Option<u64>,
}

impl RawLog {
    /// First topic (event signature), if any
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }

    /// True if the log was emitted by `address` with topic0 in `signatures`
    pub fn matches(&self, address: &Address, signatures: &[B256]) -> bool {
        self.address == *address
            && self.topic0().map_or(false, |t0| signatures.contains(t0))
    }
}

/// Transaction receipt (subset)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(deserialize_with = "quantity::required")]
    pub block_number: u64,
    #[serde(default, deserialize_with = "quantity::or_zero")]
    pub transaction_index: u64,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub logs: Vec<RawLog>,
}

/// Transaction body (subset) from `eth_getTransactionByHash`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default, alias = "data")]
    pub input: Bytes,
}

impl TransactionBody {
    /// Destination address as lowercase hex, empty for contract creation
    pub fn to_hex(&self) -> String {
        self.to.as_ref().map(hex_address).unwrap_or_default()
    }

    /// 4-byte method selector as `0x` + 8 hex chars.
    /// Inputs shorter than a selector are rendered whole.
    pub fn selector_hex(&self) -> String {
        let n = self.input.len().min(4);
        hex::encode_prefixed(&self.input[..n])
    }
}

/// Block header (subset) from `eth_getBlockByNumber(.., false)`
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    #[serde(deserialize_with = "quantity::required")]
    pub number: u64,
    #[serde(deserialize_with = "quantity::required")]
    pub timestamp: u64,
}

/// Cached block metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMetadata {
    pub number: u64,
    pub timestamp: u64,
}

impl BlockMetadata {
    /// ISO-8601 UTC block time, e.g. `2026-02-10T08:15:02Z`
    pub fn time_iso(&self) -> String {
        DateTime::from_timestamp(self.timestamp as i64, 0)
            .map(|dt| dt.format(BLOCK_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl From<BlockHeader> for BlockMetadata {
    fn from(header: BlockHeader) -> Self {
        Self {
            number: header.number,
            timestamp: header.timestamp,
        }
    }
}

/// Lowercase `0x`-prefixed address (alloy's Display is checksummed)
pub fn hex_address(address: &Address) -> String {
    hex::encode_prefixed(address)
}

/// Lowercase `0x`-prefixed 32-byte hash
pub fn hex_b256(value: &B256) -> String {
    hex::encode_prefixed(value)
}

/// Block number as an RPC quantity (`0x`-prefixed, no leading zeros)
pub fn quantity_hex(n: u64) -> String {
    format!("{:#x}", n)
}

/// Lenient quantity parsing: nodes disagree on whether indices are hex
/// strings or JSON integers.
pub mod quantity {
    use super::*;
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(u64),
        Text(String),
    }

    pub fn parse(text: &str) -> Result<u64, String> {
        let text = text.trim();
        match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some("") => Ok(0),
            Some(digits) => u64::from_str_radix(digits, 16).map_err(|e| format!("{}: {}", text, e)),
            None => text.parse::<u64>().map_err(|e| format!("{}: {}", text, e)),
        }
    }

    fn convert(q: Quantity) -> Result<u64, String> {
        match q {
            Quantity::Number(n) => Ok(n),
            Quantity::Text(s) => parse(&s),
        }
    }

    pub fn opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Option::<Quantity>::deserialize(d)? {
            Some(q) => convert(q).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }

    pub fn or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        opt(d).map(|v| v.unwrap_or(0))
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        convert(Quantity::deserialize(d)?).map_err(D::Error::custom)
    }
}

/// `#[serde(with)]` helper: integers as decimal strings (profit, amounts)
pub mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let text = String::deserialize(d)?;
        text.parse::<T>().map_err(D::Error::custom)
    }
}

/// `#[serde(with)]` helper: sequence of decimal strings
pub mod decimal_seq {
    use serde::ser::SerializeSeq;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(values: &[T], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(&v.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<Vec<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|text| text.parse::<T>().map_err(D::Error::custom))
            .collect()
    }
}

/// `#[serde(with)]` helper: lowercase hex address
pub mod hex_addr {
    use super::{hex_address, Address};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex_address(address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        Address::deserialize(d)
    }
}

/// `#[serde(with)]` helper: optional lowercase hex address
pub mod opt_hex_addr {
    use super::{hex_address, Address};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Option<Address>, s: S) -> Result<S::Ok, S::Error> {
        match address {
            Some(a) => s.serialize_some(&hex_address(a)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Address>, D::Error> {
        Option::<Address>::deserialize(d)
    }
}
