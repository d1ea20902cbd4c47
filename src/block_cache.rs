//! Block Metadata Cache
//!
//! Run-lifetime memo of block number → (number, timestamp). The same block
//! is typically referenced by several backrun events (origin block, and the
//! next-block window of neighbouring transactions), so each header is
//! fetched at most once per run. "Block not found" answers are cached too.
//! Entries are never invalidated: the extractor is a single-pass batch job.
//!
//! Created: 2026-02-10

use crate::rpc::{ChainReader, RpcError};
use crate::types::BlockMetadata;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Default)]
pub struct BlockCache {
    entries: HashMap<u64, Option<BlockMetadata>>,
    hits: u64,
    misses: u64,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata for `number`, fetching it on first use.
    /// Only successful answers are cached; RPC failures propagate.
    pub async fn resolve<R>(&mut self, reader: &R, number: u64) -> Result<Option<BlockMetadata>, RpcError>
    where
        R: ChainReader + ?Sized,
    {
        if let Some(entry) = self.entries.get(&number) {
            self.hits += 1;
            return Ok(*entry);
        }

        self.misses += 1;
        let meta = reader.block_header(number).await?.map(BlockMetadata::from);
        if meta.is_none() {
            warn!("Block {} not found, block time left empty", number);
        }
        self.entries.insert(number, meta);
        Ok(meta)
    }

    /// Formatted block time, empty when the block is unknown
    pub async fn block_time<R>(&mut self, reader: &R, number: u64) -> Result<String, RpcError>
    where
        R: ChainReader + ?Sized,
    {
        Ok(self
            .resolve(reader, number)
            .await?
            .map(|m| m.time_iso())
            .unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;

    #[tokio::test]
    async fn test_fetches_each_block_once() {
        let chain = MockChain::new().with_block(100, 1_700_000_000);
        let mut cache = BlockCache::new();

        let first = cache.resolve(&chain, 100).await.unwrap();
        let second = cache.resolve(&chain, 100).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.unwrap().timestamp, 1_700_000_000);
        assert_eq!(chain.calls_to("eth_getBlockByNumber"), 1);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[tokio::test]
    async fn test_missing_block_is_cached_and_formats_empty() {
        let chain = MockChain::new();
        let mut cache = BlockCache::new();

        assert_eq!(cache.block_time(&chain, 7).await.unwrap(), "");
        assert_eq!(cache.block_time(&chain, 7).await.unwrap(), "");
        assert_eq!(chain.calls_to("eth_getBlockByNumber"), 1);
        assert_eq!(cache.len(), 1);
    }
}
