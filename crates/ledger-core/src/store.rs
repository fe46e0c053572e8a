use crate::{block::Block, hash::BlockHash, transfer::TransferRecord};
use anyhow::{anyhow, Result};
use std::sync::Mutex;

/// Trait the storage backends implement so a ledger can be persisted and
/// restored. Lives in `ledger-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    fn put_block(&self, height: u64, block: &Block) -> Result<()>;
    fn get_block(&self, height: u64) -> Result<Option<Block>>;
    /// Number of stored blocks; heights run from 0 to `block_count() - 1`.
    fn block_count(&self) -> Result<u64>;
    fn tip_hash(&self) -> Result<Option<BlockHash>>;
    /// Replaces the stored pending queue.
    fn put_pending(&self, pending: &[TransferRecord]) -> Result<()>;
    fn get_pending(&self) -> Result<Vec<TransferRecord>>;
    fn close(&self) -> Result<()>;
}

/// Volatile store, handy for tests and for embedders that snapshot elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    blocks: Vec<Block>,
    pending: Vec<TransferRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut MemoryInner) -> Result<T>) -> Result<T> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        f(&mut inner)
    }
}

impl ChainStore for MemoryStore {
    fn put_block(&self, height: u64, block: &Block) -> Result<()> {
        self.with(|inner| {
            let height = height as usize;
            if height < inner.blocks.len() {
                inner.blocks[height] = block.clone();
            } else if height == inner.blocks.len() {
                inner.blocks.push(block.clone());
            } else {
                return Err(anyhow!(
                    "height {height} leaves a gap after {} blocks",
                    inner.blocks.len()
                ));
            }
            Ok(())
        })
    }

    fn get_block(&self, height: u64) -> Result<Option<Block>> {
        self.with(|inner| Ok(inner.blocks.get(height as usize).cloned()))
    }

    fn block_count(&self) -> Result<u64> {
        self.with(|inner| Ok(inner.blocks.len() as u64))
    }

    fn tip_hash(&self) -> Result<Option<BlockHash>> {
        self.with(|inner| Ok(inner.blocks.last().map(|b| b.hash)))
    }

    fn put_pending(&self, pending: &[TransferRecord]) -> Result<()> {
        self.with(|inner| {
            inner.pending = pending.to_vec();
            Ok(())
        })
    }

    fn get_pending(&self) -> Result<Vec<TransferRecord>> {
        self.with(|inner| Ok(inner.pending.clone()))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
