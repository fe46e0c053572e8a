use anyhow::{anyhow, Context, Result};
use ledger_core::{Block, BlockHash, ChainStore, TransferRecord};
use sled::{Db, IVec};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";
const TREE_PENDING: &str = "pending";
const KEY_PENDING: &[u8] = b"queue";
const KEY_BLOCK_COUNT: &[u8] = b"block_count";
const KEY_TIP_HASH: &[u8] = b"tip_hash";

/// Ledger persistence on sled. Blocks are keyed by big-endian height so the
/// tree iterates in chain order.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: sled::Tree,
  pending: sled::Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("opening sled store at {}", path.display()))?;
    let blocks = db.open_tree(TREE_BLOCKS)?;
    let pending = db.open_tree(TREE_PENDING)?;
    info!("sled store opened at {}", path.display());
    Ok(Self { db, blocks, pending })
  }

  /// Removes every block, the pending queue, and the tip metadata.
  pub fn clear(&self) -> Result<()> {
    self.blocks.clear()?;
    self.pending.clear()?;
    self.db.remove(KEY_BLOCK_COUNT)?;
    self.db.remove(KEY_TIP_HASH)?;
    self.db.flush()?;
    Ok(())
  }
}

fn decode_u64(v: &IVec) -> Result<u64> {
  let arr = <[u8; 8]>::try_from(&v[..])
    .map_err(|_| anyhow!("expected 8 bytes, found {}", v.len()))?;
  Ok(u64::from_be_bytes(arr))
}

impl ChainStore for SledStore {
  fn put_block(&self, height: u64, block: &Block) -> Result<()> {
    let count = self.block_count()?;
    if height > count {
      return Err(anyhow!("height {height} leaves a gap after {count} blocks"));
    }
    let bytes = bincode::serialize(block)?;
    self.blocks.insert(height.to_be_bytes(), bytes)?;

    // update tip
    if height + 1 >= count {
      self.db.insert(KEY_BLOCK_COUNT, &(height + 1).to_be_bytes()[..])?;
      self.db.insert(KEY_TIP_HASH, &block.hash().as_bytes()[..])?;
    }

    self.db.flush()?;
    debug!("stored block {} ({})", height, block.hash());
    Ok(())
  }

  fn get_block(&self, height: u64) -> Result<Option<Block>> {
    self
      .blocks
      .get(height.to_be_bytes())?
      .map(|ivec| {
        bincode::deserialize(&ivec).with_context(|| format!("decoding block {height}"))
      })
      .transpose()
  }

  fn block_count(&self) -> Result<u64> {
    self
      .db
      .get(KEY_BLOCK_COUNT)?
      .map(|v| decode_u64(&v))
      .transpose()
      .map(Option::unwrap_or_default)
  }

  fn tip_hash(&self) -> Result<Option<BlockHash>> {
    self
      .db
      .get(KEY_TIP_HASH)?
      .map(|v| -> Result<BlockHash> {
        let arr = <[u8; 32]>::try_from(&v[..])
          .map_err(|_| anyhow!("tip hash has {} bytes", v.len()))?;
        Ok(BlockHash::from_bytes(arr))
      })
      .transpose()
  }

  fn put_pending(&self, pending: &[TransferRecord]) -> Result<()> {
    let bytes = bincode::serialize(pending)?;
    self.pending.insert(KEY_PENDING, bytes)?;
    self.db.flush()?;
    Ok(())
  }

  fn get_pending(&self) -> Result<Vec<TransferRecord>> {
    match self.pending.get(KEY_PENDING)? {
      Some(ivec) => bincode::deserialize(&ivec).context("decoding pending queue"),
      None => Ok(Vec::new()),
    }
  }

  fn close(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}
