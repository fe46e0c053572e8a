use crate::{
    constants::GENESIS_TIMESTAMP_MS,
    hash::BlockHash,
    pow::{self, Seal},
    transfer::{canonical_bytes, TransferRecord},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, or 0 if the clock reads before it.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Everything a block commits to except its nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub timestamp: u64,
    pub transfers: Vec<TransferRecord>,
    pub previous_hash: BlockHash,
}

impl BlockTemplate {
    pub fn new(timestamp: u64, transfers: Vec<TransferRecord>, previous_hash: BlockHash) -> Self {
        Self {
            timestamp,
            transfers,
            previous_hash,
        }
    }

    /// Hasher state after absorbing `previous_hash || timestamp || transfers`.
    /// Cloning it and feeding a nonce yields the block hash for that nonce.
    pub fn hasher(&self) -> Sha256 {
        prefix_hasher(self.timestamp, &self.transfers, &self.previous_hash)
    }
}

fn prefix_hasher(
    timestamp: u64,
    transfers: &[TransferRecord],
    previous_hash: &BlockHash,
) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.to_hex().as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(canonical_bytes(transfers));
    hasher
}

/// Finishes a prefix hasher with the decimal rendering of `nonce`.
pub fn hash_with_nonce(prefix: &Sha256, nonce: u64) -> BlockHash {
    let digest = prefix
        .clone()
        .chain_update(nonce.to_string().as_bytes())
        .finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    BlockHash::from_bytes(out)
}

/// A sealed block. Its fields cannot be changed from outside this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) timestamp: u64,
    pub(crate) transfers: Vec<TransferRecord>,
    pub(crate) previous_hash: BlockHash,
    pub(crate) nonce: u64,
    pub(crate) hash: BlockHash,
}

impl Block {
    /// The fixed first block: zero previous hash, no transfers, never mined.
    pub fn genesis() -> Self {
        let template = BlockTemplate::new(GENESIS_TIMESTAMP_MS, Vec::new(), BlockHash::ZERO);
        let hash = hash_with_nonce(&template.hasher(), 0);
        Self::seal(template, Seal { nonce: 0, hash })
    }

    /// Builds the block from a template and the result of a nonce search.
    pub fn seal(template: BlockTemplate, seal: Seal) -> Self {
        Self {
            timestamp: template.timestamp,
            transfers: template.transfers,
            previous_hash: template.previous_hash,
            nonce: seal.nonce,
            hash: seal.hash,
        }
    }

    /// Runs the proof-of-work search on `template` and seals the result.
    /// Blocks the calling thread until a qualifying nonce is found.
    pub fn mine(template: BlockTemplate, difficulty: u32) -> Self {
        let seal = pow::search_nonce(&template, difficulty);
        Self::seal(template, seal)
    }

    /// Recomputes the hash from the current field values.
    pub fn calculate_hash(&self) -> BlockHash {
        let prefix = prefix_hasher(self.timestamp, &self.transfers, &self.previous_hash);
        hash_with_nonce(&prefix, self.nonce)
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    pub fn previous_hash(&self) -> &BlockHash {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }
}
