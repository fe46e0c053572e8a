use crate::constants::{HASH_HEX_SIZE, HASH_SIZE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A SHA-256 block digest, shown as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockHash([u8; HASH_SIZE]);

#[derive(Debug, Error, PartialEq)]
pub enum BlockHashParseError {
    #[error("expected 64 hex characters, got {0}")]
    Length(usize),
    #[error("invalid hex digest: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl BlockHash {
    /// Previous-hash sentinel carried by the genesis block.
    pub const ZERO: BlockHash = BlockHash([0u8; HASH_SIZE]);

    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Number of leading `'0'` characters in the hex rendering.
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut total = 0u32;
        for b in &self.0 {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    /// True when the first `difficulty` hex characters are all `'0'`.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_nibbles() >= difficulty
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl FromStr for BlockHash {
    type Err = BlockHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_HEX_SIZE {
            return Err(BlockHashParseError::Length(s.len()));
        }
        let mut out = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
