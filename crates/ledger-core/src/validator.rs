use crate::{block::Block, hash::BlockHash};
use std::fmt;
use thiserror::Error;

/// First integrity violation found in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {index}: {kind}")]
pub struct ChainFault {
    pub index: usize,
    pub kind: FaultKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// The chain holds no blocks at all.
    Empty,
    /// Stored hash differs from the recomputation over the block's content.
    HashMismatch { stored: BlockHash, computed: BlockHash },
    /// `previous_hash` does not name the preceding block.
    BrokenLink { expected: BlockHash, found: BlockHash },
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Empty => f.write_str("chain is empty"),
            FaultKind::HashMismatch { stored, computed } => {
                write!(f, "stored hash {stored} but content hashes to {computed}")
            }
            FaultKind::BrokenLink { expected, found } => {
                write!(f, "links to {found}, previous block is {expected}")
            }
        }
    }
}

/// Checks every block after genesis: the stored hash must match its content
/// and `previous_hash` must equal the hash of the block before it.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainFault> {
    if blocks.is_empty() {
        return Err(ChainFault {
            index: 0,
            kind: FaultKind::Empty,
        });
    }
    for (index, pair) in blocks.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = index + 1;

        let computed = current.calculate_hash();
        if current.hash != computed {
            return Err(ChainFault {
                index,
                kind: FaultKind::HashMismatch {
                    stored: current.hash,
                    computed,
                },
            });
        }
        if current.previous_hash != previous.hash {
            return Err(ChainFault {
                index,
                kind: FaultKind::BrokenLink {
                    expected: previous.hash,
                    found: current.previous_hash,
                },
            });
        }
    }
    Ok(())
}

pub fn is_chain_valid(blocks: &[Block]) -> bool {
    verify_chain(blocks).is_ok()
}
