use crate::{
    constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, MAX_DIFFICULTY},
    error::LedgerError,
};
use serde::{Deserialize, Serialize};

/// Fixed parameters of a ledger. There is no retargeting; both values stay
/// constant for the ledger's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Required leading hex zeros in a block hash.
    pub difficulty: u32,
    /// Amount credited to the miner of each block, paid in the next one.
    pub mining_reward: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
        }
    }
}

impl LedgerConfig {
    pub fn new(difficulty: u32, mining_reward: u64) -> Self {
        Self {
            difficulty,
            mining_reward,
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidDifficulty {
                difficulty: self.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(())
    }
}
