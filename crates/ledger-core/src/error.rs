use crate::{pow::MiningAborted, validator::ChainFault};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("difficulty {difficulty} exceeds the maximum of {max}")]
    InvalidDifficulty { difficulty: u32, max: u32 },
    #[error("a ledger needs at least the genesis block")]
    EmptyChain,
    #[error("transfer amount must be greater than zero")]
    InvalidAmount,
    #[error("only mining may create a transfer without a sender")]
    MissingSender,
    #[error("address must not be empty")]
    EmptyAddress,
    #[error("an identical transfer is already pending")]
    DuplicateTransfer,
    #[error("{address} has {available} available, cannot send {requested}")]
    InsufficientBalance {
        address: String,
        available: i128,
        requested: u64,
    },
    #[error(transparent)]
    Mining(#[from] MiningAborted),
    #[error("chain tip moved while mining; block discarded")]
    StaleTemplate,
    #[error("chain failed validation: {0}")]
    ChainInvalid(#[from] ChainFault),
    #[error("store holds {stored} blocks but the ledger only {local}")]
    StoreAhead { stored: u64, local: u64 },
    #[error("store tip at height {height} differs from the ledger")]
    StoreDiverged { height: u64 },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
