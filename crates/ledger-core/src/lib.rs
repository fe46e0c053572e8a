//! Single-node proof-of-work ledger: hash-linked blocks of value transfers,
//! chain validation, and balance replay.

pub mod balance;
pub mod block;
pub mod config;
pub mod constants;
pub mod error;
mod guard;
pub mod hash;
pub mod ledger;
pub mod pow;
pub mod shared;
pub mod store;
pub mod transfer;
pub mod validator;

pub use block::{Block, BlockTemplate};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use hash::BlockHash;
pub use ledger::{Ledger, MiningOptions};
pub use pow::{CancelToken, MiningAborted, Seal};
pub use shared::SharedLedger;
pub use store::{ChainStore, MemoryStore};
pub use transfer::TransferRecord;
pub use validator::{ChainFault, FaultKind};
