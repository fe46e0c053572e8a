use crate::{
    block::Block,
    error::LedgerError,
    ledger::{Ledger, MiningOptions},
    transfer::TransferRecord,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Thread-safe handle to a ledger with a single-mutator discipline.
///
/// Readers never observe a partially sealed block: the nonce search runs
/// without holding the lock and the block is appended under the write lock in
/// one step. If the tip moved while searching, the result is discarded.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    // The ledger is only mutated once a seal is complete, so a poisoned lock
    // still guards a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_transaction(&self, record: TransferRecord) {
        self.write().create_transaction(record);
    }

    pub fn submit_checked(&self, record: TransferRecord) -> Result<(), LedgerError> {
        self.write().submit_checked(record)
    }

    /// Mines the transfers pending at call time. Transfers submitted during
    /// the search stay queued for the following block.
    pub fn mine_pending_transactions(
        &self,
        reward_address: &str,
        options: &MiningOptions,
    ) -> Result<Block, LedgerError> {
        let (template, mined, difficulty) = {
            let ledger = self.read();
            (
                ledger.next_template(),
                ledger.pending.len(),
                ledger.difficulty(),
            )
        };
        let seal = options.search(&template, difficulty)?;
        self.commit(Block::seal(template, seal), reward_address, mined)
    }

    fn commit(
        &self,
        block: Block,
        reward_address: &str,
        mined: usize,
    ) -> Result<Block, LedgerError> {
        let mut ledger = self.write();
        if ledger.latest_block().hash() != block.previous_hash() {
            warn!(
                "discarding block {}: tip moved to {}",
                block.hash(),
                ledger.latest_block().hash()
            );
            return Err(LedgerError::StaleTemplate);
        }
        Ok(ledger.append_sealed(block, reward_address, mined).clone())
    }

    pub fn get_balance_of_address(&self, address: &str) -> i128 {
        self.read().get_balance_of_address(address)
    }

    pub fn is_chain_valid(&self) -> bool {
        self.read().is_chain_valid()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn latest_block(&self) -> Block {
        self.read().latest_block().clone()
    }

    pub fn pending_transactions(&self) -> Vec<TransferRecord> {
        self.read().pending_transactions().to_vec()
    }

    /// Owned copy of the current ledger state.
    pub fn snapshot(&self) -> Ledger {
        self.read().clone()
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}
