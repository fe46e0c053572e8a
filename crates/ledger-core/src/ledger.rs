use crate::{
    balance,
    block::{unix_millis, Block, BlockTemplate},
    config::LedgerConfig,
    error::LedgerError,
    pow::{self, CancelToken, Seal},
    store::ChainStore,
    transfer::TransferRecord,
    validator::{self, ChainFault},
};
use anyhow::anyhow;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, info, warn};

/// How a mining round searches for its nonce.
#[derive(Clone, Debug, Default)]
pub struct MiningOptions {
    /// Spread the search over the rayon thread pool.
    pub parallel: bool,
    pub cancel: CancelToken,
}

impl MiningOptions {
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_cancel(CancelToken::with_timeout(timeout))
    }

    pub(crate) fn search(
        &self,
        template: &BlockTemplate,
        difficulty: u32,
    ) -> Result<Seal, LedgerError> {
        let seal = if self.parallel {
            pow::search_nonce_parallel(template, difficulty, &self.cancel)
        } else {
            pow::search_nonce_cancellable(template, difficulty, &self.cancel)
        };
        seal.map_err(|aborted| {
            warn!("mining aborted: {aborted}");
            LedgerError::from(aborted)
        })
    }
}

/// Single-node chain plus the queue of transfers waiting for the next block.
/// The chain always starts with the genesis block and only grows.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pub(crate) pending: Vec<TransferRecord>,
    config: LedgerConfig,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            chain: vec![Self::create_genesis_block()],
            pending: Vec::new(),
            config: LedgerConfig::default(),
        }
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn create_genesis_block() -> Block {
        Block::genesis()
    }

    /// Rebuilds a ledger from already sealed blocks. Integrity is not
    /// checked here; run [`Ledger::verify_chain`] on the result.
    pub fn from_parts(
        chain: Vec<Block>,
        pending: Vec<TransferRecord>,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        if chain.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(Self {
            chain,
            pending,
            config,
        })
    }

    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Queues a transfer for the next block. Nothing is validated here; see
    /// [`Ledger::submit_checked`] for the guarded variant.
    pub fn create_transaction(&mut self, record: TransferRecord) {
        debug!(
            "queued transfer {:?} -> {} ({}), {} pending",
            record.from,
            record.to,
            record.amount,
            self.pending.len() + 1
        );
        self.pending.push(record);
    }

    /// Seals every pending transfer into a new block, appends it, and queues
    /// the reward for `reward_address`. Blocks until the proof-of-work search
    /// succeeds.
    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> &Block {
        let template = self.next_template();
        let mined = self.pending.len();
        let block = Block::mine(template, self.config.difficulty);
        self.append_sealed(block, reward_address, mined)
    }

    /// Like [`Ledger::mine_pending_transactions`], with parallel search and
    /// cancellation. An aborted attempt leaves the ledger untouched.
    pub fn mine_pending_transactions_with(
        &mut self,
        reward_address: &str,
        options: &MiningOptions,
    ) -> Result<&Block, LedgerError> {
        let template = self.next_template();
        let mined = self.pending.len();
        let seal = options.search(&template, self.config.difficulty)?;
        Ok(self.append_sealed(Block::seal(template, seal), reward_address, mined))
    }

    pub(crate) fn next_template(&self) -> BlockTemplate {
        BlockTemplate::new(unix_millis(), self.pending.clone(), self.latest_block().hash)
    }

    /// Appends a sealed block that consumed the first `mined` pending
    /// transfers. Transfers queued after the template was taken stay pending
    /// behind the new reward.
    pub(crate) fn append_sealed(
        &mut self,
        block: Block,
        reward_address: &str,
        mined: usize,
    ) -> &Block {
        info!(
            "Mined block {} with nonce {} and hash {} ({} transfers)",
            self.chain.len(),
            block.nonce,
            block.hash,
            block.transfers.len()
        );
        self.chain.push(block);
        let later = self.pending.split_off(mined.min(self.pending.len()));
        self.pending = Vec::with_capacity(later.len() + 1);
        self.pending
            .push(TransferRecord::reward(reward_address, self.config.mining_reward));
        self.pending.extend(later);
        self.latest_block()
    }

    pub fn get_balance_of_address(&self, address: &str) -> i128 {
        balance::balance_of(&self.chain, address)
    }

    pub fn balances(&self) -> BTreeMap<String, i128> {
        balance::balances(&self.chain)
    }

    pub fn is_chain_valid(&self) -> bool {
        self.verify_chain().is_ok()
    }

    pub fn verify_chain(&self) -> Result<(), ChainFault> {
        validator::verify_chain(&self.chain).inspect_err(|fault| warn!("invalid chain: {fault}"))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending_transactions(&self) -> &[TransferRecord] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.config.mining_reward
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Writes the blocks `store` does not hold yet and replaces its pending
    /// queue.
    pub fn persist<S: ChainStore + ?Sized>(&self, store: &S) -> Result<(), LedgerError> {
        let stored = store.block_count()?;
        let local = self.chain.len() as u64;
        if stored > local {
            return Err(LedgerError::StoreAhead { stored, local });
        }
        if stored > 0 {
            let ours = self.chain[stored as usize - 1].hash;
            if store.tip_hash()? != Some(ours) {
                return Err(LedgerError::StoreDiverged { height: stored - 1 });
            }
        }
        for height in stored..local {
            store.put_block(height, &self.chain[height as usize])?;
        }
        store.put_pending(&self.pending)?;
        debug!("persisted {} new blocks, {} pending", local - stored, self.pending.len());
        Ok(())
    }

    /// Loads a ledger from `store`, or starts a fresh one if it is empty.
    /// A stored chain that fails validation is rejected.
    pub fn restore<S: ChainStore + ?Sized>(
        store: &S,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        let ledger = Self::load(store, config)?;
        ledger.verify_chain()?;
        info!(
            "restored ledger with {} blocks and {} pending transfers",
            ledger.len(),
            ledger.pending.len()
        );
        Ok(ledger)
    }

    /// Like [`Ledger::restore`] without the integrity check, for inspecting a
    /// store that may have been tampered with.
    pub fn load<S: ChainStore + ?Sized>(
        store: &S,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        let count = store.block_count()?;
        if count == 0 {
            return Self::new(config);
        }
        let mut chain = Vec::with_capacity(count as usize);
        for height in 0..count {
            let block = store
                .get_block(height)?
                .ok_or_else(|| anyhow!("block {height} missing from store"))?;
            chain.push(block);
        }
        Self::from_parts(chain, store.get_pending()?, config)
    }
}
