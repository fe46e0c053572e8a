use crate::{
    block::{hash_with_nonce, BlockTemplate},
    constants::CANCEL_POLL_INTERVAL,
    hash::BlockHash,
};
use rayon::prelude::*;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::debug;

/// The winning nonce and the hash it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seal {
    pub nonce: u64,
    pub hash: BlockHash,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MiningAborted {
    #[error("mining was cancelled")]
    Cancelled,
    #[error("mining timed out")]
    TimedOut,
    #[error("nonce space exhausted")]
    Exhausted,
}

/// Shared stop signal for a nonce search, with an optional deadline.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    pub fn check(&self) -> Result<(), MiningAborted> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(MiningAborted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(MiningAborted::TimedOut),
            _ => Ok(()),
        }
    }
}

/// Searches nonces from 0 upwards until the hash has `difficulty` leading hex
/// zeros. There is no iteration bound; a difficulty above 64 never returns.
pub fn search_nonce(template: &BlockTemplate, difficulty: u32) -> Seal {
    let prefix = template.hasher();
    let mut nonce = 0u64;
    loop {
        let hash = hash_with_nonce(&prefix, nonce);
        if hash.meets_difficulty(difficulty) {
            return Seal { nonce, hash };
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Sequential search that stops once `cancel` fires.
pub fn search_nonce_cancellable(
    template: &BlockTemplate,
    difficulty: u32,
    cancel: &CancelToken,
) -> Result<Seal, MiningAborted> {
    let prefix = template.hasher();
    for nonce in 0..=u64::MAX {
        if nonce % CANCEL_POLL_INTERVAL == 0 {
            cancel.check()?;
        }
        let hash = hash_with_nonce(&prefix, nonce);
        if hash.meets_difficulty(difficulty) {
            return Ok(Seal { nonce, hash });
        }
    }
    Err(MiningAborted::Exhausted)
}

/// Searches the nonce space on the rayon pool. The first worker to find a
/// qualifying hash stops the others; the returned nonce is not necessarily
/// the smallest one.
pub fn search_nonce_parallel(
    template: &BlockTemplate,
    difficulty: u32,
    cancel: &CancelToken,
) -> Result<Seal, MiningAborted> {
    let prefix = template.hasher();
    let found = (0u64..u64::MAX).into_par_iter().find_map_any(|nonce| {
        if nonce % CANCEL_POLL_INTERVAL == 0 {
            if let Err(aborted) = cancel.check() {
                return Some(Err(aborted));
            }
        }
        let hash = hash_with_nonce(&prefix, nonce);
        hash.meets_difficulty(difficulty)
            .then_some(Ok(Seal { nonce, hash }))
    });
    let seal = found.unwrap_or(Err(MiningAborted::Exhausted))?;
    debug!("parallel search found nonce {} (difficulty {})", seal.nonce, difficulty);
    Ok(seal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferRecord;

    fn template() -> BlockTemplate {
        BlockTemplate::new(
            1_700_000_000_000,
            vec![TransferRecord::new("address1", "address2", 10)],
            BlockHash::ZERO,
        )
    }

    #[test]
    fn sequential_seal_is_reproducible() {
        let seal = search_nonce(&template(), 2);
        assert!(seal.hash.to_hex().starts_with("00"));
        assert_eq!(hash_with_nonce(&template().hasher(), seal.nonce), seal.hash);
        assert_eq!(search_nonce(&template(), 2), seal);
    }

    #[test]
    fn sequential_search_returns_first_qualifying_nonce() {
        let seal = search_nonce(&template(), 1);
        let prefix = template().hasher();
        for nonce in 0..seal.nonce {
            assert!(!hash_with_nonce(&prefix, nonce).meets_difficulty(1));
        }
    }

    #[test]
    fn cancellable_search_matches_plain_search() {
        let token = CancelToken::new();
        let seal = search_nonce_cancellable(&template(), 2, &token).unwrap();
        assert_eq!(seal, search_nonce(&template(), 2));
    }

    #[test]
    fn parallel_search_satisfies_difficulty() {
        let seal = search_nonce_parallel(&template(), 3, &CancelToken::new()).unwrap();
        assert!(seal.hash.meets_difficulty(3));
        assert_eq!(hash_with_nonce(&template().hasher(), seal.nonce), seal.hash);
    }

    #[test]
    fn cancelled_token_stops_search() {
        let token = CancelToken::new();
        token.cancel();
        // 64 leading zero nibbles is never reached
        assert_eq!(
            search_nonce_cancellable(&template(), 64, &token),
            Err(MiningAborted::Cancelled)
        );
        assert_eq!(
            search_nonce_parallel(&template(), 64, &token),
            Err(MiningAborted::Cancelled)
        );
    }

    #[test]
    fn expired_deadline_times_out() {
        let token = CancelToken::with_timeout(Duration::from_millis(20));
        assert_eq!(
            search_nonce_parallel(&template(), 64, &token),
            Err(MiningAborted::TimedOut)
        );
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }
}
