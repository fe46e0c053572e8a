#![allow(dead_code)]

use std::fs;

use ledger_core::{Ledger, LedgerConfig, TransferRecord};
use ledger_storage::SledStore;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, SledStore) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// Ledger at difficulty 1 with `rounds` mined blocks of random transfers.
pub fn mined_ledger(rounds: usize, seed: u64) -> Ledger {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ledger = Ledger::new(LedgerConfig::new(1, 100)).expect("valid config");
    for round in 0..rounds {
        for _ in 0..rng.gen_range(0..5) {
            ledger.create_transaction(TransferRecord::new(
                format!("user-{}", rng.gen_range(0..4)),
                format!("user-{}", rng.gen_range(0..4)),
                rng.gen_range(1..50),
            ));
        }
        ledger.mine_pending_transactions(&format!("miner-{}", round % 2));
    }
    ledger
}
