use ledger_core::{
    pow, Block, BlockHash, BlockTemplate, Ledger, LedgerConfig, TransferRecord,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn ledger(difficulty: u32) -> Ledger {
    Ledger::new(LedgerConfig::new(difficulty, 100)).unwrap()
}

/// Applies `edit` to the JSON form of the chain and rebuilds the ledger,
/// leaving every stored hash and nonce as it was.
fn tamper(ledger: &Ledger, edit: impl FnOnce(&mut serde_json::Value)) -> Ledger {
    let mut value = serde_json::to_value(ledger.blocks()).unwrap();
    edit(&mut value);
    let blocks: Vec<Block> = serde_json::from_value(value).unwrap();
    Ledger::from_parts(
        blocks,
        ledger.pending_transactions().to_vec(),
        *ledger.config(),
    )
    .unwrap()
}

#[test]
fn mined_hash_meets_difficulty_and_matches_content() {
    let mut ledger = ledger(3);
    ledger.create_transaction(TransferRecord::new("address1", "address2", 10));
    let block = ledger.mine_pending_transactions("miner").clone();
    assert!(block.hash().to_hex().starts_with("000"));
    assert_eq!(block.hash().to_hex().len(), 64);
    assert_eq!(*block.hash(), block.calculate_hash());
}

#[test]
fn fresh_ledger_is_valid() {
    let ledger = Ledger::default();
    assert!(ledger.is_chain_valid());
    assert_eq!(ledger.len(), 1);
}

#[test]
fn sealed_transfers_are_reproduced_unchanged() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut ledger = ledger(1);
    let txs: Vec<TransferRecord> = (0..25)
        .map(|i| {
            TransferRecord::new(
                format!("user-{}", rng.gen_range(0..5)),
                format!("user-{i}"),
                rng.gen_range(0..1_000),
            )
        })
        .collect();
    for tx in &txs {
        ledger.create_transaction(tx.clone());
    }
    let block = ledger.mine_pending_transactions("miner");
    assert_eq!(block.transfers(), txs.as_slice());
}

#[test]
fn tampered_amount_is_detected() {
    let mut ledger = ledger(2);
    ledger.create_transaction(TransferRecord::new("A", "B", 10));
    ledger.mine_pending_transactions("M");
    ledger.mine_pending_transactions("M");
    assert!(ledger.is_chain_valid());

    let tampered = tamper(&ledger, |chain| {
        chain[1]["transfers"][0]["amount"] = serde_json::json!(1_000_000);
    });
    assert!(!tampered.is_chain_valid());
    assert_eq!(tampered.verify_chain().unwrap_err().index, 1);

    let tampered = tamper(&ledger, |chain| {
        chain[2]["transfers"][0]["amount"] = serde_json::json!(99);
    });
    assert!(!tampered.is_chain_valid());
}

#[test]
fn rewritten_link_is_detected_even_with_consistent_hash() {
    let mut ledger = ledger(1);
    ledger.create_transaction(TransferRecord::new("A", "B", 10));
    ledger.mine_pending_transactions("M");

    let original = &ledger.blocks()[1];
    let forged_prev: BlockHash = "ab".repeat(32).parse().unwrap();
    let resealed = Block::mine(
        BlockTemplate::new(
            original.timestamp(),
            original.transfers().to_vec(),
            forged_prev,
        ),
        0,
    );
    assert_eq!(*resealed.hash(), resealed.calculate_hash());

    let relinked = Ledger::from_parts(
        vec![ledger.blocks()[0].clone(), resealed],
        vec![],
        *ledger.config(),
    )
    .unwrap();
    assert!(!relinked.is_chain_valid());
}

#[test]
fn balances_follow_the_reward_schedule() {
    let mut ledger = ledger(2);
    ledger.create_transaction(TransferRecord::new("A", "B", 10));
    ledger.mine_pending_transactions("M");
    assert_eq!(ledger.get_balance_of_address("B"), 10);
    assert_eq!(ledger.get_balance_of_address("A"), -10);
    assert_eq!(ledger.get_balance_of_address("M"), 0);

    ledger.mine_pending_transactions("M");
    assert_eq!(ledger.get_balance_of_address("M"), 100);
    assert_eq!(
        ledger.pending_transactions(),
        &[TransferRecord::reward("M", 100)]
    );
    assert_eq!(ledger.get_balance_of_address("unknown"), 0);
}

#[test]
fn self_transfer_nets_to_zero_once_sealed() {
    let mut ledger = ledger(1);
    ledger.create_transaction(TransferRecord::new("A", "A", 42));
    ledger.mine_pending_transactions("M");
    assert_eq!(ledger.get_balance_of_address("A"), 0);
}

#[test]
fn two_transfers_then_two_rounds_of_mining() {
    let mut ledger = Ledger::default();
    ledger.create_transaction(TransferRecord::new("address1", "address2", 10));
    ledger.create_transaction(TransferRecord::new("address1", "address2", 5));
    ledger.mine_pending_transactions("miner-address");
    assert_eq!(ledger.get_balance_of_address("miner-address"), 0);
    ledger.mine_pending_transactions("miner-address");
    assert_eq!(ledger.get_balance_of_address("miner-address"), 100);
    assert_eq!(ledger.get_balance_of_address("address1"), -15);
    assert_eq!(ledger.get_balance_of_address("address2"), 15);
    assert!(ledger.is_chain_valid());
}

/// Mean attempts at difficulty `d` over random templates.
fn mean_attempts(rng: &mut StdRng, difficulty: u32, trials: usize) -> f64 {
    let total: u64 = (0..trials)
        .map(|_| {
            let template = BlockTemplate::new(
                rng.gen(),
                vec![TransferRecord::new("a", "b", rng.gen())],
                BlockHash::from_bytes(rng.gen()),
            );
            pow::search_nonce(&template, difficulty).nonce + 1
        })
        .sum();
    total as f64 / trials as f64
}

#[test]
fn each_difficulty_step_costs_about_sixteen_times_more() {
    let mut rng = StdRng::seed_from_u64(42);
    let d1 = mean_attempts(&mut rng, 1, 400);
    let d2 = mean_attempts(&mut rng, 2, 400);
    let ratio = d2 / d1;
    assert!((8.0..=32.0).contains(&ratio), "d1={d1} d2={d2} ratio={ratio}");
}
