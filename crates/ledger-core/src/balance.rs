use crate::{block::Block, transfer::TransferRecord};
use std::collections::BTreeMap;

/// Net position of `address` after replaying every transfer in chain order.
/// Debit and credit are applied independently, so a self-transfer nets to
/// zero. Reward transfers have no sender and never debit anyone.
pub fn balance_of(blocks: &[Block], address: &str) -> i128 {
    blocks
        .iter()
        .flat_map(|block| block.transfers.iter())
        .fold(0i128, |balance, tx| balance + net_effect(tx, address))
}

fn net_effect(tx: &TransferRecord, address: &str) -> i128 {
    let mut delta = 0i128;
    if tx.from.as_deref() == Some(address) {
        delta -= i128::from(tx.amount);
    }
    if tx.to == address {
        delta += i128::from(tx.amount);
    }
    delta
}

/// Every address that appears in the chain with its replayed balance.
pub fn balances(blocks: &[Block]) -> BTreeMap<String, i128> {
    let mut out = BTreeMap::new();
    for tx in blocks.iter().flat_map(|block| block.transfers.iter()) {
        let amount = i128::from(tx.amount);
        if let Some(from) = &tx.from {
            *out.entry(from.clone()).or_insert(0) -= amount;
        }
        *out.entry(tx.to.clone()).or_insert(0) += amount;
    }
    out
}

/// Sum of amounts `address` is already sending in `pending`.
pub(crate) fn pending_debits(pending: &[TransferRecord], address: &str) -> i128 {
    pending
        .iter()
        .filter(|tx| tx.from.as_deref() == Some(address))
        .map(|tx| i128::from(tx.amount))
        .sum()
}
