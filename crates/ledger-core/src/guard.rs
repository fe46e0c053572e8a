//! Checked submission. These rules are an extension on top of the plain
//! pending-queue operation, which accepts anything.

use crate::{
    balance::{balance_of, pending_debits},
    error::LedgerError,
    ledger::Ledger,
    transfer::TransferRecord,
};
use tracing::warn;

impl Ledger {
    /// Queues `record` only if it names a sender, moves a positive amount, is
    /// not already pending, and the sender can cover it from confirmed funds
    /// minus what it is already sending in the pending queue.
    pub fn submit_checked(&mut self, record: TransferRecord) -> Result<(), LedgerError> {
        check_submission(self, &record).inspect_err(|err| warn!("rejected transfer: {err}"))?;
        self.create_transaction(record);
        Ok(())
    }
}

pub(crate) fn check_submission(
    ledger: &Ledger,
    record: &TransferRecord,
) -> Result<(), LedgerError> {
    let Some(sender) = record.sender() else {
        return Err(LedgerError::MissingSender);
    };
    if record.amount() == 0 {
        return Err(LedgerError::InvalidAmount);
    }
    if sender.is_empty() || record.recipient().is_empty() {
        return Err(LedgerError::EmptyAddress);
    }
    let pending = ledger.pending_transactions();
    if pending.contains(record) {
        return Err(LedgerError::DuplicateTransfer);
    }
    let available = balance_of(ledger.blocks(), sender) - pending_debits(pending, sender);
    if available < i128::from(record.amount()) {
        return Err(LedgerError::InsufficientBalance {
            address: sender.to_string(),
            available,
            requested: record.amount(),
        });
    }
    Ok(())
}
