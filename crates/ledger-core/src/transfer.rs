use serde::{Deserialize, Serialize};

/// A value transfer between two addresses. A record without a sender is a
/// mining reward.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferRecord {
    pub(crate) from: Option<String>,
    pub(crate) to: String,
    pub(crate) amount: u64,
}

impl TransferRecord {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        Self {
            from: Some(from.into()),
            to: to.into(),
            amount,
        }
    }

    pub fn reward(to: impl Into<String>, amount: u64) -> Self {
        Self {
            from: None,
            to: to.into(),
            amount,
        }
    }

    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_none()
    }
}

/// Compact JSON array with a fixed field order. Two equal sequences always
/// produce the same bytes.
pub fn canonical_bytes(transfers: &[TransferRecord]) -> Vec<u8> {
    serde_json::to_vec(transfers).expect("transfer records always serialize")
}
