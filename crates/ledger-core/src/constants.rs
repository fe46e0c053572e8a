pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Highest difficulty a 256-bit digest can ever satisfy.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const DEFAULT_MINING_REWARD: u64 = 100;
/// 2018-08-08T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP_MS: u64 = 1_533_686_400_000;
/// Nonces tried between two checks of a cancellation token.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;
