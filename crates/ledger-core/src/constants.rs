pub const GENESIS_PROOF: u64 = 100;
pub const GENESIS_PREVIOUS_HASH: &str = "1";
pub const POW_DIFFICULTY_PREFIX: &str = "0000";
pub const MINING_REWARD_SENDER: &str = "0";
pub const MINING_REWARD: i64 = 1;
/// How many proofs the sequential search tries between cancellation checks.
pub const CANCEL_POLL_INTERVAL: u64 = 4096;
