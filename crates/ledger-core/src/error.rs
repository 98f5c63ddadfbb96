use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid peer address: {0:?}")]
    InvalidAddress(String),

    #[error("failed to fetch chain from peer {peer}: {reason}")]
    PeerFetchFailed { peer: String, reason: String },

    #[error("proof-of-work search was cancelled")]
    MiningCancelled,

    /// The chain tip moved between solving and committing a block.
    #[error("chain tip changed: expected last block hash {expected}, found {actual}")]
    StaleTip { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
