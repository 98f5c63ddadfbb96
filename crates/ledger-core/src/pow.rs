use crate::constants::{CANCEL_POLL_INTERVAL, POW_DIFFICULTY_PREFIX};
use crate::error::{LedgerError, Result};
use crate::{sha256_hex, Block};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Proofs handed to each rayon worker per round of the parallel search.
const PARALLEL_CHUNK_PER_THREAD: u64 = 1024;

/// Shared stop flag for a running proof search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// True when `sha256("{last_proof}{proof}{last_hash}")` starts with the
/// difficulty prefix.
pub fn valid_proof(last_proof: u64, proof: u64, last_hash: &str) -> bool {
    let guess = format!("{last_proof}{proof}{last_hash}");
    sha256_hex(guess.as_bytes()).starts_with(POW_DIFFICULTY_PREFIX)
}

/// Search proofs upward from 0 until one satisfies [`valid_proof`] against
/// `last_block`. Polls `cancel` every [`CANCEL_POLL_INTERVAL`] attempts.
pub fn solve(last_block: &Block, cancel: &CancelToken) -> Result<u64> {
    let last_proof = last_block.proof;
    let last_hash = last_block.hash();

    let mut proof = 0u64;
    loop {
        if proof % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
            debug!(last_index = last_block.index, tried = proof, "proof search cancelled");
            return Err(LedgerError::MiningCancelled);
        }
        if valid_proof(last_proof, proof, &last_hash) {
            info!(last_index = last_block.index, proof, "found proof of work");
            return Ok(proof);
        }
        proof = proof.wrapping_add(1);
    }
}

/// Parallel variant of [`solve`]. Scans the proof space in consecutive chunks
/// split across the rayon pool and takes the first hit of the earliest chunk,
/// so the result is the same smallest proof the sequential search returns.
pub fn solve_parallel(last_block: &Block, cancel: &CancelToken) -> Result<u64> {
    let last_proof = last_block.proof;
    let last_hash = last_block.hash();
    let chunk = (rayon::current_num_threads() as u64).max(1) * PARALLEL_CHUNK_PER_THREAD;

    let mut start = 0u64;
    loop {
        if cancel.is_cancelled() {
            debug!(last_index = last_block.index, tried = start, "parallel proof search cancelled");
            return Err(LedgerError::MiningCancelled);
        }
        let end = start.saturating_add(chunk);
        let found = (start..end)
            .into_par_iter()
            .find_first(|proof| valid_proof(last_proof, *proof, &last_hash));
        if let Some(proof) = found {
            info!(last_index = last_block.index, proof, "found proof of work");
            return Ok(proof);
        }
        start = if end == u64::MAX { 0 } else { end };
    }
}
