//! Longest-valid-chain conflict resolution across registered peers.

use crate::error::Result;
use crate::ledger::{valid_chain, Ledger};
use crate::peers::PeerRegistry;
use crate::Block;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

/// A peer's chain as reported by its `/chain` endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerChain {
    pub length: u64,
    pub chain: Vec<Block>,
}

/// Retrieves the full chain held by a peer. Any failure, including a non-ok
/// response, should come back as [`LedgerError::PeerFetchFailed`].
///
/// [`LedgerError::PeerFetchFailed`]: crate::LedgerError::PeerFetchFailed
pub trait ChainFetcher: Send + Sync {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<PeerChain>> + Send;
}

/// Scan `peers` in order and return the longest valid chain whose reported
/// length beats `local_length`. Each acceptance raises the bar for the peers
/// after it, so ties keep whichever chain was seen first.
pub async fn longest_valid_chain<F, I>(
    fetcher: &F,
    peers: I,
    local_length: u64,
) -> Option<PeerChain>
where
    F: ChainFetcher,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut max_length = local_length;
    let mut best = None;

    for peer in peers {
        let peer = peer.as_ref();
        let candidate = match fetcher.fetch_chain(peer).await {
            Ok(candidate) => candidate,
            Err(err) => {
                warn!(peer, error = %err, "skipping peer");
                continue;
            }
        };
        if candidate.length <= max_length {
            debug!(peer, length = candidate.length, max_length, "peer chain not longer");
            continue;
        }
        if !valid_chain(&candidate.chain) {
            warn!(peer, length = candidate.length, "peer sent an invalid chain");
            continue;
        }
        debug!(peer, length = candidate.length, "peer chain is the new best");
        max_length = candidate.length;
        best = Some(candidate);
    }

    best
}

/// Replace the ledger's chain with the longest valid peer chain, if any is
/// strictly longer. Returns whether the chain was replaced.
pub async fn resolve_conflicts<F: ChainFetcher>(
    ledger: &mut Ledger,
    peers: &PeerRegistry,
    fetcher: &F,
) -> bool {
    let local_length = ledger.len() as u64;
    match longest_valid_chain(fetcher, peers.iter(), local_length).await {
        Some(candidate) => ledger.adopt_chain(candidate),
        None => {
            info!(length = local_length, "local chain is authoritative");
            false
        }
    }
}
