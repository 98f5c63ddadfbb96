use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, MINING_REWARD, MINING_REWARD_SENDER};
use crate::consensus::PeerChain;
use crate::error::{LedgerError, Result};
use crate::pow::{self, CancelToken};
use crate::{now_timestamp, Block, Transaction};
use serde_json::Number;
use tracing::{debug, info};

/// The local chain plus the pool of transactions waiting for the next block.
///
/// The chain is never empty: [`Ledger::new`] seals the genesis block.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger.new_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()));
        ledger
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn last_block(&self) -> &Block {
        // `new` always seals genesis and `adopt_chain` rejects empty chains.
        &self.chain[self.chain.len() - 1]
    }

    /// Queue a transaction and return the index of the block that will hold it.
    /// Field values are not validated.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        self.chain.len() as u64 + 1
    }

    /// Seal the whole pending pool into a new block and append it.
    /// `previous_hash` defaults to the hash of the current last block.
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<String>) -> Block {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.last_block().hash(),
        };
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: now_timestamp(),
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        debug!(index = block.index, txs = block.transactions.len(), "sealed block");
        self.chain.push(block.clone());
        block
    }

    /// Credit `recipient` with the mining reward and seal a block with `proof`,
    /// provided the chain tip still hashes to `expected_last_hash`.
    pub fn commit_mined(
        &mut self,
        recipient: &str,
        expected_last_hash: &str,
        proof: u64,
    ) -> Result<Block> {
        let actual = self.last_block().hash();
        if actual != expected_last_hash {
            return Err(LedgerError::StaleTip {
                expected: expected_last_hash.to_string(),
                actual,
            });
        }
        self.new_transaction(MINING_REWARD_SENDER, recipient, MINING_REWARD);
        let block = self.new_block(proof, Some(actual));
        info!(
            index = block.index,
            proof = block.proof,
            txs = block.transactions.len(),
            "mined new block"
        );
        Ok(block)
    }

    /// Solve proof-of-work against the current tip and commit the block,
    /// all on the calling thread.
    pub fn mine(&mut self, recipient: &str, cancel: &CancelToken) -> Result<Block> {
        let last = self.last_block();
        let last_hash = last.hash();
        let proof = pow::solve(last, cancel)?;
        self.commit_mined(recipient, &last_hash, proof)
    }

    pub fn is_valid(&self) -> bool {
        valid_chain(&self.chain)
    }

    /// Replace the local chain with `candidate` when it reports a strictly
    /// greater length, is non-empty, and passes [`valid_chain`].
    /// The pending pool is kept as is.
    pub fn adopt_chain(&mut self, candidate: PeerChain) -> bool {
        if candidate.length <= self.chain.len() as u64 {
            debug!(
                local = self.chain.len(),
                candidate = candidate.length,
                "candidate chain is not longer than ours"
            );
            return false;
        }
        if candidate.chain.is_empty() || !valid_chain(&candidate.chain) {
            debug!(candidate = candidate.length, "candidate chain rejected");
            return false;
        }
        info!(
            old_length = self.chain.len(),
            new_length = candidate.chain.len(),
            "replacing local chain"
        );
        self.chain = candidate.chain;
        true
    }
}

/// Check hash linkage and proof-of-work from the second block onward.
/// Indices and transaction contents are not inspected.
pub fn valid_chain(chain: &[Block]) -> bool {
    chain.windows(2).all(|pair| {
        let (prev, block) = (&pair[0], &pair[1]);
        let prev_hash = prev.hash();
        if block.previous_hash != prev_hash {
            debug!(index = block.index, "previous_hash does not match");
            return false;
        }
        if !pow::valid_proof(prev.proof, block.proof, &prev_hash) {
            debug!(index = block.index, "invalid proof of work");
            return false;
        }
        true
    })
}
