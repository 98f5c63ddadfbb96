use serde::{Deserialize, Serialize};
use serde_json::{json, Number};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod consensus;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod peers;
pub mod pow;

pub use consensus::{resolve_conflicts, ChainFetcher, PeerChain};
pub use error::LedgerError;
pub use ledger::{valid_chain, Ledger};
pub use peers::PeerRegistry;
pub use pow::CancelToken;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    /// Any JSON number; integers and fractions are both kept as sent.
    pub amount: Number,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    fn canonical_value(&self) -> serde_json::Value {
        json!({
            "amount": self.amount,
            "recipient": self.recipient,
            "sender": self.sender,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the unix epoch, with sub-second precision.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Canonical encoding used for hashing: compact JSON with object keys in
    /// lexicographic order at every level.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let txs: Vec<serde_json::Value> = self
            .transactions
            .iter()
            .map(Transaction::canonical_value)
            .collect();
        // Keys are written in sorted order so the encoding does not depend on
        // whether serde_json's map preserves insertion order.
        let value = json!({
            "index": self.index,
            "previous_hash": self.previous_hash,
            "proof": self.proof,
            "timestamp": self.timestamp,
            "transactions": txs,
        });
        value.to_string().into_bytes()
    }

    pub fn hash(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }
}

/// Lowercase hex SHA-256 digest of a block's canonical encoding.
pub fn hash_block(block: &Block) -> String {
    block.hash()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

pub(crate) fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_HEX_SIZE: usize = 64;

    fn sample_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_600_000_200.5,
            transactions: vec![
                Transaction::new("Alice", "Bob", 10),
                Transaction::new("Bob", "Charlie", 5),
            ],
            proof: 35293,
            previous_hash: "1".to_string(),
        }
    }

    #[test]
    fn canonical_bytes_sort_keys() {
        let block = Block {
            index: 1,
            timestamp: 1.5,
            transactions: vec![Transaction::new("a", "b", 3)],
            proof: 100,
            previous_hash: "1".to_string(),
        };
        let expected = r#"{"index":1,"previous_hash":"1","proof":100,"timestamp":1.5,"transactions":[{"amount":3,"recipient":"b","sender":"a"}]}"#;
        assert_eq!(String::from_utf8(block.canonical_bytes()).unwrap(), expected);
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        let block = sample_block();
        let hash = block.hash();
        assert_eq!(hash.len(), HASH_HEX_SIZE);
        assert!(hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(hash, sha256_hex(&block.canonical_bytes()));
        assert_eq!(hash, hash_block(&block));
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn block_hash_consistency() {
        let block = sample_block();
        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), block.clone().hash());
    }

    #[test]
    fn hash_independent_of_wire_field_order() {
        let block = sample_block();
        let reordered = r#"{
            "previous_hash": "1",
            "transactions": [
                {"recipient": "Bob", "amount": 10, "sender": "Alice"},
                {"amount": 5, "sender": "Bob", "recipient": "Charlie"}
            ],
            "proof": 35293,
            "timestamp": 1600000200.5,
            "index": 2
        }"#;
        let decoded: Block = serde_json::from_str(reordered).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn block_hash_changes_with_each_field() {
        let base = sample_block();
        let base_hash = base.hash();

        let mut b = base.clone();
        b.proof += 1;
        assert_ne!(b.hash(), base_hash);

        let mut b = base.clone();
        b.timestamp += 0.001;
        assert_ne!(b.hash(), base_hash);

        let mut b = base.clone();
        b.previous_hash = "2".to_string();
        assert_ne!(b.hash(), base_hash);

        let mut b = base.clone();
        b.transactions[1].amount = Number::from(6);
        assert_ne!(b.hash(), base_hash);

        let mut b = base.clone();
        b.transactions.swap(0, 1);
        assert_ne!(b.hash(), base_hash);
    }

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction::new("Alice", "Bob", 10);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"sender":"Alice","recipient":"Bob","amount":10}"#);
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, deserialized);
    }

    #[test]
    fn negative_and_zero_amounts_round_trip() {
        let tx = Transaction::new("", "", -7);
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount, Number::from(-7));
        assert_eq!(Transaction::new("x", "y", 0).amount, Number::from(0));
    }

    #[test]
    fn fractional_amounts_are_kept_and_hashed() {
        let tx: Transaction =
            serde_json::from_str(r#"{"sender":"Alice","recipient":"Bob","amount":2.5}"#).unwrap();
        assert_eq!(tx.amount.as_f64(), Some(2.5));
        assert_eq!(
            serde_json::to_string(&tx).unwrap(),
            r#"{"sender":"Alice","recipient":"Bob","amount":2.5}"#
        );

        let mut block = sample_block();
        block.transactions = vec![tx];
        let encoded = String::from_utf8(block.canonical_bytes()).unwrap();
        assert!(encoded.contains(r#"{"amount":2.5,"recipient":"Bob","sender":"Alice"}"#));

        let mut whole = block.clone();
        whole.transactions[0].amount = Number::from(2);
        assert_ne!(whole.hash(), block.hash());
    }

    #[test]
    fn now_timestamp_is_positive() {
        assert!(now_timestamp() > 1_600_000_000.0);
    }
}
