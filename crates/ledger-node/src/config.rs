use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LISTEN, NODE_ID_BYTES};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node with longest-chain consensus")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Identifier credited with mining rewards (random when omitted)
    #[arg(long)]
    pub node_id: Option<String>,

    /// Peer to register at startup; may be repeated
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-peer timeout when fetching chains during conflict resolution
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Spread the proof search across all cores
    #[arg(long)]
    pub parallel_mining: bool,
}

impl Args {
    pub fn node_id(&self) -> String {
        self.node_id.clone().unwrap_or_else(random_node_id)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

pub fn random_node_id() -> String {
    let bytes: [u8; NODE_ID_BYTES] = rand::random();
    hex::encode(bytes)
}
