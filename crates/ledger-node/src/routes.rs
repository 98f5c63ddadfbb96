use crate::error::ApiError;
use crate::fetcher::HttpChainFetcher;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    consensus::longest_valid_chain,
    pow::{solve, solve_parallel, CancelToken},
    Block, Ledger, LedgerError, PeerChain, PeerRegistry, Transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub peers: Arc<RwLock<PeerRegistry>>,
    pub fetcher: HttpChainFetcher,
    pub node_id: Arc<str>,
    pub parallel_mining: bool,
    /// Cancelled on shutdown to abort in-flight proof searches.
    pub cancel: CancelToken,
}

impl AppState {
    pub fn new(node_id: impl Into<Arc<str>>, fetcher: HttpChainFetcher) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger::new())),
            peers: Arc::new(RwLock::new(PeerRegistry::new())),
            fetcher,
            node_id: node_id.into(),
            parallel_mining: false,
            cancel: CancelToken::new(),
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl From<Block> for MineResponse {
    fn from(block: Block) -> Self {
        Self {
            message: "New block forged".to_string(),
            index: block.index,
            transactions: block.transactions,
            proof: block.proof,
            previous_hash: block.previous_hash,
        }
    }
}

#[derive(Deserialize)]
pub struct NewTransaction {
    sender: Option<String>,
    recipient: Option<String>,
    amount: Option<Number>,
}

#[derive(Serialize, Deserialize)]
pub struct TransactionAccepted {
    pub message: String,
    pub index: u64,
}

#[derive(Deserialize)]
pub struct RegisterNodes {
    nodes: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
pub struct NodesRegistered {
    pub message: String,
    pub total_nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct Resolved {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(consensus))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Solve against a snapshot of the tip off the async runtime, then commit.
/// If another block landed in the meantime the search restarts on the new tip.
async fn mine(State(state): State<AppState>) -> Result<Json<MineResponse>, ApiError> {
    loop {
        let last = state.ledger.read().await.last_block().clone();
        let last_hash = last.hash();
        let cancel = state.cancel.clone();
        let parallel = state.parallel_mining;

        let proof = tokio::task::spawn_blocking(move || {
            if parallel {
                solve_parallel(&last, &cancel)
            } else {
                solve(&last, &cancel)
            }
        })
        .await??;

        let committed = state
            .ledger
            .write()
            .await
            .commit_mined(&state.node_id, &last_hash, proof);
        match committed {
            Ok(block) => return Ok(Json(block.into())),
            Err(LedgerError::StaleTip { .. }) => {
                debug!("chain tip moved while mining, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn new_transaction(
    State(state): State<AppState>,
    Json(tx): Json<NewTransaction>,
) -> Result<(StatusCode, Json<TransactionAccepted>), ApiError> {
    let (Some(sender), Some(recipient), Some(amount)) = (tx.sender, tx.recipient, tx.amount)
    else {
        return Err(ApiError::BadRequest(
            "missing values: sender, recipient and amount are required".to_string(),
        ));
    };
    let index = state
        .ledger
        .write()
        .await
        .new_transaction(sender, recipient, amount);
    Ok((
        StatusCode::CREATED,
        Json(TransactionAccepted {
            message: format!("Transaction will be added to block {index}"),
            index,
        }),
    ))
}

async fn full_chain(State(state): State<AppState>) -> Json<PeerChain> {
    let ledger = state.ledger.read().await;
    Json(PeerChain {
        length: ledger.len() as u64,
        chain: ledger.chain().to_vec(),
    })
}

async fn register_nodes(
    State(state): State<AppState>,
    Json(body): Json<RegisterNodes>,
) -> Result<(StatusCode, Json<NodesRegistered>), ApiError> {
    let Some(nodes) = body.nodes else {
        return Err(ApiError::BadRequest(
            "please supply a valid list of nodes".to_string(),
        ));
    };

    let mut peers = state.peers.write().await;
    let rejected: Vec<String> = nodes
        .iter()
        .filter(|node| peers.register(node).is_err())
        .cloned()
        .collect();
    let total_nodes: Vec<String> = peers.iter().map(str::to_string).collect();
    drop(peers);

    let (status, message) = if rejected.is_empty() {
        (StatusCode::CREATED, "New nodes have been added")
    } else {
        (StatusCode::BAD_REQUEST, "Some nodes could not be parsed")
    };
    Ok((
        status,
        Json(NodesRegistered {
            message: message.to_string(),
            total_nodes,
            rejected,
        }),
    ))
}

/// Scan peers without holding the ledger lock; `adopt_chain` re-checks the
/// length against the chain as it is when the swap happens.
async fn consensus(State(state): State<AppState>) -> Json<Resolved> {
    let local_length = state.ledger.read().await.len() as u64;
    let peers: Vec<String> = state.peers.read().await.iter().map(str::to_string).collect();

    let candidate = longest_valid_chain(&state.fetcher, &peers, local_length).await;

    let mut ledger = state.ledger.write().await;
    let replaced = candidate.is_some_and(|chain| ledger.adopt_chain(chain));
    if !replaced {
        info!(length = ledger.len(), "local chain is authoritative");
    }
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Json(Resolved {
        message: message.to_string(),
        replaced,
        chain: ledger.chain().to_vec(),
    })
}
