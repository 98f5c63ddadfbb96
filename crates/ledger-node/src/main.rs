use clap::Parser;
use ledger_core::CancelToken;
use ledger_node::{router, AppState, Args, HttpChainFetcher};
use std::net::SocketAddr;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let fetcher = HttpChainFetcher::new(args.fetch_timeout())?;
    let mut state = AppState::new(args.node_id(), fetcher);
    state.parallel_mining = args.parallel_mining;

    {
        let mut peers = state.peers.write().await;
        for peer in &args.peers {
            if let Err(err) = peers.register(peer) {
                warn!(error = %err, "ignoring bootstrap peer");
            }
        }
    }

    let cancel = state.cancel.clone();
    let app = router(state.clone());

    let addr: SocketAddr = args.listen.parse()?;
    info!(node_id = %state.node_id, "ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;
    Ok(())
}

async fn shutdown_signal(cancel: CancelToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down, cancelling in-flight mining");
    cancel.cancel();
}
