use axum::Router;
use ledger_node::{router, AppState, HttpChainFetcher};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve a fresh node on an ephemeral port; returns its state and base URL.
pub async fn spawn_node(node_id: &str) -> (AppState, String) {
    spawn_node_with_timeout(node_id, Duration::from_secs(2)).await
}

pub async fn spawn_node_with_timeout(
    node_id: &str,
    fetch_timeout: Duration,
) -> (AppState, String) {
    let fetcher = HttpChainFetcher::new(fetch_timeout).expect("Failed to build chain fetcher");
    let state = AppState::new(node_id, fetcher);
    let addr = serve(router(state.clone())).await;
    (state, format!("http://{addr}"))
}

/// Serve an arbitrary router, standing in for a misbehaving peer.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });
    addr
}

/// A peer that accepts connections and never writes a byte back.
pub async fn spawn_silent_peer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}
