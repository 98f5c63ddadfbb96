use ledger_core::{ChainFetcher, LedgerError, PeerChain};
use reqwest::Client;
use std::time::Duration;

/// Fetches peer chains from their `GET /chain` endpoint.
#[derive(Clone, Debug)]
pub struct HttpChainFetcher {
    http: Client,
}

impl HttpChainFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, LedgerError> {
        let failed = |err: reqwest::Error| LedgerError::PeerFetchFailed {
            peer: peer.to_string(),
            reason: err.to_string(),
        };
        let resp = self
            .http
            .get(format!("http://{peer}/chain"))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed)?;
        resp.json::<PeerChain>().await.map_err(failed)
    }
}
