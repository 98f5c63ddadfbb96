use crate::error::{LedgerError, Result};
use std::collections::BTreeSet;
use tracing::info;
use url::Url;

/// Known peer locations as `host:port` strings.
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    nodes: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `address` and add it. Re-registering a known peer is a no-op.
    pub fn register(&mut self, address: &str) -> Result<()> {
        let node = normalize_address(address)?;
        if self.nodes.insert(node.clone()) {
            info!(peer = %node, "registered peer");
        }
        Ok(())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// `scheme://host:port/...` becomes `host:port`; anything without a scheme
/// separator is kept verbatim.
pub fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let invalid = || LedgerError::InvalidAddress(address.to_string());

    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    if !trimmed.contains("://") {
        return Ok(trimmed.to_string());
    }

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_example() {
        let mut peers = PeerRegistry::new();
        peers.register("http://192.168.0.5:5000").unwrap();
        peers.register("192.168.0.6:5000").unwrap();
        let nodes: Vec<&str> = peers.iter().collect();
        assert_eq!(nodes, vec!["192.168.0.5:5000", "192.168.0.6:5000"]);
    }

    #[test]
    fn duplicate_registration_is_noop() {
        let mut peers = PeerRegistry::new();
        peers.register("http://localhost:5001").unwrap();
        peers.register("localhost:5001").unwrap();
        peers.register("https://localhost:5001/chain").unwrap();
        assert_eq!(peers.len(), 1);
        assert!(peers.contains("localhost:5001"));
    }

    #[test]
    fn url_path_and_query_are_dropped() {
        assert_eq!(
            normalize_address("http://node.example:8080/chain?x=1").unwrap(),
            "node.example:8080"
        );
        assert_eq!(normalize_address("http://Node.Example").unwrap(), "node.example");
        assert_eq!(normalize_address("http://[::1]:5000").unwrap(), "[::1]:5000");
    }

    #[test]
    fn bare_locations_are_kept_verbatim() {
        assert_eq!(normalize_address("localhost:5000").unwrap(), "localhost:5000");
        assert_eq!(normalize_address("  10.0.0.1:80 ").unwrap(), "10.0.0.1:80");
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        for bad in ["", "   ", "http://", "http://:5000", "a b:5000"] {
            assert_eq!(
                normalize_address(bad),
                Err(LedgerError::InvalidAddress(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn failed_registration_leaves_set_unchanged() {
        let mut peers = PeerRegistry::new();
        peers.register("127.0.0.1:5000").unwrap();
        assert!(peers.register("http://").is_err());
        assert_eq!(peers.len(), 1);
    }
}
