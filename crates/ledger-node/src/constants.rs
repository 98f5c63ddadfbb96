pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
pub(crate) const NODE_ID_BYTES: usize = 16;
