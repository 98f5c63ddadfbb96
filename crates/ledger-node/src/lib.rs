pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod routes;

pub use config::Args;
pub use fetcher::HttpChainFetcher;
pub use routes::{router, AppState};
