use thiserror::Error;

pub mod bridge_client;
pub mod snapshot_response;

pub use bridge_client::BridgeClient;
pub use snapshot_response::{LastErrorResponse, SnapshotResponse};

pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8000";

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("bridge request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bridge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("incomplete snapshot for {symbol}: missing {field}")]
    Incomplete { symbol: String, field: &'static str },
}
