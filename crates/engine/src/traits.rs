use async_trait::async_trait;
use common::models::{MarketSnapshot, OrderRequest, SubmitResult};

use crate::error::EngineError;

/// Read side of the broker terminal: instrument list plus per-symbol quotes
/// and account state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn symbols(&self) -> Result<Vec<String>, EngineError>;

    /// Fails with `SymbolNotFound` or `MarketDataUnavailable`.
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, EngineError>;
}

/// Write side of the broker terminal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broker: Send + Sync {
    /// `None` when the terminal produced no result at all.
    async fn submit(&self, order: &OrderRequest) -> Option<SubmitResult>;

    async fn last_error(&self) -> (i32, String);
}
