use std::sync::Arc;

use async_trait::async_trait;
use common::models::{MarketSnapshot, OrderRequest, SubmitResult};
use engine::{Broker, EngineError, MarketData};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::remote::snapshot_response::{LastErrorResponse, SnapshotResponse};
use crate::remote::BridgeError;
use crate::traits::RemoteResponse;

/// JSON client for the gateway that fronts the broker terminal.
#[derive(Clone)]
pub struct BridgeClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    last_failure: Arc<Mutex<Option<String>>>,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            last_failure: Arc::new(Mutex::new(None)),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BridgeError> {
        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BridgeError::Status { status, body });
        }

        Ok(resp.json::<T>().await?)
    }

    pub async fn fetch_symbols(&self) -> Result<Vec<String>, BridgeError> {
        Self::read_json(self.request(Method::GET, "/symbols")).await
    }

    pub async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, BridgeError> {
        let path = format!("/symbols/{}/snapshot", symbol);
        let response: SnapshotResponse = Self::read_json(self.request(Method::GET, &path)).await?;
        debug!("Snapshot for {}: {:?}", symbol, response);
        response.to_model()
    }

    pub async fn post_order(&self, order: &OrderRequest) -> Result<SubmitResult, BridgeError> {
        info!("Placing Order: {:?} {} {}", order.order_type, order.volume, order.symbol);
        Self::read_json(self.request(Method::POST, "/orders").json(order)).await
    }

    pub async fn fetch_last_error(&self) -> Result<LastErrorResponse, BridgeError> {
        Self::read_json(self.request(Method::GET, "/last_error")).await
    }
}

fn snapshot_error(symbol: &str, err: BridgeError) -> EngineError {
    match err {
        BridgeError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            EngineError::SymbolNotFound(symbol.to_string())
        }
        other => EngineError::MarketDataUnavailable {
            symbol: symbol.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl MarketData for BridgeClient {
    async fn symbols(&self) -> Result<Vec<String>, EngineError> {
        self.fetch_symbols()
            .await
            .map_err(|e| EngineError::MarketDataUnavailable {
                symbol: "*".to_string(),
                reason: e.to_string(),
            })
    }

    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, EngineError> {
        self.fetch_snapshot(symbol)
            .await
            .map_err(|e| snapshot_error(symbol, e))
    }
}

#[async_trait]
impl Broker for BridgeClient {
    async fn submit(&self, order: &OrderRequest) -> Option<SubmitResult> {
        match self.post_order(order).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Bridge order request failed: {}", e);
                *self.last_failure.lock().await = Some(e.to_string());
                None
            }
        }
    }

    async fn last_error(&self) -> (i32, String) {
        if let Some(message) = self.last_failure.lock().await.take() {
            return (-1, message);
        }
        match self.fetch_last_error().await {
            Ok(last) => (last.code, last.message),
            Err(e) => (-1, e.to_string()),
        }
    }
}
