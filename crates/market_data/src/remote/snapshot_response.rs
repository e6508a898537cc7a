use common::models::{MarketSnapshot, VolumeLimits};
use serde::Deserialize;

use crate::remote::BridgeError;
use crate::traits::RemoteResponse;

/// Symbol info, last tick and account balance as reported by the bridge.
#[derive(Deserialize, Debug)]
pub struct SnapshotResponse {
    pub symbol: String,
    pub ask: Option<f64>,
    pub bid: Option<f64>,
    #[serde(rename(deserialize = "trade_tick_value"))]
    pub tick_value: Option<f64>,
    #[serde(rename(deserialize = "trade_tick_size"), default)]
    pub tick_size: f64,
    #[serde(rename(deserialize = "point"), default)]
    pub point_size: f64,
    pub volume_min: Option<f64>,
    pub volume_max: Option<f64>,
    pub volume_step: Option<f64>,
    pub balance: Option<f64>,
}

impl RemoteResponse<MarketSnapshot> for SnapshotResponse {
    fn to_model(&self) -> Result<MarketSnapshot, BridgeError> {
        let missing = |field: &'static str| BridgeError::Incomplete {
            symbol: self.symbol.clone(),
            field,
        };
        let defaults = VolumeLimits::default();

        Ok(MarketSnapshot {
            symbol: self.symbol.clone(),
            ask: self.ask.ok_or_else(|| missing("ask"))?,
            bid: self.bid.ok_or_else(|| missing("bid"))?,
            tick_value: self.tick_value.ok_or_else(|| missing("trade_tick_value"))?,
            tick_size: self.tick_size,
            point_size: self.point_size,
            volume: VolumeLimits {
                min: self.volume_min.unwrap_or(defaults.min),
                max: self.volume_max.unwrap_or(defaults.max),
                step: self.volume_step.unwrap_or(defaults.step),
            },
            account_balance: self.balance.ok_or_else(|| missing("balance"))?,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct LastErrorResponse {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_defaults_volume_limits() {
        let response: SnapshotResponse = serde_json::from_str(
            r#"{"symbol": "XAUUSDm", "ask": 2005.1, "bid": 2004.9,
                "trade_tick_value": 1.0, "trade_tick_size": 0.01, "point": 0.01,
                "balance": 10000.0}"#,
        )
        .unwrap();

        let snapshot = response.to_model().unwrap();
        assert_eq!(snapshot.ask, 2005.1);
        assert_eq!(snapshot.volume, VolumeLimits::default());
        assert_eq!(snapshot.account_balance, 10_000.0);
    }

    #[test]
    fn test_snapshot_without_account_is_incomplete() {
        let response: SnapshotResponse = serde_json::from_str(
            r#"{"symbol": "XAUUSDm", "ask": 2005.1, "bid": 2004.9, "trade_tick_value": 1.0}"#,
        )
        .unwrap();

        match response.to_model() {
            Err(BridgeError::Incomplete { field, .. }) => assert_eq!(field, "balance"),
            other => panic!("expected incomplete snapshot, got {:?}", other),
        }
    }
}
