use serde::{Deserialize, Serialize};

/// Broker volume constraints for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for VolumeLimits {
    fn default() -> Self {
        Self {
            min: 0.01,
            max: 100.0,
            step: 0.01,
        }
    }
}

/// Point-in-time view of a symbol and the trading account, read once per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub ask: f64,
    pub bid: f64,
    pub tick_value: f64,
    pub tick_size: f64,
    pub point_size: f64,
    pub volume: VolumeLimits,
    pub account_balance: f64,
}
