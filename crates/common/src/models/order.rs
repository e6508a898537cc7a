use std::fmt;

use serde::{Deserialize, Serialize};

use super::signal::PendingOrderType;

pub const DEFAULT_DEVIATION: u32 = 10;
pub const DEFAULT_MAGIC: u64 = 888_888;
/// Broker return code for an accepted request.
pub const RETCODE_DONE: u32 = 10_009;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerOrderType {
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    Gtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillingMode {
    Return,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub action: TradeAction,
    pub symbol: String,
    pub volume: f64,
    #[serde(rename = "type")]
    pub order_type: BrokerOrderType,
    pub price: f64,
    pub sl: f64,
    pub tp: f64,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
    pub type_time: TimeInForce,
    pub type_filling: FillingMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResult {
    pub retcode: u32,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub order: Option<u64>,
}

impl SubmitResult {
    pub fn is_done(&self) -> bool {
        self.retcode == RETCODE_DONE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderStatus {
    Success,
    Skipped,
    ConfidenceZero,
    Error(String),
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Skipped => f.write_str("skipped"),
            Self::ConfidenceZero => f.write_str("confidence_zero"),
            Self::Error(reason) => write!(f, "error:{}", reason),
        }
    }
}

/// Final outcome of one signal. Skipped signals leave the market-derived
/// fields empty but still carry the resolved risk-per-trade.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDecision {
    pub signal_id: String,
    pub symbol: Option<String>,
    pub lot: Option<f64>,
    pub rr: Option<f64>,
    pub risk_per_trade: Option<f64>,
    pub confidence: Option<f64>,
    pub resolved_order_type: PendingOrderType,
    pub entry: Option<f64>,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    pub status: OrderStatus,
    pub adjust_note: Option<String>,
}

impl OrderDecision {
    /// Status line used in reports, e.g. `success adjust:buy_stop->buy_limit`.
    pub fn reported_status(&self) -> String {
        match &self.adjust_note {
            Some(note) => format!("{} {}", self.status, note),
            None => self.status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(OrderStatus::Success.to_string(), "success");
        assert_eq!(OrderStatus::ConfidenceZero.to_string(), "confidence_zero");
        assert_eq!(
            OrderStatus::Error("Invalid stops".to_string()).to_string(),
            "error:Invalid stops"
        );
    }

    #[test]
    fn test_order_request_wire_shape() {
        let request = OrderRequest {
            action: TradeAction::Pending,
            symbol: "XAUUSDm".to_string(),
            volume: 0.5,
            order_type: BrokerOrderType::BuyLimit,
            price: 2000.0,
            sl: 1990.0,
            tp: 2030.0,
            deviation: DEFAULT_DEVIATION,
            magic: DEFAULT_MAGIC,
            comment: "XAUUSD-1".to_string(),
            type_time: TimeInForce::Gtc,
            type_filling: FillingMode::Return,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "buy_limit");
        assert_eq!(json["action"], "pending");
        assert_eq!(json["type_time"], "gtc");
        assert_eq!(json["magic"], 888_888);
    }
}
