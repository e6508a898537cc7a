use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A scalar as emitted by the signal parser. Prices may arrive quoted and
/// confidence may arrive as `"80%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Finite numbers only: `"nan"` and `"inf"` read as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }

    /// Like [`FieldValue::as_f64`] but tolerates a trailing percent sign.
    pub fn as_percent(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The signal record exactly as handed over by the signal source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSignal {
    pub signal_id: Option<FieldValue>,
    pub entry: Option<FieldValue>,
    pub sl: Option<FieldValue>,
    pub tp: Option<FieldValue>,
    pub pending_order_type: Option<String>,
    pub confidence: Option<FieldValue>,
    pub max_drawdown: Option<FieldValue>,
    pub risk_per_trade: Option<FieldValue>,
    pub short_reason: Option<String>,
    pub regime_type: Option<RegimeType>,
}

/// Market regime attached by the signal source, either a single label or a
/// set of named readings such as `{"trend": "up", "volatility": "high"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegimeType {
    Fields(BTreeMap<String, FieldValue>),
    Label(FieldValue),
}

impl fmt::Display for RegimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "{}", label),
            Self::Fields(fields) => {
                let rendered: Vec<String> =
                    fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                f.write_str(&rendered.join(", "))
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown pending_order_type '{0}'")]
pub struct UnknownOrderType(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOrderType {
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
    Skip,
}

impl PendingOrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuyLimit => "buy_limit",
            Self::SellLimit => "sell_limit",
            Self::BuyStop => "buy_stop",
            Self::SellStop => "sell_stop",
            Self::Skip => "skip",
        }
    }
}

impl FromStr for PendingOrderType {
    type Err = UnknownOrderType;

    /// Accepts `"Buy Limit"`, `"buy_limit"`, `" BUY_LIMIT "` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase().replace(' ', "_");
        match token.as_str() {
            "buy_limit" => Ok(Self::BuyLimit),
            "sell_limit" => Ok(Self::SellLimit),
            "buy_stop" => Ok(Self::BuyStop),
            "sell_stop" => Ok(Self::SellStop),
            "skip" => Ok(Self::Skip),
            _ => Err(UnknownOrderType(s.to_string())),
        }
    }
}

impl fmt::Display for PendingOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevels {
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
}

/// Everything a tradable (non-skip) signal carries beyond its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSetup {
    pub symbol_base: String,
    pub levels: PriceLevels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSignal {
    pub signal_id: String,
    pub order_type: PendingOrderType,
    /// Parsed confidence; `None` when absent or not numeric.
    pub confidence: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub risk_per_trade: Option<f64>,
    pub short_reason: Option<String>,
    /// Present for every order type except `skip`.
    pub setup: Option<TradeSetup>,
}
