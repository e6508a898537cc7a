use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid signal: {0}")]
    Validation(String),
    #[error("cannot extract symbol from signal_id '{0}'")]
    SymbolExtraction(String),
    #[error("symbol '{0}' not found")]
    SymbolNotFound(String),
    #[error("market data unavailable for {symbol}: {reason}")]
    MarketDataUnavailable { symbol: String, reason: String },
    #[error("stop loss equals entry ({0}), risk/reward is undefined")]
    DegenerateStop(f64),
    #[error("invalid risk: {0}")]
    InvalidRisk(String),
    #[error("invalid pending_order_type '{0}'")]
    InvalidOrderType(String),
}

/// Pipeline step at which a signal was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    ResolveSymbol,
    MarketData,
    Reconcile,
    Risk,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::ResolveSymbol => "resolve-symbol",
            Self::MarketData => "market-data",
            Self::Reconcile => "reconcile",
            Self::Risk => "risk",
            Self::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("signal '{signal_id}' rejected at {stage}: {source}")]
pub struct PipelineError {
    pub signal_id: String,
    pub stage: Stage,
    pub source: EngineError,
}

impl PipelineError {
    pub fn new(signal_id: impl Into<String>, stage: Stage, source: EngineError) -> Self {
        Self {
            signal_id: signal_id.into(),
            stage,
            source,
        }
    }

    /// Order status to report for a signal that never reached the broker.
    /// Malformed signals read as skipped, everything else as an error.
    pub fn report_status(&self) -> String {
        match self.stage {
            Stage::Validate => format!("skipped:{}", self.source),
            _ => format!("error:{}", self.source),
        }
    }
}
