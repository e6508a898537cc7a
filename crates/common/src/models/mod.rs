pub mod market;
pub mod order;
pub mod signal;

pub use market::{MarketSnapshot, VolumeLimits};
pub use order::{
    BrokerOrderType, FillingMode, OrderDecision, OrderRequest, OrderStatus, SubmitResult,
    TimeInForce, TradeAction,
};
pub use signal::{
    FieldValue, PendingOrderType, PriceLevels, RawSignal, RegimeType, TradeSetup, UnknownOrderType,
    ValidatedSignal,
};
