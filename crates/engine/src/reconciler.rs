use common::models::{
    BrokerOrderType, MarketSnapshot, OrderStatus, PendingOrderType, ValidatedSignal,
};
use tracing::info;

use crate::error::EngineError;

/// Order type after checking the intended level against the live quote.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub order_type: PendingOrderType,
    pub broker_order_type: BrokerOrderType,
    /// `adjust:<old>-><new>` when the type was flipped.
    pub adjust_note: Option<String>,
}

/// Why a signal short-circuits before any market lookup, if it does.
pub fn skip_reason(signal: &ValidatedSignal) -> Option<OrderStatus> {
    if signal.order_type == PendingOrderType::Skip {
        return Some(OrderStatus::Skipped);
    }
    if signal.confidence == Some(0.0) {
        return Some(OrderStatus::ConfidenceZero);
    }
    None
}

/// Flips a pending order whose trigger level the market has already crossed.
/// Buy orders compare against the ask, sell orders against the bid.
pub fn flip_order_type(order_type: PendingOrderType, entry: f64, ask: f64, bid: f64) -> PendingOrderType {
    use PendingOrderType::*;

    match order_type {
        BuyStop if entry <= ask => BuyLimit,
        BuyLimit if entry >= ask => BuyStop,
        SellStop if entry >= bid => SellLimit,
        SellLimit if entry <= bid => SellStop,
        other => other,
    }
}

pub fn to_broker_order_type(order_type: PendingOrderType) -> Result<BrokerOrderType, EngineError> {
    match order_type {
        PendingOrderType::BuyLimit => Ok(BrokerOrderType::BuyLimit),
        PendingOrderType::SellLimit => Ok(BrokerOrderType::SellLimit),
        PendingOrderType::BuyStop => Ok(BrokerOrderType::BuyStop),
        PendingOrderType::SellStop => Ok(BrokerOrderType::SellStop),
        PendingOrderType::Skip => Err(EngineError::InvalidOrderType(order_type.to_string())),
    }
}

/// The entry price is never touched, only the order-type label.
pub fn reconcile(
    order_type: PendingOrderType,
    entry: f64,
    snapshot: &MarketSnapshot,
) -> Result<Reconciliation, EngineError> {
    let resolved = flip_order_type(order_type, entry, snapshot.ask, snapshot.bid);

    let adjust_note = if resolved != order_type {
        info!(
            "Adjusting order type from {} to {} (entry={}, ask={}, bid={})",
            order_type, resolved, entry, snapshot.ask, snapshot.bid
        );
        Some(format!("adjust:{}->{}", order_type, resolved))
    } else {
        None
    };

    Ok(Reconciliation {
        order_type: resolved,
        broker_order_type: to_broker_order_type(resolved)?,
        adjust_note,
    })
}
