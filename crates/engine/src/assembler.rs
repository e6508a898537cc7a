use common::models::order::{DEFAULT_DEVIATION, DEFAULT_MAGIC};
use common::models::{
    FillingMode, OrderDecision, OrderRequest, OrderStatus, PriceLevels, SubmitResult,
    TimeInForce, TradeAction, ValidatedSignal,
};
use tracing::{error, info};

use crate::pipeline::SizedOrder;
use crate::traits::Broker;

pub fn build_request(order: &SizedOrder) -> OrderRequest {
    OrderRequest {
        action: TradeAction::Pending,
        symbol: order.symbol.clone(),
        volume: order.lot,
        order_type: order.reconciliation.broker_order_type,
        price: order.levels.entry,
        sl: order.levels.sl,
        tp: order.levels.tp,
        deviation: DEFAULT_DEVIATION,
        magic: DEFAULT_MAGIC,
        comment: order.signal_id.clone(),
        type_time: TimeInForce::Gtc,
        type_filling: FillingMode::Return,
    }
}

/// Sends exactly one request. Failures are folded into the returned status.
pub async fn submit<B>(broker: &B, request: &OrderRequest) -> OrderStatus
where
    B: Broker + ?Sized,
{
    info!(
        "Sending {:?} {} lot={} entry={} sl={} tp={} ({})",
        request.order_type, request.symbol, request.volume, request.price, request.sl, request.tp,
        request.comment
    );

    let result = broker.submit(request).await;
    let status = match result {
        Some(result) => interpret(result),
        None => {
            let (code, message) = broker.last_error().await;
            error!("Broker returned no result [{}]: {}", code, message);
            OrderStatus::Error(message)
        }
    };

    if status == OrderStatus::Success {
        info!("Order sent successfully for {}", request.symbol);
    }
    status
}

fn interpret(result: SubmitResult) -> OrderStatus {
    if result.is_done() {
        OrderStatus::Success
    } else {
        error!("Order failed [{}]: {}", result.retcode, result.comment);
        OrderStatus::Error(result.comment)
    }
}

pub fn placed_decision(order: &SizedOrder, status: OrderStatus) -> OrderDecision {
    OrderDecision {
        signal_id: order.signal_id.clone(),
        symbol: Some(order.symbol.clone()),
        lot: Some(order.lot),
        rr: Some(order.rr),
        risk_per_trade: Some(order.risk_per_trade),
        confidence: Some(order.confidence),
        resolved_order_type: order.reconciliation.order_type,
        entry: Some(order.levels.entry),
        sl: Some(order.levels.sl),
        tp: Some(order.levels.tp),
        status,
        adjust_note: order.reconciliation.adjust_note.clone(),
    }
}

pub fn skipped_decision(
    signal: &ValidatedSignal,
    status: OrderStatus,
    risk_per_trade: f64,
) -> OrderDecision {
    let levels: Option<PriceLevels> = signal.setup.as_ref().map(|s| s.levels);
    OrderDecision {
        signal_id: signal.signal_id.clone(),
        symbol: None,
        lot: None,
        rr: None,
        risk_per_trade: Some(risk_per_trade),
        confidence: signal.confidence,
        resolved_order_type: signal.order_type,
        entry: levels.map(|l| l.entry),
        sl: levels.map(|l| l.sl),
        tp: levels.map(|l| l.tp),
        status,
        adjust_note: None,
    }
}
