use chrono::NaiveDateTime;
use common::models::{FieldValue, OrderDecision, RawSignal};

fn order_type_emoji(order_type: &str) -> &'static str {
    match order_type.trim().to_lowercase().as_str() {
        "buy_limit" => "🟢⬇️",
        "sell_limit" => "🔴⬆️",
        "buy_stop" => "🟢⬆️",
        "sell_stop" => "🔴⬇️",
        _ => "",
    }
}

fn show(value: &Option<FieldValue>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

/// Notification text for one run. `detail` is the step/outcome line,
/// `status` the overall workflow status.
pub fn format_summary(
    detail: &str,
    status: &str,
    signal: Option<&RawSignal>,
    decision: Option<&OrderDecision>,
    account: Option<&str>,
    timestamp: NaiveDateTime,
) -> String {
    let status_icon = if status == "success" { "✅" } else { "⚠️" };

    let mut parts = vec![format!("📅 {}", timestamp.format("%Y-%m-%dT%H:%M:%S"))];
    if let Some(account) = account {
        parts.push(format!("🏦 account:{}", account));
    }
    parts.push(format!("{} {} ({})", status_icon, detail, status));

    let Some(signal) = signal else {
        return parts.join("\n");
    };

    let order_type = signal.pending_order_type.as_deref().unwrap_or("n/a");
    parts.push(
        [
            format!("📌 signal_id:{}", show(&signal.signal_id)),
            format!("💰 entry:{}", show(&signal.entry)),
            format!("🛑 sl:{}", show(&signal.sl)),
            format!("🎯 tp:{}", show(&signal.tp)),
            format!("{} pending_order_type:{}", order_type_emoji(order_type), order_type),
            format!("⭐ confidence:{}", show(&signal.confidence)),
        ]
        .join("\n"),
    );

    let risk_per_trade = decision
        .and_then(|d| d.risk_per_trade)
        .or_else(|| signal.risk_per_trade.as_ref().and_then(FieldValue::as_percent));

    let mut extra = Vec::new();
    if let Some(risk) = risk_per_trade {
        extra.push(format!("⚖ risk_per_trade:{:.3}%", risk));
    }
    if let Some(lot) = decision.and_then(|d| d.lot) {
        extra.push(format!("💵 lot:{}", lot));
    }
    if let Some(rr) = decision.and_then(|d| d.rr) {
        extra.push(format!("📈 rr:{:.2}", rr));
    }
    if let Some(regime) = &signal.regime_type {
        extra.push(format!("📊 regime_type: {}", regime));
    }
    if !extra.is_empty() {
        parts.push(String::new());
        parts.push(extra.join("\n"));
    }

    if let Some(reason) = &signal.short_reason {
        parts.push(String::new());
        parts.push(format!("📝 short_reason:{}", reason));
    }
    if let Some(decision) = decision {
        parts.push(String::new());
        parts.push(format!("🚩 order:{}", decision.reported_status()));
    }

    parts.join("\n")
}
