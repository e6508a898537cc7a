use common::models::{
    FieldValue, PendingOrderType, PriceLevels, RawSignal, TradeSetup, ValidatedSignal,
};

use crate::error::EngineError;

/// Normalizes a raw signal. Prices are only required when the signal asks for
/// an order; a `skip` signal validates with nothing but its order type.
pub fn validate(raw: &RawSignal) -> Result<ValidatedSignal, EngineError> {
    let signal_id = raw
        .signal_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let order_type = match raw.pending_order_type.as_deref() {
        Some(token) => token
            .parse::<PendingOrderType>()
            .map_err(|e| EngineError::Validation(e.to_string()))?,
        None => {
            return Err(EngineError::Validation(
                "missing 'pending_order_type'".to_string(),
            ));
        }
    };

    let setup = match order_type {
        PendingOrderType::Skip => None,
        _ => Some(TradeSetup {
            symbol_base: extract_symbol_base(&signal_id)?,
            levels: PriceLevels {
                entry: required_price(raw.entry.as_ref(), "entry")?,
                sl: required_price(raw.sl.as_ref(), "sl")?,
                tp: required_price(raw.tp.as_ref(), "tp")?,
            },
        }),
    };

    Ok(ValidatedSignal {
        signal_id,
        order_type,
        confidence: raw.confidence.as_ref().and_then(FieldValue::as_percent),
        max_drawdown: raw.max_drawdown.as_ref().and_then(FieldValue::as_f64),
        risk_per_trade: raw.risk_per_trade.as_ref().and_then(FieldValue::as_f64),
        short_reason: raw.short_reason.clone(),
        setup,
    })
}

/// Leading run of ASCII letters in `signal_id`, upper-cased (`xauusd-0612` -> `XAUUSD`).
pub fn extract_symbol_base(signal_id: &str) -> Result<String, EngineError> {
    let base: String = signal_id
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    if base.is_empty() {
        return Err(EngineError::SymbolExtraction(signal_id.to_string()));
    }
    Ok(base.to_ascii_uppercase())
}

fn required_price(value: Option<&FieldValue>, field: &str) -> Result<f64, EngineError> {
    let value = value.ok_or_else(|| EngineError::Validation(format!("missing '{}'", field)))?;

    match value.as_f64() {
        Some(price) if price.is_finite() => Ok(price),
        _ => Err(EngineError::Validation(format!(
            "'{}' is not a number: {}",
            field, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Option<FieldValue> {
        Some(FieldValue::Number(v))
    }

    fn text(v: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(v.to_string()))
    }

    fn buy_stop_signal() -> RawSignal {
        RawSignal {
            signal_id: text("XAUUSD-20240610-1000"),
            entry: num(2000.0),
            sl: num(1990.0),
            tp: num(2030.0),
            pending_order_type: Some("Buy Stop".to_string()),
            confidence: text("80%"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_signal() {
        let signal = validate(&buy_stop_signal()).unwrap();

        assert_eq!(signal.order_type, PendingOrderType::BuyStop);
        assert_eq!(signal.confidence, Some(80.0));
        let setup = signal.setup.unwrap();
        assert_eq!(setup.symbol_base, "XAUUSD");
        assert_eq!(setup.levels.tp, 2030.0);
    }

    #[test]
    fn test_unknown_order_type_is_rejected() {
        let mut raw = buy_stop_signal();
        raw.pending_order_type = Some("market".to_string());
        assert!(matches!(validate(&raw), Err(EngineError::Validation(_))));

        raw.pending_order_type = None;
        assert!(matches!(validate(&raw), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_missing_tp_is_rejected_unless_skip() {
        let mut raw = buy_stop_signal();
        raw.tp = None;
        assert_eq!(
            validate(&raw),
            Err(EngineError::Validation("missing 'tp'".to_string()))
        );

        raw.pending_order_type = Some("skip".to_string());
        let signal = validate(&raw).unwrap();
        assert!(signal.setup.is_none());
    }

    #[test]
    fn test_non_numeric_price_is_rejected() {
        let mut raw = buy_stop_signal();
        raw.sl = text("n/a");
        assert!(matches!(validate(&raw), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_unparseable_confidence_is_left_empty() {
        let mut raw = buy_stop_signal();
        raw.confidence = text("high");
        assert_eq!(validate(&raw).unwrap().confidence, None);
    }

    #[test]
    fn test_symbol_extraction() {
        assert_eq!(extract_symbol_base("xauusd-test").unwrap(), "XAUUSD");
        assert_eq!(extract_symbol_base("EURUSD2024").unwrap(), "EURUSD");
        assert_eq!(
            extract_symbol_base("123"),
            Err(EngineError::SymbolExtraction("123".to_string()))
        );
    }

    #[test]
    fn test_skip_with_numeric_id_needs_no_symbol() {
        let raw = RawSignal {
            signal_id: num(123.0),
            pending_order_type: Some("skip".to_string()),
            ..Default::default()
        };
        let signal = validate(&raw).unwrap();
        assert_eq!(signal.signal_id, "123");
        assert_eq!(signal.order_type, PendingOrderType::Skip);
    }

    #[test]
    fn test_non_skip_without_letters_fails_extraction() {
        let mut raw = buy_stop_signal();
        raw.signal_id = num(42.0);
        assert!(matches!(
            validate(&raw),
            Err(EngineError::SymbolExtraction(_))
        ));
    }
}
