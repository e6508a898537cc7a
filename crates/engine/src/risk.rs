//! Risk/reward, risk-per-trade resolution and broker-aligned lot sizing.

use common::models::{MarketSnapshot, PriceLevels, VolumeLimits};

use crate::error::EngineError;

pub const DEFAULT_MAX_DRAWDOWN: f64 = 15.0;
pub const DEFAULT_CONFIDENCE: f64 = 70.0;
/// Used when the broker reports no tick size.
pub const FALLBACK_PIP_VALUE: f64 = 10.0;

/// Caller-level risk configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskSettings {
    /// Explicit risk-per-trade percentage. Takes precedence over everything else.
    pub risk_per_trade: Option<f64>,
    /// Ceiling that is scaled by signal confidence.
    pub max_risk_per_trade: Option<f64>,
}

impl RiskSettings {
    /// Resolves the risk-per-trade percentage. First applicable rule wins:
    /// explicit override, confidence-scaled ceiling, the signal's own value,
    /// then `max_drawdown / 10`.
    pub fn resolve(&self, confidence: f64, signal_risk: Option<f64>, max_drawdown: f64) -> f64 {
        if let Some(risk) = self.risk_per_trade {
            return risk;
        }
        if let Some(cap) = self.max_risk_per_trade {
            return cap.min(confidence / 100.0 * cap);
        }
        signal_risk.unwrap_or(max_drawdown / 10.0)
    }
}

pub fn risk_reward(levels: &PriceLevels) -> Result<f64, EngineError> {
    let risk = (levels.entry - levels.sl).abs();
    if risk == 0.0 {
        return Err(EngineError::DegenerateStop(levels.entry));
    }
    Ok((levels.tp - levels.entry).abs() / risk)
}

/// Lot size that loses `risk_per_trade` percent of the balance if the stop is hit,
/// clamped to the broker's volume range and then quantized to its step.
pub fn calculate_lot(
    entry: f64,
    sl: f64,
    risk_per_trade: f64,
    snapshot: &MarketSnapshot,
) -> Result<f64, EngineError> {
    if !(risk_per_trade > 0.0) {
        return Err(EngineError::InvalidRisk(format!(
            "risk_per_trade must be positive, got {}",
            risk_per_trade
        )));
    }

    let sl_distance = (entry - sl).abs();
    if sl_distance == 0.0 {
        return Err(EngineError::InvalidRisk(
            "stop loss must not equal entry".to_string(),
        ));
    }

    let pip_value = if snapshot.tick_size > 0.0 {
        snapshot.tick_value / snapshot.tick_size
    } else {
        FALLBACK_PIP_VALUE
    };
    let risk_amount = snapshot.account_balance * (risk_per_trade / 100.0);
    let raw_lot = risk_amount / (sl_distance * pip_value);

    if !raw_lot.is_finite() {
        return Err(EngineError::InvalidRisk(format!(
            "lot size is not finite (pip value {})",
            pip_value
        )));
    }

    let lot = align_to_broker(raw_lot, &snapshot.volume);
    if lot <= 0.0 {
        return Err(EngineError::InvalidRisk(format!(
            "lot {} rounds to zero for volume step {}",
            raw_lot, snapshot.volume.step
        )));
    }
    Ok(lot)
}

/// Clamp first, then quantize. The order matters: quantizing a clamped value
/// can land up to one step away from clamping a quantized one.
fn align_to_broker(lot: f64, volume: &VolumeLimits) -> f64 {
    let clamped = lot.min(volume.max).max(volume.min);
    let quantized = if volume.step > 0.0 {
        (clamped / volume.step).round_ties_even() * volume.step
    } else {
        clamped
    };
    (quantized * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(balance: f64, tick_value: f64, tick_size: f64, volume: VolumeLimits) -> MarketSnapshot {
        MarketSnapshot {
            symbol: "XAUUSDm".to_string(),
            ask: 2000.0,
            bid: 1999.8,
            tick_value,
            tick_size,
            point_size: 0.01,
            volume,
            account_balance: balance,
        }
    }

    fn gold() -> MarketSnapshot {
        snapshot(
            10_000.0,
            1.0,
            0.1,
            VolumeLimits {
                min: 0.01,
                max: 2.0,
                step: 0.01,
            },
        )
    }

    #[test]
    fn test_calculate_lot_basic() {
        assert_eq!(calculate_lot(2000.0, 1990.0, 1.0, &gold()).unwrap(), 1.0);
    }

    #[test]
    fn test_calculate_lot_zero_sl_distance() {
        assert!(matches!(
            calculate_lot(2000.0, 2000.0, 1.0, &gold()),
            Err(EngineError::InvalidRisk(_))
        ));
    }

    #[test]
    fn test_calculate_lot_rejects_non_positive_risk() {
        assert!(matches!(
            calculate_lot(2000.0, 1990.0, 0.0, &gold()),
            Err(EngineError::InvalidRisk(_))
        ));
        assert!(matches!(
            calculate_lot(2000.0, 1990.0, -1.0, &gold()),
            Err(EngineError::InvalidRisk(_))
        ));
    }

    #[test]
    fn test_calculate_lot_clamps_to_volume_range() {
        // raw lot would be 5.0
        assert_eq!(calculate_lot(2000.0, 1990.0, 5.0, &gold()).unwrap(), 2.0);
        // raw lot would be 0.005
        assert_eq!(calculate_lot(2000.0, 0.0, 1.0, &gold()).unwrap(), 0.01);
    }

    #[test]
    fn test_calculate_lot_quantizes_to_step() {
        let snap = snapshot(
            10_000.0,
            1.0,
            0.1,
            VolumeLimits {
                min: 0.1,
                max: 10.0,
                step: 0.1,
            },
        );
        // raw lot 100 / (7 * 10) = 1.428..
        assert_eq!(calculate_lot(2000.0, 1993.0, 1.0, &snap).unwrap(), 1.4);
    }

    #[test]
    fn test_clamp_happens_before_quantization() {
        let volume = VolumeLimits {
            min: 0.06,
            max: 1.0,
            step: 0.1,
        };
        // Quantizing first would give 0.0 and clamp back up to 0.06.
        assert_eq!(align_to_broker(0.01, &volume), 0.1);
    }

    #[test]
    fn test_missing_tick_size_uses_fallback_pip_value() {
        let snap = snapshot(10_000.0, 1.0, 0.0, VolumeLimits::default());
        // 100 / (10 * 10)
        assert_eq!(calculate_lot(2000.0, 1990.0, 1.0, &snap).unwrap(), 1.0);
    }

    #[test]
    fn test_lot_rounding_to_zero_is_rejected() {
        let snap = snapshot(
            100.0,
            1.0,
            0.1,
            VolumeLimits {
                min: 0.0,
                max: 100.0,
                step: 0.01,
            },
        );
        assert!(matches!(
            calculate_lot(2000.0, 1990.0, 0.01, &snap),
            Err(EngineError::InvalidRisk(_))
        ));
    }

    #[test]
    fn test_lot_is_monotonic() {
        let snap = snapshot(50_000.0, 1.0, 0.1, VolumeLimits::default());
        let mut last = 0.0;
        for risk in [0.25, 0.5, 1.0, 1.5, 2.0, 3.0] {
            let lot = calculate_lot(2000.0, 1990.0, risk, &snap).unwrap();
            assert!(lot >= last, "lot decreased at risk {}", risk);
            last = lot;
        }

        let mut last = f64::MAX;
        for distance in [1.0, 2.5, 5.0, 10.0, 40.0] {
            let lot = calculate_lot(2000.0, 2000.0 - distance, 1.0, &snap).unwrap();
            assert!(lot <= last, "lot increased at distance {}", distance);
            last = lot;
        }
    }

    #[test]
    fn test_risk_reward() {
        let levels = PriceLevels {
            entry: 2000.0,
            sl: 1990.0,
            tp: 2030.0,
        };
        assert_eq!(risk_reward(&levels).unwrap(), 3.0);

        let flat = PriceLevels { tp: 2000.0, ..levels };
        assert_eq!(risk_reward(&flat).unwrap(), 0.0);

        let degenerate = PriceLevels { sl: 2000.0, ..levels };
        assert_eq!(
            risk_reward(&degenerate),
            Err(EngineError::DegenerateStop(2000.0))
        );
    }

    #[test]
    fn test_confidence_scaled_risk() {
        let settings = RiskSettings {
            risk_per_trade: None,
            max_risk_per_trade: Some(2.0),
        };
        assert!((settings.resolve(80.0, None, 15.0) - 1.6).abs() < 1e-12);
        assert_eq!(settings.resolve(150.0, None, 15.0), 2.0);
        assert_eq!(settings.resolve(0.0, Some(1.0), 15.0), 0.0);
    }

    #[test]
    fn test_risk_resolution_precedence() {
        let explicit = RiskSettings {
            risk_per_trade: Some(0.5),
            max_risk_per_trade: Some(2.0),
        };
        assert_eq!(explicit.resolve(80.0, Some(1.2), 15.0), 0.5);

        let none = RiskSettings::default();
        assert_eq!(none.resolve(80.0, Some(1.2), 15.0), 1.2);
        assert_eq!(none.resolve(80.0, None, 20.0), 2.0);
    }
}
