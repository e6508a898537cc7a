use common::models::{OrderDecision, PriceLevels, RawSignal, ValidatedSignal};
use tracing::info;

use crate::assembler;
use crate::error::{EngineError, PipelineError, Stage};
use crate::reconciler::{self, Reconciliation};
use crate::risk::{self, DEFAULT_CONFIDENCE, DEFAULT_MAX_DRAWDOWN, RiskSettings};
use crate::symbols::SymbolAliases;
use crate::traits::{Broker, MarketData};
use crate::validator;

/// A reconciled signal with its risk figures, ready to become a broker request.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedOrder {
    pub signal_id: String,
    pub symbol: String,
    pub levels: PriceLevels,
    pub reconciliation: Reconciliation,
    pub confidence: f64,
    pub risk_per_trade: f64,
    pub rr: f64,
    pub lot: f64,
}

/// Turns one raw signal into at most one broker order:
/// validate, resolve symbol, snapshot, reconcile, size, submit.
pub struct SignalPipeline<M, B> {
    market: M,
    broker: B,
    aliases: SymbolAliases,
    risk: RiskSettings,
}

impl<M, B> SignalPipeline<M, B>
where
    M: MarketData,
    B: Broker,
{
    pub fn new(market: M, broker: B, aliases: SymbolAliases, risk: RiskSettings) -> Self {
        Self {
            market,
            broker,
            aliases,
            risk,
        }
    }

    pub async fn process(&self, raw: &RawSignal) -> Result<OrderDecision, PipelineError> {
        let signal = validator::validate(raw).map_err(|e| {
            let id = raw
                .signal_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default();
            PipelineError::new(id, Stage::Validate, e)
        })?;

        if let Some(status) = reconciler::skip_reason(&signal) {
            let risk_per_trade = self.risk.resolve(
                signal.confidence.unwrap_or(0.0),
                signal.risk_per_trade,
                signal.max_drawdown.unwrap_or(DEFAULT_MAX_DRAWDOWN),
            );
            info!(
                "Skipping signal {} ({}) {}",
                signal.signal_id,
                status,
                signal.short_reason.as_deref().unwrap_or("")
            );
            return Ok(assembler::skipped_decision(&signal, status, risk_per_trade));
        }

        let sized = self.size(&signal).await?;

        let request = assembler::build_request(&sized);
        let status = assembler::submit(&self.broker, &request).await;

        Ok(assembler::placed_decision(&sized, status))
    }

    async fn size(&self, signal: &ValidatedSignal) -> Result<SizedOrder, PipelineError> {
        let fail = |stage: Stage| {
            let id = signal.signal_id.clone();
            move |e: EngineError| PipelineError::new(id, stage, e)
        };

        let setup = signal.setup.as_ref().ok_or_else(|| {
            fail(Stage::Validate)(EngineError::Validation(
                "signal carries no trade setup".to_string(),
            ))
        })?;

        let symbol = self
            .aliases
            .resolve(&setup.symbol_base, &self.market)
            .await
            .map_err(fail(Stage::ResolveSymbol))?;

        let snapshot = self
            .market
            .snapshot(&symbol)
            .await
            .map_err(fail(Stage::MarketData))?;

        let confidence = signal
            .confidence
            .map(f64::trunc)
            .unwrap_or(DEFAULT_CONFIDENCE);
        let risk_per_trade = self.risk.resolve(
            confidence,
            signal.risk_per_trade,
            signal.max_drawdown.unwrap_or(DEFAULT_MAX_DRAWDOWN),
        );

        let levels = setup.levels;
        let reconciliation = reconciler::reconcile(signal.order_type, levels.entry, &snapshot)
            .map_err(fail(Stage::Reconcile))?;

        let rr = risk::risk_reward(&levels).map_err(fail(Stage::Risk))?;
        let lot = risk::calculate_lot(levels.entry, levels.sl, risk_per_trade, &snapshot)
            .map_err(fail(Stage::Risk))?;

        info!(
            "{} on {}: confidence={} rr={:.2} risk={:.3}% lot={} balance={:.2}",
            signal.signal_id, symbol, confidence, rr, risk_per_trade, lot, snapshot.account_balance
        );

        Ok(SizedOrder {
            signal_id: signal.signal_id.clone(),
            symbol,
            levels,
            reconciliation,
            confidence,
            risk_per_trade,
            rr,
            lot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockBroker, MockMarketData};
    use common::models::{
        FieldValue, MarketSnapshot, OrderStatus, PendingOrderType, SubmitResult, VolumeLimits,
        order::RETCODE_DONE,
    };

    fn text(v: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(v.to_string()))
    }

    fn num(v: f64) -> Option<FieldValue> {
        Some(FieldValue::Number(v))
    }

    fn gold_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            symbol: "XAUUSDm".to_string(),
            ask: 2005.0,
            bid: 2004.6,
            tick_value: 1.0,
            tick_size: 0.1,
            point_size: 0.01,
            volume: VolumeLimits {
                min: 0.01,
                max: 2.0,
                step: 0.01,
            },
            account_balance: 10_000.0,
        }
    }

    fn buy_stop() -> RawSignal {
        RawSignal {
            signal_id: text("XAUUSD-20240610-1000"),
            entry: num(2000.0),
            sl: num(1990.0),
            tp: num(2030.0),
            pending_order_type: Some("buy_stop".to_string()),
            confidence: text("80%"),
            ..Default::default()
        }
    }

    fn untouched_market() -> MockMarketData {
        let mut market = MockMarketData::new();
        market.expect_symbols().times(0);
        market.expect_snapshot().times(0);
        market
    }

    fn untouched_broker() -> MockBroker {
        let mut broker = MockBroker::new();
        broker.expect_submit().times(0);
        broker.expect_last_error().times(0);
        broker
    }

    #[tokio::test]
    async fn test_full_cycle_flips_and_submits() {
        let mut market = MockMarketData::new();
        market.expect_symbols().times(0);
        market
            .expect_snapshot()
            .withf(|symbol| symbol.to_string() == "XAUUSDm")
            .times(1)
            .returning(|_| Ok(gold_snapshot()));

        let mut broker = MockBroker::new();
        broker
            .expect_submit()
            .withf(|order| order.price == 2000.0 && order.volume == 1.0)
            .times(1)
            .returning(|_| {
                Some(SubmitResult {
                    retcode: RETCODE_DONE,
                    comment: "done".to_string(),
                    order: Some(1),
                })
            });

        let pipeline = SignalPipeline::new(
            market,
            broker,
            SymbolAliases::builtin(),
            RiskSettings {
                risk_per_trade: Some(1.0),
                max_risk_per_trade: None,
            },
        );

        let decision = pipeline.process(&buy_stop()).await.unwrap();
        assert_eq!(decision.status, OrderStatus::Success);
        assert_eq!(decision.resolved_order_type, PendingOrderType::BuyLimit);
        assert_eq!(decision.entry, Some(2000.0));
        assert_eq!(decision.rr, Some(3.0));
        assert_eq!(
            decision.reported_status(),
            "success adjust:buy_stop->buy_limit"
        );
    }

    #[tokio::test]
    async fn test_skip_never_touches_broker() {
        let pipeline = SignalPipeline::new(
            untouched_market(),
            untouched_broker(),
            SymbolAliases::builtin(),
            RiskSettings::default(),
        );
        let raw = RawSignal {
            signal_id: text("xauusd-test"),
            pending_order_type: Some("skip".to_string()),
            risk_per_trade: num(0.75),
            ..Default::default()
        };

        let decision = pipeline.process(&raw).await.unwrap();
        assert_eq!(decision.status, OrderStatus::Skipped);
        assert_eq!(decision.risk_per_trade, Some(0.75));
        assert!(decision.lot.is_none());
    }

    #[tokio::test]
    async fn test_zero_confidence_resolves_risk_without_market() {
        let pipeline = SignalPipeline::new(
            untouched_market(),
            untouched_broker(),
            SymbolAliases::builtin(),
            RiskSettings::default(),
        );
        let mut raw = buy_stop();
        raw.confidence = text("0%");
        raw.max_drawdown = num(20.0);

        let decision = pipeline.process(&raw).await.unwrap();
        assert_eq!(decision.status, OrderStatus::ConfidenceZero);
        assert_eq!(decision.risk_per_trade, Some(2.0));
    }

    #[tokio::test]
    async fn test_confidence_scales_ceiling() {
        let mut market = MockMarketData::new();
        market
            .expect_snapshot()
            .returning(|_| Ok(gold_snapshot()));
        let mut broker = MockBroker::new();
        broker.expect_submit().returning(|_| {
            Some(SubmitResult {
                retcode: RETCODE_DONE,
                comment: String::new(),
                order: None,
            })
        });

        let pipeline = SignalPipeline::new(
            market,
            broker,
            SymbolAliases::builtin(),
            RiskSettings {
                risk_per_trade: None,
                max_risk_per_trade: Some(2.0),
            },
        );

        let decision = pipeline.process(&buy_stop()).await.unwrap();
        let risk = decision.risk_per_trade.unwrap();
        assert!((risk - 1.6).abs() < 1e-12);
        assert_eq!(decision.lot, Some(1.6));
    }

    #[tokio::test]
    async fn test_non_finite_confidence_uses_default() {
        for token in ["nan", "inf"] {
            let mut market = MockMarketData::new();
            market
                .expect_snapshot()
                .returning(|_| Ok(gold_snapshot()));
            let mut broker = MockBroker::new();
            broker
                .expect_submit()
                .withf(|order| order.volume == 1.4)
                .times(1)
                .returning(|_| {
                    Some(SubmitResult {
                        retcode: RETCODE_DONE,
                        comment: String::new(),
                        order: None,
                    })
                });

            let pipeline = SignalPipeline::new(
                market,
                broker,
                SymbolAliases::builtin(),
                RiskSettings {
                    risk_per_trade: None,
                    max_risk_per_trade: Some(2.0),
                },
            );
            let mut raw = buy_stop();
            raw.pending_order_type = Some("buy_limit".to_string());
            raw.confidence = text(token);

            let decision = pipeline.process(&raw).await.unwrap();
            let risk = decision.risk_per_trade.unwrap();
            assert!((risk - 1.4).abs() < 1e-12, "{} gave risk {}", token, risk);
            assert_eq!(decision.confidence, Some(70.0));
            assert_eq!(decision.lot, Some(1.4));
        }
    }

    #[tokio::test]
    async fn test_degenerate_stop_aborts_before_submit() {
        let mut market = MockMarketData::new();
        market
            .expect_snapshot()
            .returning(|_| Ok(gold_snapshot()));

        let pipeline = SignalPipeline::new(
            market,
            untouched_broker(),
            SymbolAliases::builtin(),
            RiskSettings::default(),
        );
        let mut raw = buy_stop();
        raw.sl = num(2000.0);

        let err = pipeline.process(&raw).await.unwrap_err();
        assert_eq!(err.stage, Stage::Risk);
        assert_eq!(err.signal_id, "XAUUSD-20240610-1000");
        assert_eq!(err.source, EngineError::DegenerateStop(2000.0));
    }

    #[tokio::test]
    async fn test_unknown_symbol_aborts() {
        let mut market = MockMarketData::new();
        market
            .expect_symbols()
            .returning(|| Ok(vec!["XAUUSDm".to_string()]));
        market.expect_snapshot().times(0);

        let pipeline = SignalPipeline::new(
            market,
            untouched_broker(),
            SymbolAliases::new(),
            RiskSettings::default(),
        );
        let mut raw = buy_stop();
        raw.signal_id = text("BTCUSD-1");

        let err = pipeline.process(&raw).await.unwrap_err();
        assert_eq!(err.stage, Stage::ResolveSymbol);
        assert_eq!(err.source, EngineError::SymbolNotFound("BTCUSD".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_signal_reports_validation_stage() {
        let pipeline = SignalPipeline::new(
            untouched_market(),
            untouched_broker(),
            SymbolAliases::builtin(),
            RiskSettings::default(),
        );
        let mut raw = buy_stop();
        raw.pending_order_type = Some("market".to_string());

        let err = pipeline.process(&raw).await.unwrap_err();
        assert_eq!(err.stage, Stage::Validate);
        assert!(err.report_status().starts_with("skipped:"));
    }
}
