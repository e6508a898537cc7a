use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use common::models::{OrderDecision, RawSignal};
use engine::{Broker, MarketData, SignalPipeline};
use scheduler::{format_countdown, next_window_run, within_window};
use storage::{append_run_log, load_latest_signal};
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::services::summary::format_summary;
use crate::services::workflow::run_workflow;

/// Longest single sleep while waiting; the countdown is logged once per tick.
const COUNTDOWN_TICK: Duration = Duration::from_secs(60);

pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Drives the live-trading cycle on the configured weekly schedule.
pub struct SchedulerService<M, B> {
    config: Arc<Config>,
    pipeline: SignalPipeline<M, B>,
    notify_tx: broadcast::Sender<String>,
    clock: Clock,
}

impl<M, B> SchedulerService<M, B>
where
    M: MarketData,
    B: Broker,
{
    pub fn new(
        config: Arc<Config>,
        pipeline: SignalPipeline<M, B>,
        notify_tx: broadcast::Sender<String>,
    ) -> Self {
        Self {
            config,
            pipeline,
            notify_tx,
            clock: Arc::new(Local::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Local> {
        (self.clock)()
    }

    /// Runs until `shutdown` flips. Shutdown is only observed between cycles.
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let window = self.config.window;
        info!("Scheduler active: {}", window);

        let mut candidate = self.now() + TimeDelta::minutes(self.config.start_in_minutes);
        if self.config.run_on_start {
            info!("Running start-up workflow");
            self.run_cycle().await;
        }

        loop {
            let next_run = next_window_run(&candidate, &window)?;
            info!("Next run scheduled at {}", next_run.format("%Y-%m-%d %H:%M:%S %:z"));

            loop {
                let remaining = next_run - self.now();
                if remaining <= TimeDelta::zero() {
                    break;
                }
                debug!("Next run in {}", format_countdown(remaining));

                let tick = remaining.to_std().unwrap_or_default().min(COUNTDOWN_TICK);
                tokio::select! {
                    _ = sleep(tick) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Shutdown requested. Stopping scheduler.");
                            return Ok(());
                        }
                    }
                }
            }

            self.fire().await;
            candidate = following_candidate(&next_run, window.interval_minutes(), &self.now());
        }
    }

    /// Runs a cycle only when the clock is inside the window at fire time.
    async fn fire(&self) -> bool {
        if !within_window(&self.now(), &self.config.window) {
            info!("Outside active window; skipping run");
            return false;
        }
        self.run_cycle().await;
        true
    }

    /// One workflow run: external steps, newest signal through the pipeline,
    /// then run log and notification.
    async fn run_cycle(&self) {
        info!("Starting scheduled workflow run");
        let report = run_workflow(&self.config.workflow).await;
        let status = if report.has_error() { "error" } else { "success" };

        let mut signal: Option<RawSignal> = None;
        let mut decision: Option<OrderDecision> = None;
        let mut order_status: Option<String> = None;

        if report.signal_ready() {
            match load_latest_signal(&self.config.signals_dir).await {
                Ok((path, raw)) => {
                    match self.pipeline.process(&raw).await {
                        Ok(outcome) => {
                            order_status = Some(outcome.reported_status());
                            decision = Some(outcome);
                        }
                        Err(e) => {
                            warn!("Signal from {} not placed: {}", path.display(), e);
                            order_status = Some(e.report_status());
                        }
                    }
                    signal = Some(raw);
                }
                Err(e) => warn!("Failed to load signal data: {}", e),
            }
        }

        let detail = run_detail(&report.detail(), order_status.as_deref());
        let message = format_summary(
            &detail,
            status,
            signal.as_ref(),
            decision.as_ref(),
            self.config.account_name.as_deref(),
            self.now().naive_local(),
        );

        if let Err(e) = append_run_log(&self.config.run_log, &message).await {
            warn!("Failed to update run log: {}", e);
        }
        if self.notify_tx.send(message).is_err() {
            debug!("No notifier subscribed; summary kept in run log only");
        }
        info!("Workflow run finished: {}", detail);
    }
}

fn run_detail(steps: &str, order_status: Option<&str>) -> String {
    match order_status {
        Some(order) => format!("{} order:{}", steps, order),
        None => steps.to_string(),
    }
}

/// Previous run plus one interval, or `now` when that is already behind us.
fn following_candidate<Tz: TimeZone>(
    previous: &DateTime<Tz>,
    interval_minutes: u32,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    let next = previous.clone() + TimeDelta::minutes(interval_minutes as i64);
    if next < *now { now.clone() } else { next }
}
