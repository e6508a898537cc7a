use std::sync::Arc;

use dotenvy::dotenv;
use tokio::sync::{broadcast, watch};
use tracing::{error, info};

use common::logger;
use engine::SignalPipeline;
use market_data::BridgeClient;

use crate::config::Config;
use crate::services::scheduler_service::SchedulerService;
use crate::services::telegram_service::TelegramService;

mod config;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    info!("System starting up...");

    let config = Arc::new(Config::from_env()?);

    let bridge = BridgeClient::new(config.bridge_url.clone(), config.bridge_token.clone());
    info!("Using broker bridge at {}", config.bridge_url);
    let pipeline = SignalPipeline::new(
        bridge.clone(),
        bridge,
        config.aliases.clone(),
        config.risk,
    );

    let (notify_tx, _) = broadcast::channel::<String>(64);
    match &config.telegram {
        Some(telegram) => {
            let telegram_svc = TelegramService::new(telegram);
            tokio::spawn(telegram_svc.start(notify_tx.subscribe()));
        }
        None => info!("Telegram not configured; summaries go to the run log only"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received; stopping after the current run");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                // Hold the sender so the scheduler keeps running; it can no longer be stopped by signal.
                std::future::pending::<()>().await;
            }
        }
    });

    SchedulerService::new(config, pipeline, notify_tx)
        .start(shutdown_rx)
        .await
}
