use teloxide::prelude::*;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::TelegramConfig;

/// Forwards run summaries to a Telegram chat.
pub struct TelegramService {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramService {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.token),
            chat_id: ChatId(config.chat_id),
        }
    }

    pub async fn start(self, mut rx: broadcast::Receiver<String>) {
        info!("Starting Telegram Notification Service");

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    // Delivery failures are logged and the run carries on.
                    match self.bot.send_message(self.chat_id, msg).await {
                        Ok(_) => info!("Telegram notified"),
                        Err(e) => error!("Failed to send Telegram message: {}", e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    error!("Telegram service lagged behind. Missed {} messages.", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Telegram notification channel closed. Stopping service.");
                    break;
                }
            }
        }
    }
}
