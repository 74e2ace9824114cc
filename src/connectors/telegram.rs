// src/connectors/telegram.rs
use crate::connectors::messages::{BotApiReply, SendMessage};
use crate::connectors::traits::Notifier;
use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::Client;
use std::env;
use tracing::info;

const TITLE: &str = "⚡ [PAPER TRADER]";

pub struct TelegramNotifier {
    http_client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            http_client: Client::new(),
            token,
            chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: format!("{}\n{}", TITLE, message),
            parse_mode: "Markdown",
        };

        let reply = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .json::<BotApiReply>()
            .await?;

        if !reply.ok {
            return Err(NotifyError::Rejected(
                reply.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}

/// Used when no credentials are configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Telegram when `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID` are both set, otherwise a no-op.
pub fn notifier_from_env() -> Box<dyn Notifier> {
    let token = env::var("TELEGRAM_TOKEN").unwrap_or_default();
    let chat_id = env::var("TELEGRAM_CHAT_ID").unwrap_or_default();

    if token.is_empty() || chat_id.is_empty() {
        info!("Telegram credentials missing, notifications disabled");
        return Box::new(NoopNotifier);
    }
    Box::new(TelegramNotifier::new(token, chat_id))
}
