//! Telegram push notifications for trade events

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::chain::traits::Notifier;
use crate::common::errors::{Result, TraderError};
use crate::config::types::TelegramConfig;

/// Sends trade notifications to a Telegram chat
///
/// Delivery is strictly fire-and-forget: any API or transport failure is
/// logged and swallowed so the trading loop can never stall on Telegram.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    explorer_tx_url: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        Self::with_api_base(config, "https://api.telegram.org")
    }

    /// Override the API base URL (used by tests against a mock server)
    pub fn with_api_base(config: &TelegramConfig, api_base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TraderError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            explorer_tx_url: config.explorer_tx_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send_message(&self, text: &str, tx_hash: Option<&str>) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let mut payload = json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        if let Some(tx_hash) = tx_hash {
            payload["reply_markup"] = json!({
                "inline_keyboard": [[{
                    "text": "View transaction",
                    "url": format!("{}/{}", self.explorer_tx_url, tx_hash),
                }]],
            });
        }

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(TraderError::InvalidResponse(format!(
                "Telegram API returned status: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if body.get("ok").and_then(|v| v.as_bool()) == Some(false) {
            let description = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(TraderError::InvalidResponse(format!(
                "Telegram API error: {}",
                description
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str, tx_hash: Option<&str>) {
        match self.send_message(text, tx_hash).await {
            Ok(()) => debug!("Telegram notification delivered"),
            Err(e) => warn!("Telegram notification failed: {}", e),
        }
    }
}
