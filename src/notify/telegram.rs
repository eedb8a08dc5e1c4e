use super::{format_message, Notifier};
use crate::error::DeliveryError;
use crate::models::Listing;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.telegram.org";

/// Sends listing alerts through the Telegram Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            api_base: API_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, listing: &Listing, target: &str) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: target,
            text: format_message(listing),
            parse_mode: "HTML",
        };

        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            // error bodies are JSON from Telegram itself, anything else from a proxy
            let text = rsp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiResponse>(&text)
                .ok()
                .and_then(|body| body.description)
                .unwrap_or(text);
            return Err(DeliveryError::Rejected(format!(
                "Telegram returned {status}: {detail}"
            )));
        }

        let body: ApiResponse = rsp.json().await?;
        if !body.ok {
            return Err(DeliveryError::Rejected(format!(
                "Telegram answered {status} with ok=false: {}",
                body.description.unwrap_or_default()
            )));
        }

        debug!(url = %listing.url, "Telegram message sent");
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}
