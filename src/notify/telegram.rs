use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;
use crate::config::TelegramConfig;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
    timeout: Duration,
    max_retries: u8,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    result: Option<SentMessage>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            base_url: TELEGRAM_API_BASE.to_string(),
            bot_token,
            chat_id,
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    /// `None` unless both token and channel are configured.
    pub fn from_config(cfg: &TelegramConfig) -> Option<Self> {
        match (&cfg.bot_token, &cfg.channel_id) {
            (Some(token), Some(chat)) => Some(Self::new(token.clone(), chat.clone())),
            _ => None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    async fn send_once(&self, text: &str) -> Result<Option<i64>> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };
        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("telegram post")?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(anyhow!("Telegram API HTTP error: {status}"));
        }
        let parsed: SendMessageResponse = rsp.json().await.context("telegram response body")?;
        if !parsed.ok {
            return Err(anyhow!(
                "Telegram API rejected message: {}",
                parsed.description.unwrap_or_default()
            ));
        }
        Ok(parsed.result.map(|m| m.message_id))
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<Option<i64>> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.send_once(text).await {
                Ok(id) => return Ok(id),
                Err(e) if attempt < self.max_retries => {
                    tracing::warn!(
                        target: "notify",
                        attempt,
                        error = %e,
                        "telegram send failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_both_fields() {
        let mut cfg = TelegramConfig::default();
        assert!(TelegramNotifier::from_config(&cfg).is_none());
        cfg.bot_token = Some("123:abc".into());
        assert!(TelegramNotifier::from_config(&cfg).is_none());
        cfg.channel_id = Some("@news".into());
        assert!(TelegramNotifier::from_config(&cfg).is_some());
    }

    #[test]
    fn response_shape() {
        let ok: SendMessageResponse =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":42,"chat":{}}}"#).unwrap();
        assert_eq!(ok.result.map(|m| m.message_id), Some(42));
        let err: SendMessageResponse =
            serde_json::from_str(r#"{"ok":false,"description":"chat not found"}"#).unwrap();
        assert!(!err.ok);
    }
}
