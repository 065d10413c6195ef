// src/notify/telegram.rs
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;

use super::Notifier;

/// Telegram Bot API client for `sendMessage`. Transient failures are retried
/// with exponential backoff, capped at `max_retries` attempts.
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            token,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Override the API origin (tests point this at a local stub).
    pub fn with_api_base(mut self, base: String) -> Self {
        self.api_base = base;
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<()> {
        let payload = SendMessage { chat_id, text };
        let url = self.send_message_url();

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("telegram sendMessage HTTP error: {e}"));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("telegram sendMessage request failed: {e}"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_embeds_token() {
        let n = TelegramNotifier::new("123:abc".into());
        assert_eq!(
            n.send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
