use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Notifier, NotifyError};

/// Sends messages through the Telegram Bot API `sendMessage` method.
#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiResponse {
    fn into_result(self) -> Result<(), NotifyError> {
        if self.ok {
            return Ok(());
        }

        Err(NotifyError::Rejected(format!(
            "{}: {}",
            self.error_code.unwrap_or_default(),
            self.description.as_deref().unwrap_or("no description")
        )))
    }
}

impl TelegramNotifier {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    // The token is part of the URL; keep `self` out of the span.
    #[instrument(skip(self, message), fields(chars = message.chars().count()), level = "debug")]
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "Markdown",
        };

        // Telegram explains rejections in the JSON body, so the status code is
        // not checked separately.
        let resp: ApiResponse = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())?
            .json()
            .await
            .map_err(|e| e.without_url())?;

        resp.into_result()?;

        debug!("telegram message delivered");
        Ok(())
    }
}
