//! Telegram Bot API client
//!
//! Plain HTTPS + JSON against `https://api.telegram.org/bot<token>/<method>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::types::{ApiResponse, InlineKeyboardMarkup, Message, Update};

const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Seconds Telegram holds a `getUpdates` call open
pub const LONG_POLL_SECS: u64 = 25;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram request timed out")]
    Timeout,

    #[error("Telegram network error: {0}")]
    Network(reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Telegram API returned ok without a result")]
    EmptyResult,

    #[error("failed to build Telegram client: {0}")]
    Setup(String),
}

impl TelegramError {
    /// Network trouble and server-side failures; worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            TelegramError::Timeout | TelegramError::Network(_) => true,
            TelegramError::Api { code, .. } => *code == 429 || *code >= 500,
            TelegramError::EmptyResult | TelegramError::Setup(_) => false,
        }
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TelegramError::Timeout
        } else {
            // the URL carries the bot token
            TelegramError::Network(err.without_url())
        }
    }
}

/// The Bot API methods the bot calls.
///
/// Handlers talk to this trait so they can run against a recording fake.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError>;

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError>;

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), TelegramError>;

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError>;
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TelegramError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        debug!(method, "Calling Telegram API");
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let envelope: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|_| TelegramError::Api {
                code: i64::from(status.as_u16()),
                description: text.chars().take(200).collect(),
            })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or(i64::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope.result.ok_or(TelegramError::EmptyResult)
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

fn with_keyboard(mut body: Value, keyboard: Option<&InlineKeyboardMarkup>) -> Value {
    if let (Some(markup), Some(map)) = (keyboard, body.as_object_mut()) {
        map.insert("reply_markup".to_string(), json!(markup));
    }
    body
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let body = json!({
            "offset": offset,
            "timeout": LONG_POLL_SECS,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call(
            "getUpdates",
            body,
            Duration::from_secs(LONG_POLL_SECS + REQUEST_TIMEOUT_SECS),
        )
        .await
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let body = with_keyboard(json!({ "chat_id": chat_id, "text": text }), keyboard);
        self.call("sendMessage", body, Self::default_timeout()).await
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let body = with_keyboard(
            json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            keyboard,
        );
        match self
            .call::<Value>("editMessageText", body, Self::default_timeout())
            .await
        {
            Ok(_) => Ok(()),
            // pressing the same button twice re-renders identical text
            Err(TelegramError::Api { description, .. })
                if description.contains("message is not modified") =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), TelegramError> {
        let body = json!({ "callback_query_id": callback_query_id, "text": text });
        self.call::<bool>("answerCallbackQuery", body, Self::default_timeout())
            .await
            .map(|_| ())
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError> {
        let body = json!({ "drop_pending_updates": drop_pending_updates });
        self.call::<bool>("deleteWebhook", body, Self::default_timeout())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::types::InlineKeyboardButton;

    #[test]
    fn transient_errors() {
        assert!(TelegramError::Timeout.is_transient());
        assert!(TelegramError::Api {
            code: 502,
            description: "Bad Gateway".into()
        }
        .is_transient());
        assert!(TelegramError::Api {
            code: 429,
            description: "Too Many Requests".into()
        }
        .is_transient());
        assert!(!TelegramError::Api {
            code: 400,
            description: "Bad Request".into()
        }
        .is_transient());
    }

    #[test]
    fn keyboard_is_attached_as_reply_markup() {
        let markup = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::new("A", "a")]]);
        let body = with_keyboard(json!({"chat_id": 1, "text": "hi"}), Some(&markup));
        assert_eq!(
            body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "a"
        );
        let body = with_keyboard(json!({"chat_id": 1}), None);
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn base_url_embeds_token() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc").unwrap();
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:abc");
    }
}
