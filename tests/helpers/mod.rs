//! Shared fakes for the integration tests
//!
//! `RecordingBot` stands in for the Telegram Bot API and keeps every call;
//! `CannedWeather` answers weather requests from fixed payloads.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use vakhta_bot::config::{BotConfig, Location};
use vakhta_bot::database::{DatabaseConfig, DatabaseManager};
use vakhta_bot::telegram::types::{CallbackQuery, Chat, InlineKeyboardMarkup, Message, Update, User};
use vakhta_bot::telegram::{BotApi, BotContext, TelegramError};
use vakhta_bot::weather::types::{
    Clouds, Condition, CurrentWeather, ForecastEntry, ForecastResponse, MainReadings, Wind,
};
use vakhta_bot::weather::{WeatherError, WeatherSource};

pub const CHAT_ID: i64 = 4242;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    AnswerCallback(String),
    DeleteWebhook(bool),
}

impl Call {
    pub fn text(&self) -> Option<&str> {
        match self {
            Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&InlineKeyboardMarkup> {
        match self {
            Call::Send { keyboard, .. } | Call::Edit { keyboard, .. } => keyboard.as_ref(),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct RecordingBot {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI64,
    pending_updates: Mutex<VecDeque<Result<Vec<Update>, TelegramError>>>,
    pub fail_edits: AtomicBool,
    pub fail_sends: AtomicBool,
    /// Edits of these message ids fail even when `fail_edits` is off
    pub failing_edit_ids: Mutex<Vec<i64>>,
    /// Added before each send or edit is recorded
    pub reply_delay_ms: AtomicU64,
}

impl RecordingBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_message_id: AtomicI64::new(1000),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Text of every sent or edited message, in order
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.text().map(str::to_string))
            .collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    pub fn last_keyboard(&self) -> Option<InlineKeyboardMarkup> {
        self.calls()
            .iter()
            .rev()
            .find(|c| c.text().is_some())
            .and_then(|c| c.keyboard().cloned())
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn queue_updates(&self, batch: Result<Vec<Update>, TelegramError>) {
        self.pending_updates.lock().unwrap().push_back(batch);
    }

    /// Sent or edited texts addressed to one chat
    pub fn texts_in(&self, chat: i64) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Send { chat_id, text, .. } | Call::Edit { chat_id, text, .. }
                    if *chat_id == chat =>
                {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    async fn reply_delay(&self) {
        let delay = self.reply_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BotApi for RecordingBot {
    async fn get_updates(&self, _offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let next = self.pending_updates.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        self.reply_delay().await;
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TelegramError::Timeout);
        }
        self.record(Call::Send {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        Ok(bot_message(chat_id, message_id, text))
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        self.reply_delay().await;
        let failing = self.failing_edit_ids.lock().unwrap().contains(&message_id);
        if failing || self.fail_edits.load(Ordering::SeqCst) {
            return Err(TelegramError::Api {
                code: 400,
                description: "Bad Request: message to edit not found".into(),
            });
        }
        self.record(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        _text: Option<&str>,
    ) -> Result<(), TelegramError> {
        self.record(Call::AnswerCallback(callback_query_id.to_string()));
        Ok(())
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TelegramError> {
        self.record(Call::DeleteWebhook(drop_pending_updates));
        Ok(())
    }
}

/// Weather source serving fixed payloads; a missing payload is an API error.
#[derive(Default)]
pub struct CannedWeather {
    pub current: Option<CurrentWeather>,
    pub forecasts: HashMap<String, ForecastResponse>,
    pub forecast_calls: AtomicUsize,
}

#[async_trait]
impl WeatherSource for CannedWeather {
    async fn current(&self, _location: &Location) -> Result<CurrentWeather, WeatherError> {
        self.current.clone().ok_or(WeatherError::MissingApiKey)
    }

    async fn forecast(
        &self,
        location: &Location,
        count: u32,
    ) -> Result<ForecastResponse, WeatherError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        let mut response = self
            .forecasts
            .get(&location.name)
            .cloned()
            .ok_or(WeatherError::MissingApiKey)?;
        response.list.truncate(count as usize);
        Ok(response)
    }
}

pub fn user() -> User {
    User {
        id: 777,
        is_bot: false,
        first_name: "Иван".into(),
        last_name: Some("Петров".into()),
        username: Some("ivan_p".into()),
    }
}

pub fn bot_message(chat_id: i64, message_id: i64, text: &str) -> Message {
    Message {
        message_id,
        chat: Chat {
            id: chat_id,
            kind: "private".into(),
        },
        from: None,
        date: 0,
        text: Some(text.to_string()),
    }
}

pub fn text_update(text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(Message {
            message_id: 1,
            chat: Chat {
                id: CHAT_ID,
                kind: "private".into(),
            },
            from: Some(user()),
            date: 0,
            text: Some(text.to_string()),
        }),
        callback_query: None,
    }
}

/// Text message from another chat
pub fn text_update_in(chat_id: i64, update_id: i64, text: &str) -> Update {
    let mut update = text_update(text);
    update.update_id = update_id;
    if let Some(message) = update.message.as_mut() {
        message.chat.id = chat_id;
    }
    update
}

pub fn callback_update(data: &str) -> Update {
    Update {
        update_id: 2,
        message: None,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{data}"),
            from: user(),
            message: Some(bot_message(CHAT_ID, 500, "menu")),
            data: Some(data.to_string()),
        }),
    }
}

pub fn test_config(db_path: &std::path::Path) -> BotConfig {
    let mut config = BotConfig::from_lookup(|key| match key {
        "TELEGRAM_BOT_TOKEN" => Some("123:test".to_string()),
        _ => None,
    })
    .unwrap();
    config.database_path = db_path.to_path_buf();
    config
}

/// Fresh database in a temp dir. Keep the `TempDir` alive for the test.
pub async fn temp_database() -> (TempDir, DatabaseManager) {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseManager::init(DatabaseConfig::new(dir.path().join("bot.db")))
        .await
        .unwrap();
    (dir, db)
}

pub struct Harness {
    pub _dir: TempDir,
    pub bot: Arc<RecordingBot>,
    pub ctx: Arc<BotContext>,
}

pub async fn harness(weather: CannedWeather) -> Harness {
    let (dir, db) = temp_database().await;
    let bot = RecordingBot::new();
    let config = test_config(&dir.path().join("bot.db"));
    let ctx = Arc::new(BotContext::new(
        bot.clone(),
        db,
        Arc::new(weather),
        &config,
    ));
    Harness {
        _dir: dir,
        bot,
        ctx,
    }
}

/// Three-hourly slots starting 2025-01-06 00:00 UTC (07:00 local)
pub fn forecast_series(slots: usize, wind: f64, gust: f64, clouds: f64) -> ForecastResponse {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap().timestamp();
    ForecastResponse {
        list: (0..slots)
            .map(|i| ForecastEntry {
                dt: start + i as i64 * 3 * 3600,
                main: MainReadings {
                    temp: -25.0 + (i % 8) as f64,
                    feels_like: -32.0,
                    humidity: 85.0,
                    pressure: 1015.0,
                },
                weather: vec![Condition {
                    main: "Clouds".into(),
                    description: "пасмурно".into(),
                }],
                wind: Wind {
                    speed: wind,
                    gust,
                    deg: Some(270.0),
                },
                clouds: Clouds { all: clouds },
                ..Default::default()
            })
            .collect(),
    }
}

pub fn current_payload() -> CurrentWeather {
    CurrentWeather {
        dt: Utc.with_ymd_and_hms(2025, 1, 6, 5, 0, 0).unwrap().timestamp(),
        name: "Vankor".into(),
        main: MainReadings {
            temp: -28.4,
            feels_like: -35.1,
            humidity: 80.0,
            pressure: 1012.0,
        },
        weather: vec![Condition {
            main: "Snow".into(),
            description: "небольшой снег".into(),
        }],
        wind: Wind {
            speed: 6.0,
            gust: 9.0,
            deg: Some(0.0),
        },
        ..Default::default()
    }
}
