//! Top-level error type for the bot
//!
//! Module errors convert into [`BotError`] so handlers can use `?` across
//! Telegram, weather, storage and calculator calls.

use thiserror::Error;

use crate::config::ConfigError;
use crate::services::{AnnualBonusError, SalaryError};
use crate::telegram::TelegramError;
use crate::weather::WeatherError;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Salary calculation error: {0}")]
    Salary(#[from] SalaryError),

    #[error("Annual bonus calculation error: {0}")]
    AnnualBonus(#[from] AnnualBonusError),

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
