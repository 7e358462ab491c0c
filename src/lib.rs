//! vakhta-bot: a Telegram bot for rotation-shift workers of the Vankor field
//!
//! - [`services`] salary and 13th-salary calculators
//! - [`weather`] current weather, week forecast and helicopter flight outlook
//! - [`database`] SQLite storage for users and calculation history
//! - [`telegram`] Bot API client, menus, dialogs and the polling runner

pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod telegram;
pub mod weather;

pub use config::{BotConfig, ConfigError, Location};
pub use error::{BotError, Result};
