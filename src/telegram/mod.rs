//! Telegram front end
//!
//! A minimal Bot API client, the menus, per-chat calculator dialogs and the
//! long-polling runner that feeds updates to the handlers.

pub mod api;
pub mod dialogs;
pub mod handlers;
pub mod keyboards;
pub mod runner;
pub mod types;

pub use api::{BotApi, TelegramClient, TelegramError};
pub use dialogs::{DialogKind, DialogStore};
pub use handlers::{handle_update, BotContext};
pub use runner::{run, run_until};
pub use types::{CallbackQuery, Chat, InlineKeyboardMarkup, Message, Update, User};
