//! Inline keyboards

use super::types::{InlineKeyboardButton as Button, InlineKeyboardMarkup};

pub mod callback {
    pub const MONEY_CALC: &str = "money_calc";
    pub const WEATHER: &str = "weather";
    pub const SALARY: &str = "salary";
    pub const ANNUAL_BONUS: &str = "annual_bonus";
    pub const WEATHER_TODAY: &str = "weather_today";
    pub const WEATHER_7DAYS: &str = "weather_7days";
    pub const FLIGHT_PROBABILITY: &str = "flight_probability";
    pub const BACK_TO_MAIN: &str = "back_to_main";
    pub const SKIP: &str = "skip";
    pub const CONFIRM: &str = "confirm";
    pub const CANCEL: &str = "cancel";
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        Button::new("💰 Деньги", callback::MONEY_CALC),
        Button::new("🌤️ Погода", callback::WEATHER),
    ]])
}

pub fn money_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            Button::new("💰 Зарплата", callback::SALARY),
            Button::new("🎁 13-я", callback::ANNUAL_BONUS),
        ],
        vec![Button::new("◀️ Назад", callback::BACK_TO_MAIN)],
    ])
}

pub fn weather_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![Button::new("🌤️ Погода сегодня", callback::WEATHER_TODAY)],
        vec![Button::new("📅 Погода на 7 дней", callback::WEATHER_7DAYS)],
        vec![Button::new("🚁 Вероятность вылета", callback::FLIGHT_PROBABILITY)],
        vec![Button::new("◀️ Назад", callback::BACK_TO_MAIN)],
    ])
}

pub fn back_to_main() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![Button::new(
        "◀️ Главное меню",
        callback::BACK_TO_MAIN,
    )]])
}

/// Offered on optional dialog steps
pub fn skip() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![Button::new("⏭️ Пропустить", callback::SKIP)]])
}

pub fn confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        Button::new("✅ Рассчитать", callback::CONFIRM),
        Button::new("❌ Отмена", callback::CANCEL),
    ]])
}
