//! Update dispatch: commands, button presses and dialog input

use std::sync::Arc;

use tracing::{error, info, warn};

use super::api::BotApi;
use super::dialogs::{Completed, DialogKind, DialogReply, DialogStore};
use super::keyboards::{self, callback};
use super::types::{CallbackQuery, InlineKeyboardMarkup, Message, Update, User};
use crate::config::BotConfig;
use crate::database::{
    DatabaseManager, NewSalaryRecord, UserProfile, UserRow, DEFAULT_HISTORY_LIMIT,
};
use crate::error::Result;
use crate::services::{annual_bonus_service, salary_service};
use crate::weather::{
    current, dates, flight, seven_day, CurrentReport, CurrentWeatherService,
    FlightForecastService, ForecastCache, SevenDayForecastService, WeatherError, WeatherSource,
};

pub const GENERIC_ERROR: &str =
    "❌ Произошла ошибка при обработке запроса.\nПопробуйте позже или обратитесь к администратору.";
pub const UNKNOWN_CALLBACK: &str = "Неизвестная команда";
const LOADING_WEATHER: &str = "🌤️ Загружаю данные о погоде...";
const LOADING_FORECAST: &str = "📅 Загружаю прогноз погоды...";
const LOADING_FLIGHT: &str = "🚁 Анализирую погоду на маршруте...";
const NO_DIALOG: &str = "Нет активного расчёта.";
const CANCELLED: &str = "❌ Расчёт отменён.";

const HELP_TEXT: &str = "📋 Доступные команды:
/start - Начать работу с ботом
/help - Показать эту справку
/weather - Погода на Ванкорском месторождении
/salary - Рассчитать зарплату за вахту
/bonus - Рассчитать 13-ю зарплату
/history - Последние расчёты зарплаты
/cancel - Прервать текущий расчёт";

/// Everything a handler needs, shared across update tasks
pub struct BotContext {
    pub api: Arc<dyn BotApi>,
    pub db: DatabaseManager,
    pub dialogs: DialogStore,
    pub current_weather: CurrentWeatherService,
    pub week_forecast: SevenDayForecastService,
    pub flight_forecast: FlightForecastService,
}

impl BotContext {
    pub fn new(
        api: Arc<dyn BotApi>,
        db: DatabaseManager,
        weather: Arc<dyn WeatherSource>,
        config: &BotConfig,
    ) -> Self {
        let ttl = config.weather.cache_ttl;
        Self {
            api,
            db,
            dialogs: DialogStore::new(),
            current_weather: CurrentWeatherService::new(
                weather.clone(),
                config.weather.vankor.clone(),
            ),
            week_forecast: SevenDayForecastService::new(
                weather.clone(),
                config.weather.vankor.clone(),
                ForecastCache::new(ttl),
            ),
            flight_forecast: FlightForecastService::new(
                weather,
                config.weather.vankor.clone(),
                config.weather.igarka.clone(),
                ForecastCache::new(ttl),
            ),
        }
    }
}

/// Handle one update. Failures are logged and the user gets a short apology.
pub async fn handle_update(ctx: &BotContext, update: Update) {
    let chat_id = update.chat_id();

    let result = if let Some(message) = update.message {
        handle_message(ctx, message).await
    } else if let Some(query) = update.callback_query {
        handle_callback(ctx, query).await
    } else {
        Ok(())
    };

    if let Err(e) = result {
        error!(update_id = update.update_id, error = %e, "Exception while handling an update");
        if let Some(chat_id) = chat_id {
            if let Err(send_err) = ctx.api.send_message(chat_id, GENERIC_ERROR, None).await {
                warn!(chat_id, error = %send_err, "Failed to report error to user");
            }
        }
    }
}

fn profile(user: &User) -> UserProfile {
    UserProfile {
        telegram_id: user.id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
        last_name: user.last_name.clone(),
    }
}

async fn register(ctx: &BotContext, user: &User) -> Result<(UserRow, bool)> {
    Ok(ctx.db.users().get_or_create(&profile(user)).await?)
}

async fn send(
    ctx: &BotContext,
    chat_id: i64,
    text: &str,
    keyboard: Option<&InlineKeyboardMarkup>,
) -> Result<Message> {
    Ok(ctx.api.send_message(chat_id, text, keyboard).await?)
}

async fn send_reply(ctx: &BotContext, chat_id: i64, reply: &DialogReply) -> Result<()> {
    send(ctx, chat_id, &reply.text, reply.keyboard.as_ref()).await?;
    Ok(())
}

/// Edit `target` in place; if that fails, post the text as a new message.
///
/// Returns the message that now shows `text`, so follow-up edits land there.
async fn replace_or_send(
    ctx: &BotContext,
    chat_id: i64,
    target: Option<&Message>,
    text: &str,
    keyboard: Option<&InlineKeyboardMarkup>,
) -> Result<Message> {
    if let Some(message) = target {
        match ctx
            .api
            .edit_message_text(chat_id, message.message_id, text, keyboard)
            .await
        {
            Ok(()) => {
                return Ok(Message {
                    text: Some(text.to_string()),
                    ..message.clone()
                })
            }
            Err(e) => warn!(chat_id, error = %e, "Failed to edit message, sending a new one"),
        }
    }
    send(ctx, chat_id, text, keyboard).await
}

async fn handle_message(ctx: &BotContext, message: Message) -> Result<()> {
    let chat_id = message.chat.id;

    if let Some(command) = message.command() {
        return match command {
            "start" => start_command(ctx, &message).await,
            "help" => send(ctx, chat_id, HELP_TEXT, None).await.map(|_| ()),
            "weather" => weather_command(ctx, &message).await,
            "salary" => start_dialog(ctx, chat_id, DialogKind::Salary).await,
            "bonus" => start_dialog(ctx, chat_id, DialogKind::AnnualBonus).await,
            "history" => history_command(ctx, &message).await,
            "cancel" => cancel_command(ctx, chat_id).await,
            _ => send(ctx, chat_id, "Неизвестная команда. Список команд: /help", None)
                .await
                .map(|_| ()),
        };
    }

    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };

    match ctx.dialogs.answer(chat_id, text).await {
        Some(reply) => send_reply(ctx, chat_id, &reply).await,
        None => {
            let echo = format!(
                "Вы написали: {text}\n\nИспользуйте команды или кнопки для взаимодействия."
            );
            send(ctx, chat_id, &echo, None).await.map(|_| ())
        }
    }
}

async fn start_command(ctx: &BotContext, message: &Message) -> Result<()> {
    let chat_id = message.chat.id;
    let name = message
        .from
        .as_ref()
        .map(|u| u.first_name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("друг");

    let is_new = match &message.from {
        Some(user) => {
            let (_, created) = register(ctx, user).await?;
            if created {
                info!(telegram_id = user.id, username = ?user.username, "New user registered");
            } else {
                info!(telegram_id = user.id, username = ?user.username, "User returned");
            }
            created
        }
        None => false,
    };

    let welcome = if is_new {
        "Добро пожаловать! Я бот для работы с зарплатой и погодой."
    } else {
        "С возвращением! Я бот для работы с зарплатой и погодой."
    };
    let greeting = format!("Привет, {name}! 👋\n\n{welcome}");
    send(ctx, chat_id, &greeting, Some(&keyboards::main_menu())).await?;
    Ok(())
}

async fn weather_command(ctx: &BotContext, message: &Message) -> Result<()> {
    let chat_id = message.chat.id;

    let loading = match ctx.api.send_message(chat_id, LOADING_WEATHER, None).await {
        Ok(sent) => Some(sent),
        Err(e) => {
            warn!(chat_id, error = %e, "Failed to send loading message");
            None
        }
    };

    let text = match ctx.current_weather.get().await {
        Ok(report) => {
            if let Some(user) = &message.from {
                record_weather_request(ctx, user, &report).await;
                info!(telegram_id = user.id, "User requested weather");
            }
            current::format_report(&report)
        }
        Err(e) => {
            warn!(chat_id, error = %e, "Failed to get current weather");
            weather_failure_text(&e)
        }
    };

    replace_or_send(ctx, chat_id, loading.as_ref(), &text, None).await?;
    Ok(())
}

fn weather_failure_text(err: &WeatherError) -> String {
    match err {
        WeatherError::Network(_) => "❌ Произошла ошибка сети при получении погоды.\n\
             Проверьте подключение к интернету и попробуйте позже."
            .to_string(),
        _ => "❌ Не удалось получить данные о погоде.\n\n\
              Возможные причины:\n\
              • Проблемы с подключением к интернету\n\
              • Сервис погоды временно недоступен\n\
              • Не настроен API ключ погоды\n\n\
              Попробуйте позже или обратитесь к администратору."
            .to_string(),
    }
}

/// Weather history is best effort; a storage failure never hides the report.
async fn record_weather_request(ctx: &BotContext, user: &User, report: &CurrentReport) {
    let saved = async {
        let (row, _) = register(ctx, user).await?;
        let payload = serde_json::to_string(&report.raw)?;
        ctx.db
            .weather_records()
            .create(row.id, &report.location, &payload)
            .await?;
        Ok::<(), crate::error::BotError>(())
    }
    .await;

    if let Err(e) = saved {
        warn!(telegram_id = user.id, error = %e, "Failed to save weather record");
    }
}

async fn start_dialog(ctx: &BotContext, chat_id: i64, kind: DialogKind) -> Result<()> {
    let intro = ctx.dialogs.start(chat_id, kind).await;
    send_reply(ctx, chat_id, &intro).await
}

async fn cancel_command(ctx: &BotContext, chat_id: i64) -> Result<()> {
    let text = if ctx.dialogs.cancel(chat_id).await {
        CANCELLED
    } else {
        NO_DIALOG
    };
    send(ctx, chat_id, text, Some(&keyboards::main_menu())).await?;
    Ok(())
}

async fn history_command(ctx: &BotContext, message: &Message) -> Result<()> {
    let chat_id = message.chat.id;
    let Some(from) = &message.from else {
        return Ok(());
    };

    let user = ctx.db.users().get_by_telegram_id(from.id).await?;
    let records = match user {
        Some(user) => {
            ctx.db
                .salary_records()
                .get_user_records(user.id, DEFAULT_HISTORY_LIMIT)
                .await?
        }
        None => Vec::new(),
    };

    if records.is_empty() {
        send(ctx, chat_id, "У вас пока нет сохранённых расчётов. Начните с /salary", None).await?;
        return Ok(());
    }

    let mut text = String::from("📜 Последние расчёты зарплаты:\n");
    for (n, record) in records.iter().enumerate() {
        let when = dates::to_local(record.created_at).format("%d.%m.%Y %H:%M");
        text.push_str(&format!(
            "\n{}. {}\n   Начислено: {:.2} ₽\n   НДФЛ: {:.2} ₽\n   На руки: {:.2} ₽\n",
            n + 1,
            when,
            record.gross,
            record.tax,
            record.net
        ));
    }
    send(ctx, chat_id, &text, None).await?;
    Ok(())
}

async fn handle_callback(ctx: &BotContext, query: CallbackQuery) -> Result<()> {
    if let Err(e) = ctx.api.answer_callback_query(&query.id, None).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(message) = query.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let data = query.data.as_deref().unwrap_or_default();

    let edit = move |text: String, keyboard: Option<InlineKeyboardMarkup>| async move {
        replace_or_send(ctx, chat_id, Some(message), &text, keyboard.as_ref()).await?;
        Ok::<(), crate::error::BotError>(())
    };

    match data {
        callback::MONEY_CALC => {
            edit(
                "💰 Расчёт денег\n\nВыберите, что рассчитать:".into(),
                Some(keyboards::money_menu()),
            )
            .await
        }
        callback::WEATHER => {
            edit(
                "🌤️ Погода\n\nВыберите прогноз:".into(),
                Some(keyboards::weather_menu()),
            )
            .await
        }
        callback::BACK_TO_MAIN => {
            edit("Главное меню".into(), Some(keyboards::main_menu())).await
        }
        callback::SALARY | callback::ANNUAL_BONUS => {
            let kind = if data == callback::SALARY {
                DialogKind::Salary
            } else {
                DialogKind::AnnualBonus
            };
            let intro = ctx.dialogs.start(chat_id, kind).await;
            edit(intro.text, intro.keyboard).await
        }
        callback::WEATHER_TODAY => {
            let loading =
                replace_or_send(ctx, chat_id, Some(message), LOADING_WEATHER, None).await?;
            let text = match ctx.current_weather.get().await {
                Ok(report) => {
                    record_weather_request(ctx, &query.from, &report).await;
                    current::format_report(&report)
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "Failed to get current weather");
                    current::FAILURE_MESSAGE.to_string()
                }
            };
            finish_loading(ctx, chat_id, &loading, &text).await
        }
        callback::WEATHER_7DAYS => {
            let loading =
                replace_or_send(ctx, chat_id, Some(message), LOADING_FORECAST, None).await?;
            let text = match ctx.week_forecast.get().await {
                Ok(forecast) => seven_day::format_report(&forecast),
                Err(e) => {
                    warn!(chat_id, error = %e, "Failed to get week forecast");
                    seven_day::FAILURE_MESSAGE.to_string()
                }
            };
            info!(telegram_id = query.from.id, "User requested week forecast");
            finish_loading(ctx, chat_id, &loading, &text).await
        }
        callback::FLIGHT_PROBABILITY => {
            let loading =
                replace_or_send(ctx, chat_id, Some(message), LOADING_FLIGHT, None).await?;
            let text = match ctx.flight_forecast.get().await {
                Ok(forecast) => flight::format_report(&forecast),
                Err(e) => {
                    warn!(chat_id, error = %e, "Failed to get flight forecast");
                    flight::FAILURE_MESSAGE.to_string()
                }
            };
            info!(telegram_id = query.from.id, "User requested flight forecast");
            finish_loading(ctx, chat_id, &loading, &text).await
        }
        callback::SKIP => match ctx.dialogs.skip(chat_id).await {
            Some(reply) => edit(reply.text, reply.keyboard).await,
            None => edit(NO_DIALOG.into(), Some(keyboards::back_to_main())).await,
        },
        callback::CONFIRM => confirm_dialog(ctx, &query, message).await,
        callback::CANCEL => {
            let text = if ctx.dialogs.cancel(chat_id).await {
                CANCELLED
            } else {
                NO_DIALOG
            };
            edit(text.into(), Some(keyboards::main_menu())).await
        }
        _ => edit(UNKNOWN_CALLBACK.into(), None).await,
    }
}

/// Swap a loading notice for the finished report.
async fn finish_loading(
    ctx: &BotContext,
    chat_id: i64,
    loading: &Message,
    text: &str,
) -> Result<()> {
    let back = keyboards::back_to_main();
    replace_or_send(ctx, chat_id, Some(loading), text, Some(&back)).await?;
    Ok(())
}

async fn confirm_dialog(ctx: &BotContext, query: &CallbackQuery, message: &Message) -> Result<()> {
    let chat_id = message.chat.id;
    let back = keyboards::back_to_main();

    let completed = match ctx.dialogs.finish(chat_id).await {
        None => {
            replace_or_send(ctx, chat_id, Some(message), NO_DIALOG, Some(&back)).await?;
            return Ok(());
        }
        Some(Err(prompt)) => return send_reply(ctx, chat_id, &prompt).await,
        Some(Ok(completed)) => completed,
    };

    let text = match completed {
        Completed::Salary(input) => match salary_service::calculate(&input) {
            Ok(calc) => {
                let (user, _) = register(ctx, &query.from).await?;
                ctx.db
                    .salary_records()
                    .create(&NewSalaryRecord::from_calculation(user.id, &calc))
                    .await?;
                info!(telegram_id = query.from.id, net = %calc.net, "Salary calculated");
                salary_service::format_report(&calc)
            }
            Err(e) => format!("❌ {e}"),
        },
        Completed::AnnualBonus(input) => match annual_bonus_service::calculate(&input) {
            Ok(calc) => {
                info!(telegram_id = query.from.id, net = %calc.net, "Annual bonus calculated");
                annual_bonus_service::format_report(&calc)
            }
            Err(e) => format!("❌ {e}"),
        },
    };

    replace_or_send(ctx, chat_id, Some(message), &text, Some(&back)).await?;
    Ok(())
}
