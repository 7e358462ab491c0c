//! Step-by-step input for the salary and 13th-salary calculators
//!
//! A dialog walks a fixed list of fields. Each answer is parsed and range
//! checked before the dialog moves on; optional fields accept "skip". After
//! the last field the dialog waits for confirm or cancel.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::keyboards;
use super::types::InlineKeyboardMarkup;
use crate::services::money;
use crate::services::{AnnualBonusInput, SalaryInput};
use crate::services::annual_bonus_service::MONTH_NAMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Salary,
    AnnualBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    HourlyRate,
    DaysWorked,
    NightHours,
    IdleDays,
    TravelDays,
    HolidayDays,
    RegionalRate,
    NorthernRate,
    AdditionalPayments,
    MonthsInCompany,
    MonthDays(u32),
    MonthlyBonusRate,
    TargetRate,
    Kpi,
    Correction,
}

struct Bounds {
    min: Decimal,
    max: Decimal,
    min_exclusive: bool,
    integer: bool,
}

impl Bounds {
    fn closed(min: i64, max: i64) -> Self {
        Self {
            min: Decimal::from(min),
            max: Decimal::from(max),
            min_exclusive: false,
            integer: false,
        }
    }
}

impl Field {
    fn label(self) -> String {
        match self {
            Field::HourlyRate => "Часовая ставка".into(),
            Field::DaysWorked => "Отработано дней".into(),
            Field::NightHours => "Ночные часы".into(),
            Field::IdleDays => "Дни простоя".into(),
            Field::TravelDays => "Дни в пути".into(),
            Field::HolidayDays => "Праздничные дни".into(),
            Field::RegionalRate => "Районный коэффициент, %".into(),
            Field::NorthernRate => "Северная надбавка, %".into(),
            Field::AdditionalPayments => "Доплаты".into(),
            Field::MonthsInCompany => "Месяцев в компании".into(),
            Field::MonthDays(m) => format!("{}, дней", month_name(m)),
            Field::MonthlyBonusRate => "Ежемесячная премия, %".into(),
            Field::TargetRate => "Целевой % годового вознаграждения".into(),
            Field::Kpi => "Коэффициент KPI".into(),
            Field::Correction => "Корректирующий коэффициент".into(),
        }
    }

    fn question(self) -> String {
        match self {
            Field::HourlyRate => "Введите часовую ставку (₽/час):".into(),
            Field::DaysWorked => "Сколько дней отработано на вахте?".into(),
            Field::NightHours => "Сколько ночных часов?".into(),
            Field::IdleDays => "Сколько дней простоя?".into(),
            Field::TravelDays => "Сколько дней в пути?".into(),
            Field::HolidayDays => "Сколько праздничных дней отработано?".into(),
            Field::RegionalRate => "Районный коэффициент, % (например 50):".into(),
            Field::NorthernRate => "Северная надбавка, % (например 80):".into(),
            Field::AdditionalPayments => "Прочие доплаты, ₽:".into(),
            Field::MonthsInCompany => "Сколько месяцев вы отработали в компании за год (1–12)?".into(),
            Field::MonthDays(m) => format!("{}: сколько дней отработано?", month_name(m)),
            Field::MonthlyBonusRate => "Процент ежемесячной премии (по умолчанию 33):".into(),
            Field::TargetRate => "Целевой % годового вознаграждения по должности:".into(),
            Field::Kpi => "Коэффициент выполнения KPI (по умолчанию 1):".into(),
            Field::Correction => "Корректирующий коэффициент (по умолчанию 1):".into(),
        }
    }

    fn optional(self) -> bool {
        !matches!(
            self,
            Field::HourlyRate | Field::DaysWorked | Field::MonthsInCompany | Field::TargetRate
        )
    }

    fn bounds(self) -> Bounds {
        match self {
            Field::HourlyRate => Bounds {
                min: Decimal::ZERO,
                max: Decimal::from(100_000),
                min_exclusive: true,
                integer: false,
            },
            Field::DaysWorked => Bounds::closed(0, 365),
            Field::NightHours => Bounds::closed(0, 744),
            Field::IdleDays | Field::TravelDays | Field::HolidayDays | Field::MonthDays(_) => {
                Bounds::closed(0, 31)
            }
            Field::RegionalRate
            | Field::NorthernRate
            | Field::MonthlyBonusRate
            | Field::TargetRate => Bounds::closed(0, 100),
            Field::AdditionalPayments => Bounds::closed(0, 10_000_000),
            Field::MonthsInCompany => Bounds {
                integer: true,
                ..Bounds::closed(1, 12)
            },
            Field::Kpi | Field::Correction => Bounds::closed(0, 10),
        }
    }

    /// Parse and range-check one answer.
    pub fn parse(self, text: &str) -> Result<Decimal, String> {
        let value = money::parse_user_number(text)
            .ok_or_else(|| "❌ Введите число, например 150 или 150,5".to_string())?;
        let bounds = self.bounds();

        if bounds.integer && !value.fract().is_zero() {
            return Err("❌ Введите целое число".to_string());
        }
        let below = if bounds.min_exclusive {
            value <= bounds.min
        } else {
            value < bounds.min
        };
        if below || value > bounds.max {
            return Err(if bounds.min_exclusive {
                format!(
                    "❌ Значение должно быть больше {} и не больше {}",
                    bounds.min, bounds.max
                )
            } else {
                format!(
                    "❌ Значение должно быть от {} до {}",
                    bounds.min, bounds.max
                )
            });
        }
        Ok(value)
    }
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

/// What to send back after a dialog step
#[derive(Debug, Clone, PartialEq)]
pub struct DialogReply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl DialogReply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }
}

/// Collected input, ready for the calculators
#[derive(Debug, Clone, PartialEq)]
pub enum Completed {
    Salary(SalaryInput),
    AnnualBonus(AnnualBonusInput),
}

#[derive(Debug, Clone)]
pub struct Dialog {
    kind: DialogKind,
    steps: Vec<Field>,
    position: usize,
    values: HashMap<Field, Decimal>,
}

impl Dialog {
    pub fn new(kind: DialogKind) -> Self {
        let steps = match kind {
            DialogKind::Salary => vec![
                Field::HourlyRate,
                Field::DaysWorked,
                Field::NightHours,
                Field::IdleDays,
                Field::TravelDays,
                Field::HolidayDays,
                Field::RegionalRate,
                Field::NorthernRate,
                Field::AdditionalPayments,
            ],
            DialogKind::AnnualBonus => {
                let mut steps = vec![Field::HourlyRate, Field::MonthsInCompany];
                steps.extend((1..=12).map(Field::MonthDays));
                steps.extend([
                    Field::MonthlyBonusRate,
                    Field::TargetRate,
                    Field::Kpi,
                    Field::Correction,
                    Field::RegionalRate,
                    Field::NorthernRate,
                ]);
                steps
            }
        };
        Self {
            kind,
            steps,
            position: 0,
            values: HashMap::new(),
        }
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn current_field(&self) -> Option<Field> {
        self.steps.get(self.position).copied()
    }

    /// All fields answered; waiting for confirm or cancel
    pub fn awaiting_confirmation(&self) -> bool {
        self.position >= self.steps.len()
    }

    /// Greeting plus the first question
    pub fn intro(&self) -> DialogReply {
        let title = match self.kind {
            DialogKind::Salary => "💰 Расчёт зарплаты вахтовика",
            DialogKind::AnnualBonus => "🎁 Расчёт 13-й зарплаты",
        };
        let prompt = self.prompt();
        DialogReply {
            text: format!(
                "{title}\n\nОтвечайте числами, дробную часть можно писать через запятую. /cancel прерывает расчёт.\n\n{}",
                prompt.text
            ),
            keyboard: prompt.keyboard,
        }
    }

    fn prompt(&self) -> DialogReply {
        match self.current_field() {
            Some(field) => {
                let mut text = format!(
                    "Шаг {}/{}. {}",
                    self.position + 1,
                    self.steps.len(),
                    field.question()
                );
                if field.optional() {
                    text.push_str("\n(можно пропустить)");
                }
                DialogReply {
                    text,
                    keyboard: field.optional().then(keyboards::skip),
                }
            }
            None => self.summary(),
        }
    }

    fn summary(&self) -> DialogReply {
        let mut text = String::from("📋 Проверьте данные:\n\n");
        for field in &self.steps {
            let shown = match self.values.get(field) {
                Some(value) => value.normalize().to_string(),
                None => "—".to_string(),
            };
            text.push_str(&format!("• {}: {}\n", field.label(), shown));
        }
        text.push_str("\nВсё верно?");
        DialogReply {
            text,
            keyboard: Some(keyboards::confirm()),
        }
    }

    /// Feed a typed answer to the current step.
    pub fn answer(&mut self, text: &str) -> DialogReply {
        let Some(field) = self.current_field() else {
            return DialogReply {
                text: "Нажмите «✅ Рассчитать» или «❌ Отмена».".to_string(),
                keyboard: Some(keyboards::confirm()),
            };
        };

        match field.parse(text) {
            Ok(value) => {
                self.values.insert(field, value);
                self.position += 1;
                self.prompt()
            }
            Err(message) => {
                let prompt = self.prompt();
                DialogReply {
                    text: format!("{message}\n\n{}", prompt.text),
                    keyboard: prompt.keyboard,
                }
            }
        }
    }

    /// Skip the current step if it is optional.
    pub fn skip(&mut self) -> DialogReply {
        match self.current_field() {
            Some(field) if field.optional() => {
                self.values.remove(&field);
                self.position += 1;
                self.prompt()
            }
            Some(_) => {
                let prompt = self.prompt();
                DialogReply {
                    text: format!("❌ Это значение обязательно.\n\n{}", prompt.text),
                    keyboard: prompt.keyboard,
                }
            }
            None => DialogReply::plain("Нечего пропускать."),
        }
    }

    /// Input for the calculator, once every step is answered.
    pub fn complete(&self) -> Option<Completed> {
        if !self.awaiting_confirmation() {
            return None;
        }
        let get = |field: Field| self.values.get(&field).copied();

        Some(match self.kind {
            DialogKind::Salary => Completed::Salary(SalaryInput {
                hourly_rate: get(Field::HourlyRate)?,
                days_worked: get(Field::DaysWorked)?,
                night_hours: get(Field::NightHours),
                idle_days: get(Field::IdleDays),
                travel_days: get(Field::TravelDays),
                holiday_days: get(Field::HolidayDays),
                additional_payments: get(Field::AdditionalPayments),
                regional_allowance_rate: get(Field::RegionalRate),
                northern_allowance_rate: get(Field::NorthernRate),
            }),
            DialogKind::AnnualBonus => {
                let monthly_days: BTreeMap<u32, Decimal> = (1..=12)
                    .map(|m| (m, get(Field::MonthDays(m)).unwrap_or(Decimal::ZERO)))
                    .collect();
                Completed::AnnualBonus(AnnualBonusInput {
                    hourly_rate: get(Field::HourlyRate)?,
                    months_in_company: get(Field::MonthsInCompany)?,
                    monthly_days,
                    monthly_bonus_rate: get(Field::MonthlyBonusRate),
                    target_annual_bonus_rate: get(Field::TargetRate),
                    kpi_coefficient: get(Field::Kpi),
                    correction_coefficient: get(Field::Correction),
                    regional_allowance_rate: get(Field::RegionalRate),
                    northern_allowance_rate: get(Field::NorthernRate),
                })
            }
        })
    }
}

/// Active dialogs keyed by chat id
#[derive(Default)]
pub struct DialogStore {
    dialogs: Mutex<HashMap<i64, Dialog>>,
}

impl DialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a dialog and return its first prompt.
    pub async fn start(&self, chat_id: i64, kind: DialogKind) -> DialogReply {
        let dialog = Dialog::new(kind);
        let intro = dialog.intro();
        self.dialogs.lock().await.insert(chat_id, dialog);
        intro
    }

    /// `None` when the chat has no active dialog.
    pub async fn answer(&self, chat_id: i64, text: &str) -> Option<DialogReply> {
        let mut dialogs = self.dialogs.lock().await;
        dialogs.get_mut(&chat_id).map(|d| d.answer(text))
    }

    pub async fn skip(&self, chat_id: i64) -> Option<DialogReply> {
        let mut dialogs = self.dialogs.lock().await;
        dialogs.get_mut(&chat_id).map(Dialog::skip)
    }

    /// Remove the dialog if it is complete and return its input.
    ///
    /// An unfinished dialog stays in place and `Err` carries its current prompt.
    pub async fn finish(&self, chat_id: i64) -> Option<Result<Completed, DialogReply>> {
        let mut dialogs = self.dialogs.lock().await;
        let dialog = dialogs.get(&chat_id)?;
        match dialog.complete() {
            Some(done) => {
                dialogs.remove(&chat_id);
                Some(Ok(done))
            }
            None => Some(Err(dialog.prompt())),
        }
    }

    /// Returns whether a dialog was active.
    pub async fn cancel(&self, chat_id: i64) -> bool {
        self.dialogs.lock().await.remove(&chat_id).is_some()
    }

    pub async fn is_active(&self, chat_id: i64) -> bool {
        self.dialogs.lock().await.contains_key(&chat_id)
    }
}
