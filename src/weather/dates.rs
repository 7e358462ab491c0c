//! Local-time helpers for the field (UTC+7) and Russian date wording

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};

use super::types::ForecastEntry;

pub const LOCAL_UTC_OFFSET_HOURS: i32 = 7;

const MONTHS_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа", "сентября",
    "октября", "ноября", "декабря",
];

const WEEKDAYS: [&str; 7] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
];

pub const TODAY: &str = "Сегодня";
pub const TOMORROW: &str = "Завтра";

fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

pub fn to_local(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&local_offset())
}

/// Local calendar date of a unix timestamp
pub fn local_date_of(unix_seconds: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(unix_seconds, 0).map(|dt| to_local(dt).date_naive())
}

pub fn local_today() -> NaiveDate {
    to_local(Utc::now()).date_naive()
}

/// "Понедельник, 5 января"
pub fn format_day(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        WEEKDAYS[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS_GENITIVE[date.month0() as usize]
    )
}

/// "5 января 2025, 14:03" in local time
pub fn format_updated(instant: DateTime<Utc>) -> String {
    let local = to_local(instant);
    format!(
        "{} {} {}, {:02}:{:02}",
        local.day(),
        MONTHS_GENITIVE[local.month0() as usize],
        local.year(),
        local.hour(),
        local.minute()
    )
}

/// "Сегодня", "Завтра" or the weekday name
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        TODAY.to_string()
    } else if date == today + Duration::days(1) {
        TOMORROW.to_string()
    } else {
        WEEKDAYS[date.weekday().num_days_from_monday() as usize].to_string()
    }
}

/// Bucket forecast slots by local calendar day, earliest day first.
/// Slots with an out-of-range timestamp are dropped.
pub fn group_by_local_day(entries: &[ForecastEntry]) -> BTreeMap<NaiveDate, Vec<&ForecastEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(date) = local_date_of(entry.dt) {
            days.entry(date).or_default().push(entry);
        }
    }
    days
}
