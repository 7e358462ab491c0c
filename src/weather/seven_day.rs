//! Week-ahead forecast for the field
//!
//! The free `/forecast` endpoint returns up to 40 three-hour slots (five
//! days); they are folded into at most seven local calendar days.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::cache::ForecastCache;
use super::client::{WeatherError, WeatherSource};
use super::dates;
use super::format::{self, round_tenth, round_whole};
use super::types::ForecastEntry;
use crate::config::Location;

pub const FORECAST_SLOTS: u32 = 40;
pub const MAX_DAYS: usize = 7;
pub const FAILURE_MESSAGE: &str = "❌ Не удалось получить прогноз погоды. Попробуйте позже.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub date_str: String,
    pub temp_min: i64,
    pub temp_max: i64,
    pub temp_avg: i64,
    pub feels_like_min: i64,
    pub feels_like_max: i64,
    pub description: String,
    pub humidity_avg: i64,
    pub pressure_avg: i64,
    pub wind_speed_max: f64,
    pub wind_direction: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekForecast {
    pub location: String,
    pub days: Vec<DailyForecast>,
    pub fetched_at: DateTime<Utc>,
}

pub struct SevenDayForecastService {
    source: Arc<dyn WeatherSource>,
    location: Location,
    cache: ForecastCache<WeekForecast>,
}

impl SevenDayForecastService {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        location: Location,
        cache: ForecastCache<WeekForecast>,
    ) -> Self {
        Self {
            source,
            location,
            cache,
        }
    }

    /// Cached forecast if fresh, otherwise a new one from the API.
    pub async fn get(&self) -> Result<WeekForecast, WeatherError> {
        if let Some(cached) = self.cache.get() {
            debug!("Returning week forecast from cache");
            return Ok(cached);
        }

        let response = self.source.forecast(&self.location, FORECAST_SLOTS).await?;
        let forecast = WeekForecast {
            location: self.location.name.clone(),
            days: summarize_days(&response.list),
            fetched_at: Utc::now(),
        };
        self.cache.set(forecast.clone());

        info!(
            days = forecast.days.len(),
            location = %forecast.location,
            "Fetched week forecast"
        );
        Ok(forecast)
    }

    pub fn cache(&self) -> &ForecastCache<WeekForecast> {
        &self.cache
    }
}

pub fn summarize_days(entries: &[ForecastEntry]) -> Vec<DailyForecast> {
    dates::group_by_local_day(entries)
        .into_iter()
        .take(MAX_DAYS)
        .map(|(date, slots)| summarize_day(date, &slots))
        .collect()
}

fn summarize_day(date: NaiveDate, slots: &[&ForecastEntry]) -> DailyForecast {
    let temps: Vec<f64> = slots.iter().map(|s| s.main.temp).collect();
    let feels: Vec<f64> = slots.iter().map(|s| s.main.feels_like).collect();
    let humidity: Vec<f64> = slots.iter().map(|s| s.main.humidity).collect();
    let pressure: Vec<f64> = slots.iter().map(|s| s.main.pressure).collect();
    let degrees: Vec<f64> = slots.iter().filter_map(|s| s.wind.deg).collect();

    let whole = |v: Option<f64>| v.map(round_whole).unwrap_or(0);

    DailyForecast {
        date,
        date_str: dates::format_day(date),
        temp_min: whole(format::min_of(temps.iter().copied())),
        temp_max: whole(format::max_of(temps.iter().copied())),
        temp_avg: whole(format::mean(&temps)),
        feels_like_min: whole(format::min_of(feels.iter().copied())),
        feels_like_max: whole(format::max_of(feels.iter().copied())),
        description: most_common_description(slots),
        humidity_avg: whole(format::mean(&humidity)),
        pressure_avg: whole(format::mean(&pressure)),
        wind_speed_max: format::max_of(slots.iter().map(|s| s.wind.speed))
            .map(round_tenth)
            .unwrap_or(0.0),
        wind_direction: format::wind_direction(format::mean(&degrees)),
    }
}

/// Most frequent description of the day; the earliest wins a tie.
fn most_common_description(slots: &[&ForecastEntry]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for slot in slots {
        let description = slot.condition().map(|c| c.description.as_str()).unwrap_or("");
        match counts.iter_mut().find(|(d, _)| *d == description) {
            Some((_, n)) => *n += 1,
            None => counts.push((description, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (description, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((description, n));
        }
    }
    match best {
        Some((description, _)) if !description.is_empty() => format::capitalize(description),
        _ => "Нет данных".to_string(),
    }
}

pub fn format_report(forecast: &WeekForecast) -> String {
    format_report_for(forecast, dates::local_today())
}

pub fn format_report_for(forecast: &WeekForecast, today: NaiveDate) -> String {
    if forecast.days.is_empty() {
        return FAILURE_MESSAGE.to_string();
    }

    let mut report = String::new();
    report.push_str(&format!("🌍 {}\n", forecast.location));
    report.push_str("📅 Прогноз на 7 дней\n");
    report.push_str(&format!("🕐 Обновлено: {}\n", dates::format_updated(forecast.fetched_at)));
    report.push('\n');

    let last = forecast.days.len() - 1;
    for (i, day) in forecast.days.iter().enumerate() {
        let label = dates::day_label(day.date, today);
        report.push_str(&format!("{} {}\n", format::temp_emoji(day.temp_avg as f64), label));
        if label != dates::TODAY && label != dates::TOMORROW {
            report.push_str(&format!("   📅 {}\n", day.date_str));
        }
        report.push_str(&format!(
            "   🌡️ {}°C ... {}°C (ср. {}°C)\n",
            day.temp_min,
            day.temp_max,
            day.temp_avg
        ));
        report.push_str(&format!("   ☁️ {}\n", day.description));
        report.push_str(&format!("   💧 Влажность: {}%\n", day.humidity_avg));
        if day.wind_speed_max > 0.0 {
            report.push_str(&format!(
                "   💨 Ветер: до {:.1} м/с, {}\n",
                day.wind_speed_max,
                day.wind_direction
            ));
        } else {
            report.push_str("   💨 Ветер: штиль\n");
        }
        if i < last {
            report.push('\n');
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::types::{Condition, MainReadings, Wind};
    use chrono::TimeZone;

    fn slot(day: u32, hour: u32, temp: f64, desc: &str, speed: f64, deg: Option<f64>) -> ForecastEntry {
        ForecastEntry {
            dt: Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap().timestamp(),
            main: MainReadings {
                temp,
                feels_like: temp - 5.0,
                humidity: 80.0,
                pressure: 1010.0,
            },
            weather: vec![Condition {
                main: "Clouds".into(),
                description: desc.into(),
            }],
            wind: Wind {
                speed,
                gust: 0.0,
                deg,
            },
            ..Default::default()
        }
    }

    #[test]
    fn folds_slots_into_days() {
        // 00:00 and 06:00 UTC on the 6th are 07:00 and 13:00 local on the 6th,
        // 18:00 UTC is already the 7th locally.
        let entries = vec![
            slot(6, 0, -30.4, "облачно", 3.0, Some(90.0)),
            slot(6, 6, -25.6, "облачно", 5.26, Some(90.0)),
            slot(6, 9, -27.0, "снег", 4.0, None),
            slot(6, 18, -33.0, "ясно", 0.0, None),
        ];
        let days = summarize_days(&entries);
        assert_eq!(days.len(), 2);

        let first = &days[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(first.date_str, "Понедельник, 6 января");
        assert_eq!(first.temp_min, -30);
        assert_eq!(first.temp_max, -26);
        assert_eq!(first.temp_avg, -28);
        assert_eq!(first.feels_like_min, -35);
        assert_eq!(first.description, "Облачно");
        assert_eq!(first.humidity_avg, 80);
        assert_eq!(first.wind_speed_max, 5.3);
        assert_eq!(first.wind_direction, "В");

        assert_eq!(days[1].wind_direction, "неизвестно");
        assert_eq!(days[1].description, "Ясно");
    }

    #[test]
    fn keeps_at_most_seven_days() {
        let entries: Vec<ForecastEntry> = (1..=10)
            .map(|d| slot(d, 3, -10.0, "ясно", 1.0, None))
            .collect();
        assert_eq!(summarize_days(&entries).len(), MAX_DAYS);
    }

    #[test]
    fn report_labels_today_and_tomorrow() {
        let entries = vec![
            slot(6, 3, -10.0, "ясно", 2.0, Some(0.0)),
            slot(7, 3, -22.0, "снег", 0.0, None),
            slot(8, 3, 5.0, "дождь", 1.0, Some(180.0)),
        ];
        let forecast = WeekForecast {
            location: "Ванкор".into(),
            days: summarize_days(&entries),
            fetched_at: Utc.with_ymd_and_hms(2025, 1, 6, 1, 0, 0).unwrap(),
        };
        let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let report = format_report_for(&forecast, today);

        assert!(report.starts_with("🌍 Ванкор\n📅 Прогноз на 7 дней\n🕐 Обновлено: 6 января 2025, 08:00\n"));
        assert!(report.contains("❄️ Сегодня\n   🌡️ -10°C ... -10°C (ср. -10°C)"));
        assert!(report.contains("🥶 Завтра\n"));
        assert!(report.contains("   💨 Ветер: штиль\n"));
        assert!(report.contains("🧊 Среда\n   📅 Среда, 8 января\n"));
        assert!(report.contains("   💨 Ветер: до 1.0 м/с, Ю\n"));
        assert!(!report.contains("📅 Понедельник"));
    }

    #[test]
    fn empty_forecast_reports_failure() {
        let forecast = WeekForecast {
            location: "Ванкор".into(),
            days: vec![],
            fetched_at: Utc::now(),
        };
        assert!(format_report(&forecast).starts_with("❌"));
    }
}
