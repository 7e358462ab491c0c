//! Current conditions at the field

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::client::{WeatherError, WeatherSource};
use super::dates;
use super::format::{self, round_tenth, round_whole};
use super::types::CurrentWeather;
use crate::config::Location;

const HPA_TO_MMHG: f64 = 0.750062;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentReport {
    pub location: String,
    pub temp: i64,
    pub feels_like: i64,
    pub description: String,
    pub humidity: i64,
    pub pressure_mmhg: i64,
    pub wind_speed: f64,
    pub wind_direction: &'static str,
    pub observed_at: DateTime<Utc>,
    /// Raw API payload, kept for the weather history table
    #[serde(skip)]
    pub raw: CurrentWeather,
}

impl CurrentReport {
    pub fn from_api(location: &Location, raw: CurrentWeather) -> Self {
        let observed_at = DateTime::from_timestamp(raw.dt, 0)
            .filter(|_| raw.dt > 0)
            .unwrap_or_else(Utc::now);
        let description = raw
            .weather
            .first()
            .map(|c| format::capitalize(&c.description))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Нет данных".to_string());

        Self {
            location: location.name.clone(),
            temp: round_whole(raw.main.temp),
            feels_like: round_whole(raw.main.feels_like),
            description,
            humidity: round_whole(raw.main.humidity),
            pressure_mmhg: round_whole(raw.main.pressure * HPA_TO_MMHG),
            wind_speed: round_tenth(raw.wind.speed),
            wind_direction: format::wind_direction(raw.wind.deg),
            observed_at,
            raw,
        }
    }
}

pub struct CurrentWeatherService {
    source: Arc<dyn WeatherSource>,
    location: Location,
}

impl CurrentWeatherService {
    pub fn new(source: Arc<dyn WeatherSource>, location: Location) -> Self {
        Self { source, location }
    }

    pub async fn get(&self) -> Result<CurrentReport, WeatherError> {
        let raw = self.source.current(&self.location).await?;
        let report = CurrentReport::from_api(&self.location, raw);
        info!(location = %report.location, temp = report.temp, "Fetched current weather");
        Ok(report)
    }
}

pub fn format_report(report: &CurrentReport) -> String {
    let mut text = String::new();
    text.push_str(&format!("🌍 {}\n", report.location));
    text.push_str(&format!("🕐 Обновлено: {}\n", dates::format_updated(report.observed_at)));
    text.push('\n');
    text.push_str(&format!(
        "{} Температура: {}°C (ощущается как {}°C)\n",
        format::temp_emoji(report.temp as f64),
        report.temp,
        report.feels_like
    ));
    text.push_str(&format!("☁️ {}\n", report.description));
    text.push_str(&format!("💧 Влажность: {}%\n", report.humidity));
    text.push_str(&format!("📊 Давление: {} мм рт. ст.\n", report.pressure_mmhg));
    if report.wind_speed > 0.0 {
        text.push_str(&format!(
            "💨 Ветер: {:.1} м/с, {}\n",
            report.wind_speed,
            report.wind_direction
        ));
    } else {
        text.push_str("💨 Ветер: штиль\n");
    }
    text
}

pub const FAILURE_MESSAGE: &str = "❌ Не удалось получить данные о погоде. Попробуйте позже.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::types::{Condition, MainReadings, Wind};
    use chrono::TimeZone;

    fn sample() -> CurrentWeather {
        CurrentWeather {
            dt: Utc.with_ymd_and_hms(2025, 1, 6, 5, 30, 0).unwrap().timestamp(),
            name: "Vankor".into(),
            main: MainReadings {
                temp: -31.6,
                feels_like: -40.2,
                humidity: 77.0,
                pressure: 1020.0,
            },
            weather: vec![Condition {
                main: "Snow".into(),
                description: "небольшой снег".into(),
            }],
            wind: Wind {
                speed: 4.04,
                gust: 0.0,
                deg: Some(225.0),
            },
            ..Default::default()
        }
    }

    #[test]
    fn builds_report_from_payload() {
        let location = Location::vankor_default();
        let report = CurrentReport::from_api(&location, sample());
        assert_eq!(report.location, "Ванкорское месторождение");
        assert_eq!(report.temp, -32);
        assert_eq!(report.feels_like, -40);
        assert_eq!(report.pressure_mmhg, 765);
        assert_eq!(report.wind_speed, 4.0);
        assert_eq!(report.wind_direction, "ЮЗ");
        assert_eq!(report.description, "Небольшой снег");

        let text = format_report(&report);
        assert!(text.contains("🕐 Обновлено: 6 января 2025, 12:30\n"));
        assert!(text.contains("🥶 Температура: -32°C (ощущается как -40°C)\n"));
        assert!(text.contains("📊 Давление: 765 мм рт. ст.\n"));
        assert!(text.contains("💨 Ветер: 4.0 м/с, ЮЗ\n"));
    }

    #[test]
    fn calm_and_empty_payload() {
        let mut raw = sample();
        raw.wind = Wind::default();
        raw.weather.clear();
        let report = CurrentReport::from_api(&Location::vankor_default(), raw);
        assert_eq!(report.description, "Нет данных");
        assert!(format_report(&report).contains("💨 Ветер: штиль\n"));
    }
}
