//! Forecast Service Integration Tests
//!
//! Week forecast and flight outlook over canned OpenWeatherMap payloads.

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use helpers::{forecast_series, CannedWeather};
use vakhta_bot::config::Location;
use vakhta_bot::weather::{
    flight, seven_day, FlightForecastService, ForecastCache, RiskLevel, SevenDayForecastService,
};

fn canned(vankor_slots: usize, igarka_slots: usize) -> Arc<CannedWeather> {
    let mut weather = CannedWeather::default();
    if vankor_slots > 0 {
        weather.forecasts.insert(
            Location::vankor_default().name,
            forecast_series(vankor_slots, 4.0, 6.0, 40.0),
        );
    }
    if igarka_slots > 0 {
        weather.forecasts.insert(
            Location::igarka_default().name,
            forecast_series(igarka_slots, 13.0, 16.0, 85.0),
        );
    }
    Arc::new(weather)
}

#[tokio::test]
async fn week_forecast_is_served_from_cache() {
    let weather = canned(40, 0);
    let service = SevenDayForecastService::new(
        weather.clone(),
        Location::vankor_default(),
        ForecastCache::new(Duration::from_secs(600)),
    );

    let first = service.get().await.unwrap();
    let second = service.get().await.unwrap();

    assert_eq!(weather.forecast_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    // 07:00 local start, five days of three-hour slots
    assert_eq!(first.days.len(), 6);
    assert_eq!(first.days[0].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
}

#[tokio::test]
async fn expired_cache_refetches() {
    let weather = canned(40, 0);
    let service = SevenDayForecastService::new(
        weather.clone(),
        Location::vankor_default(),
        ForecastCache::new(Duration::ZERO),
    );

    service.get().await.unwrap();
    service.get().await.unwrap();
    assert_eq!(weather.forecast_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn week_forecast_error_is_not_cached() {
    let weather = canned(0, 0);
    let service = SevenDayForecastService::new(
        weather.clone(),
        Location::vankor_default(),
        ForecastCache::new(Duration::from_secs(600)),
    );

    assert!(service.get().await.is_err());
    assert!(!service.cache().is_valid());
}

#[tokio::test]
async fn week_report_lists_every_day() {
    let weather = canned(40, 0);
    let service = SevenDayForecastService::new(
        weather,
        Location::vankor_default(),
        ForecastCache::new(Duration::from_secs(600)),
    );
    let forecast = service.get().await.unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let report = seven_day::format_report_for(&forecast, today);
    assert!(report.starts_with("🌍 Ванкорское месторождение\n📅 Прогноз на 7 дней\n"));
    assert!(report.contains("Сегодня"));
    assert!(report.contains("Завтра"));
    assert_eq!(report.matches("Пасмурно").count(), 6);
}

#[tokio::test]
async fn flight_outlook_scores_the_worse_end() {
    let weather = canned(24, 24);
    let service = FlightForecastService::new(
        weather.clone(),
        Location::vankor_default(),
        Location::igarka_default(),
        ForecastCache::new(Duration::from_secs(600)),
    );

    let forecast = service.get().await.unwrap();
    assert_eq!(weather.forecast_calls.load(Ordering::SeqCst), 2);
    assert_eq!(forecast.vankor_location, "Ванкорское месторождение");
    assert_eq!(forecast.igarka_location, "Игарка");
    assert_eq!(forecast.days.len(), flight::MAX_DAYS);

    let day = &forecast.days[0];
    // Igarka: wind 13 (+3), gust 16 (+3), clouds 85 (+2)
    assert_eq!(day.risk_score, 8);
    assert_eq!(day.risk, RiskLevel::NoGo);
    assert_eq!(day.reasons.len(), 3);
    assert!(RiskLevel::NoGo.comments().contains(&day.comment.as_str()));

    service.get().await.unwrap();
    assert_eq!(weather.forecast_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn flight_outlook_fails_when_either_end_fails() {
    let weather = canned(24, 0);
    let service = FlightForecastService::new(
        weather,
        Location::vankor_default(),
        Location::igarka_default(),
        ForecastCache::new(Duration::from_secs(600)),
    );

    assert!(service.get().await.is_err());
    assert!(!service.cache().is_valid());
}

#[tokio::test]
async fn flight_report_separates_days() {
    let weather = canned(24, 24);
    let service = FlightForecastService::new(
        weather,
        Location::vankor_default(),
        Location::igarka_default(),
        ForecastCache::new(Duration::from_secs(600)),
    );
    let forecast = service.get().await.unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let report = flight::format_report_for(&forecast, today);
    assert!(report.starts_with("🚁 Вероятность вылета вертолёта\n"));
    assert_eq!(report.matches(&"─".repeat(30)).count(), 2);
    assert_eq!(report.matches("🎯 Баллы риска: 8/13").count(), 3);
    assert!(report.contains("   • 💨 Сильный ветер 13.0 м/с"));
    assert!(report.contains("🌍 Игарка:"));
}
