//! Helicopter flight outlook for the Vankor ↔ Igarka route
//!
//! Both ends of the route are scored per local day from the worst
//! three-hour slot of that day; the day takes the worse of the two scores.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info};

use super::cache::ForecastCache;
use super::client::{WeatherError, WeatherSource};
use super::dates;
use super::format::{self, round_tenth, round_whole};
use super::types::ForecastEntry;
use crate::config::Location;

pub const FORECAST_SLOTS: u32 = 24;
pub const MAX_DAYS: usize = 3;
pub const MAX_RISK_SCORE: u32 = 13;
pub const FAILURE_MESSAGE: &str =
    "❌ Не удалось получить анализ вероятности вылета. Попробуйте позже.";

const STRONG_WIND_MS: f64 = 12.0;
const STRONG_GUST_MS: f64 = 15.0;
const DENSE_CLOUDS_PCT: f64 = 80.0;
const HEAVY_RAIN_MM: f64 = 3.0;
const EXTREME_COLD_C: f64 = -45.0;

const GO_COMMENTS: &[&str] = &[
    "Пилоты будут в восторге! 🌟 Ни ветра, ни туч, как на празднике! 🥳",
    "Погодка отличная, можно лететь! ✈️ Даже тучи ушли в отпуск 😎",
    "Ничего не мешает, летим как на шашлыки! 🚁🔥",
    "Погода лучше, чем настроение у начальника смены! 😂☀️",
    "Ветер такой слабый, что муха быстрее долетит! 🪰💨",
    "Погода ровная, как взлётная полоса. Собирай рюкзак! 🎒✈️",
    "Тридцать три корабля лавировали, а вертолёт полетит без лавирования! 🚢😂",
];

const CAUTION_COMMENTS: &[&str] = &[
    "Может быть, а может и не быть… 🤷 Как ветер перемен решит! 🌪️",
    "Пилоты будут думать дважды! 🤔 Держи вещи собранными 😄",
    "Шанс 50/50, как подбросить монетку! 🪙😅",
    "Не лучшее время, но рискнуть можно. Главное не стать мемом! 📸",
    "Ветер гуляет, не смертельно, но мешает! 🐺💨",
    "Вроде нормально, но что будет через час, никто не знает! 🕐😵",
];

const NO_GO_COMMENTS: &[&str] = &[
    "Лучше остаться на базе и пить чай! ☕",
    "Даже вертолёт подумает дважды! 🤯 Он не враг себе 😤",
    "Пилоты уже готовят объяснительные! 📝 «Это всё погода…» 😂",
    "Матушка-природа говорит «НЕТ»! 🌪️",
    "Шансы на вылет как найти иголку в стоге сена! 🪡",
    "Погладь кота, он сегодня умнее метеорологов 😼🌧️",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Go,
    Caution,
    NoGo,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=3 => RiskLevel::Go,
            4..=6 => RiskLevel::Caution,
            _ => RiskLevel::NoGo,
        }
    }

    pub fn status(self) -> &'static str {
        match self {
            RiskLevel::Go => "✅ Вылет возможен",
            RiskLevel::Caution => "⚠️ Осторожно — шанс задержки",
            RiskLevel::NoGo => "❌ Вылет НЕ рекомендуется",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            RiskLevel::Go => "✅",
            RiskLevel::Caution => "⚠️",
            RiskLevel::NoGo => "❌",
        }
    }

    pub fn comments(self) -> &'static [&'static str] {
        match self {
            RiskLevel::Go => GO_COMMENTS,
            RiskLevel::Caution => CAUTION_COMMENTS,
            RiskLevel::NoGo => NO_GO_COMMENTS,
        }
    }

    fn pick_comment(self) -> String {
        self.comments()
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default()
            .to_string()
    }
}

/// One location on one local day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDay {
    pub location: String,
    pub date: NaiveDate,
    pub date_str: String,
    pub temp_avg: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub wind_speed_max: f64,
    pub wind_gust_max: f64,
    pub cloudiness_max: i64,
    pub worst: ForecastEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAnalysis {
    pub date: NaiveDate,
    pub date_str: String,
    pub vankor: LocationDay,
    pub igarka: LocationDay,
    pub risk_score: u32,
    pub reasons: Vec<String>,
    pub risk: RiskLevel,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightForecast {
    pub vankor_location: String,
    pub igarka_location: String,
    pub days: Vec<DayAnalysis>,
    pub fetched_at: DateTime<Utc>,
}

pub struct FlightForecastService {
    source: Arc<dyn WeatherSource>,
    vankor: Location,
    igarka: Location,
    cache: ForecastCache<FlightForecast>,
}

impl FlightForecastService {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        vankor: Location,
        igarka: Location,
        cache: ForecastCache<FlightForecast>,
    ) -> Self {
        Self {
            source,
            vankor,
            igarka,
            cache,
        }
    }

    pub async fn get(&self) -> Result<FlightForecast, WeatherError> {
        if let Some(cached) = self.cache.get() {
            debug!("Returning flight forecast from cache");
            return Ok(cached);
        }

        let (vankor, igarka) = tokio::try_join!(
            self.source.forecast(&self.vankor, FORECAST_SLOTS),
            self.source.forecast(&self.igarka, FORECAST_SLOTS),
        )?;

        let forecast = FlightForecast {
            vankor_location: self.vankor.name.clone(),
            igarka_location: self.igarka.name.clone(),
            days: analyze(
                &summarize_location(&vankor.list, &self.vankor.name),
                &summarize_location(&igarka.list, &self.igarka.name),
            ),
            fetched_at: Utc::now(),
        };
        self.cache.set(forecast.clone());

        info!(days = forecast.days.len(), "Fetched flight forecast");
        Ok(forecast)
    }

    pub fn cache(&self) -> &ForecastCache<FlightForecast> {
        &self.cache
    }
}

/// Per-day summaries for one location, at most three days.
pub fn summarize_location(entries: &[ForecastEntry], location: &str) -> Vec<LocationDay> {
    dates::group_by_local_day(entries)
        .into_iter()
        .take(MAX_DAYS)
        .filter_map(|(date, slots)| {
            let worst = worst_slot(&slots)?.clone();
            let temps: Vec<f64> = slots.iter().map(|s| s.main.temp).collect();
            let whole = |v: Option<f64>| v.map(round_whole).unwrap_or(0);
            Some(LocationDay {
                location: location.to_string(),
                date,
                date_str: dates::format_day(date),
                temp_avg: whole(format::mean(&temps)),
                temp_min: whole(format::min_of(temps.iter().copied())),
                temp_max: whole(format::max_of(temps.iter().copied())),
                wind_speed_max: format::max_of(slots.iter().map(|s| s.wind.speed))
                    .map(round_tenth)
                    .unwrap_or(0.0),
                wind_gust_max: format::max_of(slots.iter().map(|s| s.wind.gust))
                    .map(round_tenth)
                    .unwrap_or(0.0),
                cloudiness_max: whole(format::max_of(slots.iter().map(|s| s.clouds.all))),
                worst,
            })
        })
        .collect()
}

/// First slot with the highest (wind speed, gust, cloudiness).
fn worst_slot<'a>(slots: &[&'a ForecastEntry]) -> Option<&'a ForecastEntry> {
    let key = |e: &ForecastEntry| (e.wind.speed, e.wind.gust, e.clouds.all);
    let mut worst: Option<&'a ForecastEntry> = None;
    for &slot in slots {
        match worst {
            Some(current) if key(slot) <= key(current) => {}
            _ => worst = Some(slot),
        }
    }
    worst
}

/// Risk points for one slot and the reasons behind them.
pub fn risk_score(entry: &ForecastEntry) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    let (main, description) = entry
        .condition()
        .map(|c| (c.main.to_lowercase(), c.description.to_lowercase()))
        .unwrap_or_default();

    if entry.wind.speed > STRONG_WIND_MS {
        score += 3;
        reasons.push(format!("💨 Сильный ветер {:.1} м/с", entry.wind.speed));
    }

    if entry.wind.gust > STRONG_GUST_MS {
        score += 3;
        reasons.push(format!("🌪️ Порывы ветра до {:.1} м/с", entry.wind.gust));
    }

    if entry.clouds.all >= DENSE_CLOUDS_PCT {
        score += 2;
        reasons.push(format!(
            "☁️ Плотная облачность {}%",
            round_whole(entry.clouds.all)
        ));
    }

    let snow_mm = entry.snow.as_ref().map_or(0.0, |s| s.three_hours);
    let rain_mm = entry.rain.as_ref().map_or(0.0, |r| r.three_hours);
    let has_snow = snow_mm > 0.0 || main == "snow" || description.contains("снег");
    let has_heavy_rain = rain_mm > HEAVY_RAIN_MM
        || description.contains("сильный")
        || description.contains("ливень")
        || main == "rain";

    if has_snow {
        score += 2;
        if snow_mm > 0.0 {
            reasons.push(format!("❄️ Снегопад ({snow_mm:.1} мм за 3ч)"));
        } else {
            reasons.push("❄️ Снег".to_string());
        }
    } else if has_heavy_rain {
        score += 2;
        if rain_mm > HEAVY_RAIN_MM {
            reasons.push(format!("🌧️ Сильный дождь ({rain_mm:.1} мм за 3ч)"));
        } else {
            reasons.push("🌧️ Сильный дождь".to_string());
        }
    }

    if entry.main.temp <= EXTREME_COLD_C {
        score += 3;
        reasons.push(format!("🥶 Экстремальный холод {:.0}°C", entry.main.temp));
    }

    (score, reasons)
}

/// Pair the two locations day by day and score each pair.
pub fn analyze(vankor: &[LocationDay], igarka: &[LocationDay]) -> Vec<DayAnalysis> {
    vankor
        .iter()
        .zip(igarka)
        .take(MAX_DAYS)
        .map(|(v, i)| {
            let (v_score, v_reasons) = risk_score(&v.worst);
            let (i_score, i_reasons) = risk_score(&i.worst);
            let score = v_score.max(i_score);

            let mut reasons: Vec<String> = Vec::new();
            for reason in v_reasons.into_iter().chain(i_reasons) {
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }

            let risk = RiskLevel::from_score(score);
            DayAnalysis {
                date: v.date,
                date_str: v.date_str.clone(),
                vankor: v.clone(),
                igarka: i.clone(),
                risk_score: score,
                reasons,
                risk,
                comment: risk.pick_comment(),
            }
        })
        .collect()
}

pub fn format_report(forecast: &FlightForecast) -> String {
    format_report_for(forecast, dates::local_today())
}

pub fn format_report_for(forecast: &FlightForecast, today: NaiveDate) -> String {
    if forecast.days.is_empty() {
        return FAILURE_MESSAGE.to_string();
    }

    let mut report = String::new();
    report.push_str("🚁 Вероятность вылета вертолёта\n");
    report.push_str(&format!(
        "📍 Маршрут: {} ↔ {}\n",
        forecast.vankor_location,
        forecast.igarka_location
    ));
    report.push_str("📅 Прогноз на 3 дня\n");
    report.push_str(&format!("🕐 Обновлено: {}\n", dates::format_updated(forecast.fetched_at)));
    report.push('\n');

    let last = forecast.days.len() - 1;
    for (n, day) in forecast.days.iter().enumerate() {
        let label = dates::day_label(day.date, today);
        report.push_str(&format!("{} {}\n", day.risk.emoji(), label));
        if label != dates::TODAY && label != dates::TOMORROW {
            report.push_str(&format!("📅 {}\n", day.date_str));
        }

        report.push_str(&format!("\n{}\n", day.risk.status()));
        report.push_str(&format!("🎯 Баллы риска: {}/{}\n\n", day.risk_score, MAX_RISK_SCORE));

        write_location(&mut report, &day.vankor);
        report.push('\n');
        write_location(&mut report, &day.igarka);

        if !day.reasons.is_empty() {
            report.push_str("\n⚠️ Причины риска:\n");
            for reason in &day.reasons {
                report.push_str(&format!("   • {reason}\n"));
            }
        }

        report.push_str(&format!("\n{}\n", day.comment));

        if n < last {
            report.push_str(&format!("\n{}\n\n", "─".repeat(30)));
        }
    }
    report
}

fn write_location(report: &mut String, day: &LocationDay) {
    report.push_str(&format!("🌍 {}:\n", day.location));
    report.push_str(&format!("   🌡️ {}°C ... {}°C\n", day.temp_min, day.temp_max));
    report.push_str(&format!("   💨 Ветер: до {:.1} м/с", day.wind_speed_max));
    if day.wind_gust_max > 0.0 {
        report.push_str(&format!(" (порывы до {:.1} м/с)", day.wind_gust_max));
    }
    report.push('\n');
    report.push_str(&format!("   ☁️ Облачность: до {}%\n", day.cloudiness_max));
}
