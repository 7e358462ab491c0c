//! Runtime configuration
//!
//! Everything is read from the process environment (after `.env` has been
//! loaded by the binary). Only the bot token is mandatory.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_DATABASE_PATH: &str = "data/bot.db";
pub const DEFAULT_FORECAST_CACHE_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set in the environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// A named point the weather services query.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn vankor_default() -> Self {
        Self::new("Ванкорское месторождение", 69.5, 88.0)
    }

    pub fn igarka_default() -> Self {
        Self::new("Игарка", 67.4, 86.6)
    }
}

/// Weather API settings shared by all weather services
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub cache_ttl: Duration,
    /// Main location: the oil field itself
    pub vankor: Location,
    /// Other end of the helicopter route
    pub igarka: Location,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WEATHER_API_URL.to_string(),
            api_key: None,
            cache_ttl: Duration::from_secs(DEFAULT_FORECAST_CACHE_SECS),
            vankor: Location::vankor_default(),
            igarka: Location::igarka_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub database_path: PathBuf,
    pub weather: WeatherConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let defaults = WeatherConfig::default();
        let vankor = Location {
            name: get("VANKOR_NAME").unwrap_or(defaults.vankor.name),
            latitude: parse_or(&get, "VANKOR_LATITUDE", defaults.vankor.latitude)?,
            longitude: parse_or(&get, "VANKOR_LONGITUDE", defaults.vankor.longitude)?,
        };
        let igarka = Location {
            name: get("IGARKA_NAME").unwrap_or(defaults.igarka.name),
            latitude: parse_or(&get, "IGARKA_LATITUDE", defaults.igarka.latitude)?,
            longitude: parse_or(&get, "IGARKA_LONGITUDE", defaults.igarka.longitude)?,
        };
        let cache_secs = parse_or(&get, "FORECAST_CACHE_SECS", DEFAULT_FORECAST_CACHE_SECS)?;

        Ok(Self {
            telegram_token,
            telegram_api_url: url_or(&get, "TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL)?,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            weather: WeatherConfig {
                api_url: url_or(&get, "WEATHER_API_URL", &defaults.api_url)?,
                api_key: get("WEATHER_API_KEY"),
                cache_ttl: Duration::from_secs(cache_secs),
                vankor,
                igarka,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// Base URL for an HTTP API; must be absolute http(s).
fn url_or<G>(get: &G, name: &'static str, default: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(value) = get(name) else {
        return Ok(default.to_string());
    };
    match url::Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            Ok(value.trim().trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = BotConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));

        let err = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = BotConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.database_path, PathBuf::from("data/bot.db"));
        assert_eq!(config.weather.api_key, None);
        assert_eq!(config.weather.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.weather.vankor, Location::vankor_default());
        assert_eq!(config.weather.igarka.name, "Игарка");
    }

    #[test]
    fn overrides_and_invalid_numbers() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("WEATHER_API_KEY", "k"),
            ("VANKOR_LATITUDE", "70.1"),
            ("FORECAST_CACHE_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("k"));
        assert_eq!(config.weather.vankor.latitude, 70.1);
        assert_eq!(config.weather.cache_ttl, Duration::from_secs(60));

        let err = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("IGARKA_LONGITUDE", "east"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "IGARKA_LONGITUDE has an invalid value 'east'");
    }

    #[test]
    fn api_urls_must_be_http() {
        let config = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_API_URL", "http://localhost:8081/"),
        ]))
        .unwrap();
        assert_eq!(config.telegram_api_url, "http://localhost:8081");

        let err = BotConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("WEATHER_API_URL", "api.openweathermap.org"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "WEATHER_API_URL", .. }));
    }
}
