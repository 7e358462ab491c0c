//! Weather: OpenWeatherMap access and the three reports built on it
//!
//! - [`current`] conditions at the field right now
//! - [`seven_day`] week-ahead forecast, cached
//! - [`flight`] helicopter go/no-go outlook for Vankor ↔ Igarka, cached

pub mod cache;
pub mod client;
pub mod current;
pub mod dates;
pub mod flight;
pub mod format;
pub mod seven_day;
pub mod types;

pub use cache::ForecastCache;
pub use client::{OpenWeatherClient, WeatherError, WeatherSource};
pub use current::{CurrentReport, CurrentWeatherService};
pub use flight::{FlightForecast, FlightForecastService, RiskLevel};
pub use seven_day::{SevenDayForecastService, WeekForecast};
