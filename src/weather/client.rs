//! OpenWeatherMap API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::types::{CurrentWeather, ForecastResponse};
use crate::config::{Location, WeatherConfig};

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("WEATHER_API_KEY is not configured")]
    MissingApiKey,

    #[error("weather API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("weather API request failed: {0}")]
    Network(reqwest::Error),

    #[error("failed to build weather client: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        // the query string carries the API key
        WeatherError::Network(err.without_url())
    }
}

/// Source of raw weather data.
///
/// Services only see this trait, so they can be fed canned responses.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, location: &Location) -> Result<CurrentWeather, WeatherError>;

    /// Three-hour slots, at most `count` of them
    async fn forecast(
        &self,
        location: &Location,
        count: u32,
    ) -> Result<ForecastResponse, WeatherError>;
}

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WeatherError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<T>(
        &self,
        endpoint: &str,
        location: &Location,
        extra: &[(&str, String)],
    ) -> Result<T, WeatherError>
    where
        T: serde::de::DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query: Vec<(&str, String)> = vec![
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("appid", api_key.to_string()),
            ("units", "metric".to_string()),
            ("lang", "ru".to_string()),
        ];
        query.extend(extra.iter().cloned());

        debug!(endpoint, location = %location.name, "Requesting weather data");
        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, location: &Location) -> Result<CurrentWeather, WeatherError> {
        self.get_json("weather", location, &[]).await
    }

    async fn forecast(
        &self,
        location: &Location,
        count: u32,
    ) -> Result<ForecastResponse, WeatherError> {
        self.get_json("forecast", location, &[("cnt", count.to_string())])
            .await
    }
}
