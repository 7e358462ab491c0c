//! OpenWeatherMap 2.5 response shapes
//!
//! Only the fields the bot reads are modelled; everything is defaulted so a
//! sparse entry still deserializes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub pressure: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub gust: f64,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: f64,
}

/// Precipitation volume, mm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default)]
    pub one_hour: f64,
    #[serde(rename = "3h", default)]
    pub three_hours: f64,
}

/// One three-hour slot of `/forecast`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    #[serde(default)]
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    pub rain: Option<Precipitation>,
    pub snow: Option<Precipitation>,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

/// `/weather` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub dt: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    pub visibility: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sparse_forecast_entry() {
        let json = r#"{
            "list": [
                {"dt": 1700000000, "main": {"temp": -31.4, "humidity": 80},
                 "weather": [{"main": "Snow", "description": "небольшой снег"}],
                 "wind": {"speed": 7.2, "deg": 200}, "snow": {"3h": 0.4}},
                {"dt": 1700010800}
            ]
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.list.len(), 2);
        let first = &parsed.list[0];
        assert_eq!(first.main.temp, -31.4);
        assert_eq!(first.wind.gust, 0.0);
        assert_eq!(first.wind.deg, Some(200.0));
        assert_eq!(first.snow.as_ref().map(|s| s.three_hours), Some(0.4));
        assert_eq!(first.condition().map(|c| c.main.as_str()), Some("Snow"));
        assert!(parsed.list[1].condition().is_none());
        assert!(parsed.list[1].rain.is_none());
    }
}
