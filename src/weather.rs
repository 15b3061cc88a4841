use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use std::time::Duration;

use crate::types::Location;

/// Current conditions at the service's fixed location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather provider answered with status {0}")]
    Status(u16),
    #[error("malformed weather response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self) -> Result<WeatherSnapshot, WeatherError>;
}

// Only the fields the classifier needs; anything else in the payload is ignored.
#[derive(Deserialize)]
struct CurrentWeather {
    main: MainBlock,
    wind: WindBlock,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct WindBlock {
    speed: f64,
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, serde_json::Error> {
    let current: CurrentWeather = serde_json::from_str(body)?;
    Ok(WeatherSnapshot {
        temperature_c: current.main.temp,
        humidity_pct: current.main.humidity,
        wind_speed_ms: current.wind.speed,
    })
}

/// OpenWeatherMap "current weather" client for one fixed coordinate, metric units.
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    location: Location,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str, location: Location, timeout: Option<Duration>) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(OpenWeatherClient {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            location,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", self.location.latitude.to_string()),
                ("lon", self.location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let snapshot = parse_current(&body)?;
        log::info!(
            "Weather: {:.1}C, {}% humidity, wind {:.1} m/s",
            snapshot.temperature_c,
            snapshot.humidity_pct,
            snapshot.wind_speed_ms
        );
        Ok(snapshot)
    }
}
