use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cost::DEFAULT_FLOOD_MULTIPLIER;
use crate::graph::Heuristic;
use crate::types::Location;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HeuristicArg {
    Zero,
    Haversine,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::Zero => Heuristic::Zero,
            HeuristicArg::Haversine => Heuristic::Haversine,
        }
    }
}

/// Flood-aware street routing service.
///
/// Two settings have no default and must be provided before the service starts:
/// `DATABASE_URL` and `OPENWEATHER_API_KEY`.
#[derive(Debug, Parser)]
#[command(name = "flood-router", version)]
pub struct Config {
    /// Postgres/PostGIS connection string holding the `nodes` and `edges` tables
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Flood model exported as JSON
    #[arg(long, env = "FLOOD_MODEL_PATH", default_value = "flood_model.json")]
    pub model_path: PathBuf,

    /// OpenWeatherMap API key, required
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: String,

    #[arg(long, env = "OPENWEATHER_URL", default_value = "https://api.openweathermap.org")]
    pub weather_url: String,

    /// Timeout for the weather request; none by default
    #[arg(long, env = "WEATHER_TIMEOUT_SECS")]
    pub weather_timeout_secs: Option<u64>,

    /// Latitude the weather is fetched for
    #[arg(long, env = "WEATHER_LATITUDE", default_value_t = 21.0245, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude the weather is fetched for
    #[arg(long, env = "WEATHER_LONGITUDE", default_value_t = 105.8412, allow_negative_numbers = true)]
    pub longitude: f64,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Edge cost multiplier applied when flooding is predicted
    #[arg(long, env = "FLOOD_PENALTY", default_value_t = DEFAULT_FLOOD_MULTIPLIER, value_parser = parse_penalty)]
    pub flood_penalty: f64,

    #[arg(long, env = "ROUTE_HEURISTIC", value_enum, default_value_t = HeuristicArg::Zero)]
    pub heuristic: HeuristicArg,
}

impl Config {
    pub fn weather_location(&self) -> Location {
        Location { latitude: self.latitude, longitude: self.longitude }
    }

    pub fn weather_timeout(&self) -> Option<Duration> {
        self.weather_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_penalty(value: &str) -> Result<f64, String> {
    let penalty: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if !penalty.is_finite() || penalty < 1.0 {
        return Err(format!("flood penalty must be a finite number >= 1, got {}", value));
    }
    Ok(penalty)
}
