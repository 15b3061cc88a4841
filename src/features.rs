use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::weather::WeatherSnapshot;

/// Column order the flood model was trained with.
pub const FEATURE_NAMES: [&str; 6] = ["temp", "humidity", "wind_speed", "month", "hour", "is_rainy_season"];

const RAINY_MONTHS: [u32; 3] = [6, 7, 8];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector(pub [f64; 6]);

impl FeatureVector {
    pub fn assemble(weather: &WeatherSnapshot, now: NaiveDateTime) -> Self {
        let month = now.month();
        let rainy = if RAINY_MONTHS.contains(&month) { 1.0 } else { 0.0 };
        FeatureVector([
            weather.temperature_c,
            weather.humidity_pct,
            weather.wind_speed_ms,
            month as f64,
            now.hour() as f64,
            rainy,
        ])
    }

    pub fn values(&self) -> &[f64; 6] {
        &self.0
    }

    pub fn is_rainy_season(&self) -> bool {
        self.0[5] == 1.0
    }
}
