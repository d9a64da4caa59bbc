//! Weather forecast records.
//!
//! The demo app's weather endpoint fires a [`crate::events::EventPayload::StoreWeatherHistory`]
//! event for every forecast it serves; the handler persists a
//! [`WeatherRequestHistory`] row through [`crate::services::WeatherService`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single served weather forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

impl WeatherForecast {
    pub fn new(date: NaiveDate, temperature_c: i32, summary: Option<String>) -> Self {
        Self {
            date,
            temperature_c,
            summary,
        }
    }

    /// Fahrenheit projection, matching the conversion the API reports.
    pub fn temperature_f(&self) -> i32 {
        32 + (self.temperature_c as f64 / 0.5556) as i32
    }
}

/// History record persisted for every served forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRequestHistory {
    pub request_time: DateTime<Utc>,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
}

impl WeatherRequestHistory {
    pub fn from_forecast(forecast: &WeatherForecast) -> Self {
        Self {
            request_time: Utc::now(),
            temperature_c: forecast.temperature_c,
            temperature_f: forecast.temperature_f(),
            summary: forecast.summary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_conversion_matches_reported_formula() {
        let forecast = WeatherForecast::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            20,
            Some("Mild".to_string()),
        );
        assert_eq!(forecast.temperature_f(), 32 + (20.0 / 0.5556) as i32);
    }

    #[test]
    fn history_snapshot_copies_forecast_fields() {
        let forecast = WeatherForecast::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 0, None);
        let history = WeatherRequestHistory::from_forecast(&forecast);
        assert_eq!(history.temperature_c, 0);
        assert_eq!(history.temperature_f, 32);
        assert_eq!(history.summary, None);
    }
}
