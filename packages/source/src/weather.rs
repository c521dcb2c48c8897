//! Open-Meteo forecast client.
//!
//! Requests current conditions plus a daily max/min temperature and
//! precipitation forecast, with the timezone detected from the
//! coordinates. No API key required.
//!
//! See <https://open-meteo.com/en/docs>

use async_trait::async_trait;
use city_dashboard_models::WeatherReport;

use crate::{SourceError, http};

const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";

/// Fetches weather for coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions and daily forecast at `lat`/`lon`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport, SourceError>;
}

/// [`WeatherProvider`] backed by the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoWeather {
    /// Creates a client for the forecast endpoint at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport, SourceError> {
        let lat = lat.to_string();
        let lon = lon.to_string();

        http::send_json(self.client.get(&self.base_url).query(&[
            ("latitude", lat.as_str()),
            ("longitude", lon.as_str()),
            ("current_weather", "true"),
            ("daily", DAILY_VARIABLES),
            ("timezone", "auto"),
        ]))
        .await
    }
}

#[cfg(test)]
mod tests {
    use city_dashboard_models::WeatherReport;

    #[test]
    fn decodes_forecast_payload() {
        let body = serde_json::json!({
            "latitude": 28.625,
            "longitude": 77.25,
            "timezone": "Asia/Kolkata",
            "current_weather": {
                "temperature": 31.4,
                "windspeed": 7.2,
                "winddirection": 290.0,
                "weathercode": 1,
                "is_day": 1,
                "time": "2024-05-01T14:00"
            },
            "daily_units": { "temperature_2m_max": "°C" },
            "daily": {
                "time": ["2024-05-01", "2024-05-02"],
                "temperature_2m_max": [38.2, null],
                "temperature_2m_min": [24.9, 25.1],
                "precipitation_sum": [0.0, 1.2]
            }
        });
        let report: WeatherReport = serde_json::from_value(body).unwrap();
        let current = report.current_weather.unwrap();
        assert!((current.temperature - 31.4).abs() < 1e-9);
        let daily = report.daily.unwrap();
        assert_eq!(daily.time.len(), 2);
        assert_eq!(daily.temperature_2m_max[1], None);
        assert_eq!(report.timezone.as_deref(), Some("Asia/Kolkata"));
    }

    #[test]
    fn serializes_upstream_key_names() {
        let report: WeatherReport = serde_json::from_value(serde_json::json!({
            "current_weather": null,
            "daily": { "time": [] }
        }))
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("current_weather").is_some());
        assert!(json.get("daily").is_some());
    }
}
