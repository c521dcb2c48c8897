//! Air quality: current AQI from the World Air Quality Index feed and
//! hourly PM2.5 history from the Open-Meteo air quality API.
//!
//! The two halves are fetched independently by [`aggregate`], which
//! never fails. A failing half is replaced with its empty form
//! ([`AqiReading::no_data`] or an empty history) and reported in
//! [`AirQualityOutcome::failures`].
//!
//! See <https://aqicn.org/json-api/doc/> and
//! <https://open-meteo.com/en/docs/air-quality-api>

use async_trait::async_trait;
use city_dashboard_models::{AirQualitySection, AqiHistoryPoint, AqiReading, Pollutants};

use crate::{SourceError, http};

/// Fetches air quality for coordinates.
#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// Current AQI reading at the station nearest `lat`/`lon`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the feed reports
    /// an error.
    async fn current(&self, lat: f64, lon: f64) -> Result<AqiReading, SourceError>;

    /// Hourly PM2.5 samples at `lat`/`lon`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn history(&self, lat: f64, lon: f64) -> Result<Vec<AqiHistoryPoint>, SourceError>;
}

/// [`AirQualityProvider`] over WAQI (current) and Open-Meteo (history).
#[derive(Debug, Clone)]
pub struct AirQualityClient {
    client: reqwest::Client,
    waqi_url: String,
    waqi_token: Option<String>,
    history_url: String,
    past_days: u32,
}

impl AirQualityClient {
    /// Creates a client. Without `waqi_token` every current-AQI lookup
    /// fails with [`SourceError::MissingToken`].
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        waqi_url: &str,
        waqi_token: Option<String>,
        history_url: &str,
        past_days: u32,
    ) -> Self {
        Self {
            client,
            waqi_url: waqi_url.trim_end_matches('/').to_string(),
            waqi_token,
            history_url: history_url.to_string(),
            past_days,
        }
    }
}

#[async_trait]
impl AirQualityProvider for AirQualityClient {
    async fn current(&self, lat: f64, lon: f64) -> Result<AqiReading, SourceError> {
        let token = self
            .waqi_token
            .as_deref()
            .ok_or(SourceError::MissingToken { service: "waqi" })?;

        let url = format!("{}/feed/geo:{lat};{lon}/", self.waqi_url);
        let body: serde_json::Value =
            http::send_json(self.client.get(&url).query(&[("token", token)])).await?;

        parse_feed(&body)
    }

    async fn history(&self, lat: f64, lon: f64) -> Result<Vec<AqiHistoryPoint>, SourceError> {
        let lat = lat.to_string();
        let lon = lon.to_string();
        let past_days = self.past_days.to_string();

        let body: serde_json::Value = http::send_json(self.client.get(&self.history_url).query(&[
            ("latitude", lat.as_str()),
            ("longitude", lon.as_str()),
            ("hourly", "pm2_5"),
            ("past_days", past_days.as_str()),
            ("forecast_days", "1"),
        ]))
        .await?;

        parse_history(&body)
    }
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityOutcome {
    /// Always well-formed, possibly empty.
    pub section: AirQualitySection,
    /// One message per half that fell back to its empty form.
    pub failures: Vec<String>,
}

/// Fetches both halves concurrently and combines them.
pub async fn aggregate(provider: &dyn AirQualityProvider, lat: f64, lon: f64) -> AirQualityOutcome {
    let (current, history) = tokio::join!(provider.current(lat, lon), provider.history(lat, lon));
    let mut failures = Vec::new();

    let current_aqi = current.unwrap_or_else(|e| {
        log::warn!("Current AQI unavailable for ({lat}, {lon}): {e}");
        failures.push(format!("current AQI: {e}"));
        AqiReading::no_data()
    });

    let history = history.unwrap_or_else(|e| {
        log::warn!("AQI history unavailable for ({lat}, {lon}): {e}");
        failures.push(format!("AQI history: {e}"));
        Vec::new()
    });

    AirQualityOutcome {
        section: AirQualitySection {
            current_aqi,
            history,
        },
        failures,
    }
}

/// Parses a WAQI `/feed` response.
fn parse_feed(body: &serde_json::Value) -> Result<AqiReading, SourceError> {
    if body["status"].as_str() != Some("ok") {
        let message = body["data"]
            .as_str()
            .or_else(|| body["status"].as_str())
            .unwrap_or("missing status")
            .to_string();
        return Err(SourceError::Upstream { message });
    }

    let data = &body["data"];

    // Stations without a current reading report "-".
    let aqi = data["aqi"]
        .as_u64()
        .or_else(|| data["aqi"].as_str().and_then(|s| s.trim().parse().ok()))
        .and_then(|v| u32::try_from(v).ok());

    let iaqi = |key: &str| data["iaqi"][key]["v"].as_f64();
    let pollutants = Pollutants {
        pm25: iaqi("pm25"),
        pm10: iaqi("pm10"),
        no2: iaqi("no2"),
        so2: iaqi("so2"),
        o3: iaqi("o3"),
        co: iaqi("co"),
    };

    let dominant_pollutant = data["dominentpol"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from);

    let time = data["time"]["iso"]
        .as_str()
        .or_else(|| data["time"]["s"].as_str())
        .map(String::from);

    Ok(AqiReading::new(aqi, pollutants, dominant_pollutant, time))
}

/// Parses an Open-Meteo air quality response into hourly samples.
fn parse_history(body: &serde_json::Value) -> Result<Vec<AqiHistoryPoint>, SourceError> {
    let hourly = &body["hourly"];
    let times = hourly["time"].as_array().ok_or_else(|| SourceError::Upstream {
        message: "air quality response has no hourly.time".to_string(),
    })?;
    let values = hourly["pm2_5"].as_array().ok_or_else(|| SourceError::Upstream {
        message: "air quality response has no hourly.pm2_5".to_string(),
    })?;

    Ok(times
        .iter()
        .zip(values)
        .filter_map(|(time, value)| {
            time.as_str()
                .map(|t| AqiHistoryPoint::new(t.to_string(), value.as_f64()))
        })
        .collect())
}
