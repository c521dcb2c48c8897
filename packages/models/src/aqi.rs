//! Air quality types and the AQI category thresholds.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// AQI severity bucket.
///
/// Buckets use the upper bounds 50/100/150/200/300 (inclusive); anything
/// above 300 is [`AqiCategory::Hazardous`]. A missing reading is
/// [`AqiCategory::NoData`], which sits outside the severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
pub enum AqiCategory {
    /// 0-50
    #[serde(rename = "Good")]
    #[strum(serialize = "Good")]
    Good,
    /// 51-100
    #[serde(rename = "Moderate")]
    #[strum(serialize = "Moderate")]
    Moderate,
    /// 101-150
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    #[strum(serialize = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitive,
    /// 151-200
    #[serde(rename = "Unhealthy")]
    #[strum(serialize = "Unhealthy")]
    Unhealthy,
    /// 201-300
    #[serde(rename = "Very Unhealthy")]
    #[strum(serialize = "Very Unhealthy")]
    VeryUnhealthy,
    /// 301+
    #[serde(rename = "Hazardous")]
    #[strum(serialize = "Hazardous")]
    Hazardous,
    /// No reading available.
    #[serde(rename = "No Data")]
    #[strum(serialize = "No Data")]
    NoData,
}

impl AqiCategory {
    /// Buckets an AQI value. `None` and `NaN` map to [`Self::NoData`].
    #[must_use]
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            None => Self::NoData,
            Some(v) if v.is_nan() => Self::NoData,
            Some(v) if v <= 50.0 => Self::Good,
            Some(v) if v <= 100.0 => Self::Moderate,
            Some(v) if v <= 150.0 => Self::UnhealthyForSensitive,
            Some(v) if v <= 200.0 => Self::Unhealthy,
            Some(v) if v <= 300.0 => Self::VeryUnhealthy,
            Some(_) => Self::Hazardous,
        }
    }

    /// Position on the severity scale (0 = good, 5 = hazardous), or
    /// `None` for [`Self::NoData`].
    #[must_use]
    pub const fn severity(self) -> Option<u8> {
        match self {
            Self::Good => Some(0),
            Self::Moderate => Some(1),
            Self::UnhealthyForSensitive => Some(2),
            Self::Unhealthy => Some(3),
            Self::VeryUnhealthy => Some(4),
            Self::Hazardous => Some(5),
            Self::NoData => None,
        }
    }
}

/// Individual pollutant sub-indices reported alongside the AQI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    /// Fine particulate matter.
    pub pm25: Option<f64>,
    /// Coarse particulate matter.
    pub pm10: Option<f64>,
    /// Nitrogen dioxide.
    pub no2: Option<f64>,
    /// Sulphur dioxide.
    pub so2: Option<f64>,
    /// Ozone.
    pub o3: Option<f64>,
    /// Carbon monoxide.
    pub co: Option<f64>,
}

/// The current AQI reading for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiReading {
    /// Overall index, if the station reported one.
    pub aqi: Option<u32>,
    /// Bucket derived from `aqi`.
    pub category: AqiCategory,
    /// Per-pollutant sub-indices.
    pub pollutants: Pollutants,
    /// Pollutant driving the overall index.
    pub dominant_pollutant: Option<String>,
    /// Station observation time.
    pub time: Option<String>,
}

impl AqiReading {
    /// Builds a reading, deriving the category from `aqi`.
    #[must_use]
    pub fn new(
        aqi: Option<u32>,
        pollutants: Pollutants,
        dominant_pollutant: Option<String>,
        time: Option<String>,
    ) -> Self {
        Self {
            aqi,
            category: AqiCategory::from_value(aqi.map(f64::from)),
            pollutants,
            dominant_pollutant,
            time,
        }
    }

    /// A well-formed reading with no data.
    #[must_use]
    pub fn no_data() -> Self {
        Self::new(None, Pollutants::default(), None, None)
    }
}

/// One hourly PM2.5 sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiHistoryPoint {
    /// Sample hour (ISO 8601).
    pub timestamp: String,
    /// PM2.5 concentration in µg/m³.
    pub pm25: Option<f64>,
    /// The raw concentration bucketed with the AQI thresholds.
    pub aqi_category: AqiCategory,
}

impl AqiHistoryPoint {
    /// Builds a sample, bucketing the raw concentration.
    #[must_use]
    pub fn new(timestamp: String, pm25: Option<f64>) -> Self {
        Self {
            timestamp,
            pm25,
            aqi_category: AqiCategory::from_value(pm25),
        }
    }
}

/// Air quality section: current reading plus recent hourly history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySection {
    /// Current reading.
    #[serde(rename = "currentAQI")]
    pub current_aqi: AqiReading,
    /// Hourly history, oldest first.
    pub history: Vec<AqiHistoryPoint>,
}

impl AirQualitySection {
    /// Both halves empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            current_aqi: AqiReading::no_data(),
            history: Vec::new(),
        }
    }
}
