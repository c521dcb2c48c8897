#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Domain types for the city dashboard.
//!
//! Every request resolves one [`ResolvedPlace`] and then fans out to the
//! data sections listed in [`Section`]. The types here are the values
//! each section produces before the server shapes them into the API
//! response.

pub mod aqi;
pub mod tally;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use aqi::{AirQualitySection, AqiCategory, AqiHistoryPoint, AqiReading, Pollutants};
pub use tally::{
    Facility, InfrastructureTally, NameNormalization, NameSet, WaterBodyTally, WaterKind,
};

/// A city name resolved to a canonical display name and coordinates.
///
/// Built once per request from the geocoder and never mutated. All
/// downstream lookups use the same `lat`/`lon` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    /// The city name exactly as the client supplied it.
    pub query_name: String,
    /// Canonical display name from the geocoder (e.g. `"Delhi, India"`).
    pub display_name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
}

impl ResolvedPlace {
    /// Returns the leading comma-delimited segment of the display name,
    /// trimmed. This is the key used for the local dataset and the
    /// encyclopedia lookup.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .map_or("", str::trim)
    }
}

/// Which dataset column produced a [`LocationStats`] match.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchedOn {
    /// The `City` column matched.
    City,
    /// The `District` column matched.
    District,
    /// The `State` column matched.
    State,
}

/// Population and area for a place, taken from the first matching row
/// of the local dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStats {
    /// Population figure from the matched row.
    pub population: u64,
    /// Area figure from the matched row (units as stored in the dataset).
    pub area: f64,
    /// Which column matched.
    pub matched_on: MatchedOn,
    /// The matched cell's value as written in the dataset.
    pub name: String,
}

/// Current conditions block of a weather forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Wind speed in km/h.
    pub windspeed: f64,
    /// Wind direction in degrees.
    pub winddirection: f64,
    /// WMO weather interpretation code.
    pub weathercode: i32,
    /// `1` during daylight, `0` at night.
    #[serde(default)]
    pub is_day: Option<u8>,
    /// Observation time (local ISO 8601 without offset).
    pub time: String,
}

/// Multi-day daily forecast, column-oriented as the forecast service
/// returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Dates (`YYYY-MM-DD`).
    #[serde(default)]
    pub time: Vec<String>,
    /// Daily maximum temperature.
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    /// Daily minimum temperature.
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    /// Daily precipitation sum in mm.
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
}

/// Weather section of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Current conditions.
    pub current_weather: Option<CurrentWeather>,
    /// Daily forecast.
    pub daily: Option<DailyForecast>,
    /// Timezone the forecast service detected for the coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Page thumbnail attached to an encyclopedia summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiThumbnail {
    /// Image URL.
    pub source: String,
    /// Width in pixels.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default)]
    pub height: Option<u32>,
}

/// Encyclopedia page summary.
///
/// Only the fields the dashboard relies on are typed; the rest of the
/// upstream object is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiSummary {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Short description line.
    #[serde(default)]
    pub description: Option<String>,
    /// Plain-text lead section.
    #[serde(default)]
    pub extract: Option<String>,
    /// Lead image, if the page has one.
    #[serde(default)]
    pub thumbnail: Option<WikiThumbnail>,
    /// Remaining upstream fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The independently fetched data sections of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    /// Population and area from the local dataset.
    Population,
    /// Current weather and forecast.
    Weather,
    /// Current AQI and hourly history.
    AirQuality,
    /// Hospitals, schools, colleges and stations.
    Infrastructure,
    /// Rivers and other water features.
    WaterBodies,
    /// Encyclopedia summary.
    Wikipedia,
}

impl Section {
    /// All sections in report order.
    pub const ALL: [Self; 6] = [
        Self::Population,
        Self::Weather,
        Self::AirQuality,
        Self::Infrastructure,
        Self::WaterBodies,
        Self::Wikipedia,
    ];
}

/// Outcome of fetching one [`Section`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    /// `ok` or `degraded`.
    pub status: SectionState,
    /// Why the section degraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionStatus {
    /// A section that produced real data.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: SectionState::Ok,
            error: None,
        }
    }

    /// A section that fell back to placeholder data.
    #[must_use]
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            status: SectionState::Degraded,
            error: Some(error.into()),
        }
    }

    /// Whether the section fell back to placeholder data.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.status == SectionState::Degraded
    }
}

/// See [`SectionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SectionState {
    /// Real data.
    Ok,
    /// Placeholder data.
    Degraded,
}
