#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the city dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types to allow independent evolution of the API
//! contract; the frontend charts, map and PDF export all read
//! [`ApiCityReport`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use city_dashboard_models::{
    AirQualitySection, InfrastructureTally, MatchedOn, ResolvedPlace, Section, SectionStatus,
    WaterBodyTally, WeatherReport, WikiSummary,
};
use serde::{Deserialize, Serialize};

/// Query parameters for the report endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityQueryParams {
    /// Free-text city name.
    pub city: Option<String>,
}

impl CityQueryParams {
    /// The trimmed city name, or `None` if absent or blank.
    #[must_use]
    pub fn city_name(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// The resolved city as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCity {
    /// City name as requested.
    pub name: String,
    /// Canonical display name from the geocoder.
    pub display_name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl From<&ResolvedPlace> for ApiCity {
    fn from(place: &ResolvedPlace) -> Self {
        Self {
            name: place.query_name.clone(),
            display_name: place.display_name.clone(),
            lat: place.lat,
            lon: place.lon,
        }
    }
}

/// Infrastructure counts with the distinct names behind them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfrastructure {
    /// Distinct hospitals.
    pub hospitals: usize,
    /// Distinct schools.
    pub schools: usize,
    /// Distinct colleges.
    pub colleges: usize,
    /// Distinct mainline railway stations.
    pub railway_stations: usize,
    /// Distinct metro stations.
    pub metro_stations: usize,
    /// Names per category.
    pub names: ApiInfrastructureNames,
}

/// See [`ApiInfrastructure::names`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfrastructureNames {
    /// Hospital names.
    pub hospitals: Vec<String>,
    /// School names.
    pub schools: Vec<String>,
    /// College names.
    pub colleges: Vec<String>,
    /// Railway station names.
    pub railway_stations: Vec<String>,
    /// Metro station names.
    pub metro_stations: Vec<String>,
}

impl From<InfrastructureTally> for ApiInfrastructure {
    fn from(tally: InfrastructureTally) -> Self {
        Self {
            hospitals: tally.hospitals.len(),
            schools: tally.schools.len(),
            colleges: tally.colleges.len(),
            railway_stations: tally.railway_stations.len(),
            metro_stations: tally.metro_stations.len(),
            names: ApiInfrastructureNames {
                hospitals: tally.hospitals.into_names(),
                schools: tally.schools.into_names(),
                colleges: tally.colleges.into_names(),
                railway_stations: tally.railway_stations.into_names(),
                metro_stations: tally.metro_stations.into_names(),
            },
        }
    }
}

/// Water feature counts with the distinct names behind them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWaterBodies {
    /// Distinct rivers.
    pub rivers: usize,
    /// Distinct other water features.
    pub other_water_bodies: usize,
    /// Names per category.
    pub names: ApiWaterBodyNames,
}

/// See [`ApiWaterBodies::names`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWaterBodyNames {
    /// River names.
    pub rivers: Vec<String>,
    /// Other water feature names.
    pub other_water_bodies: Vec<String>,
}

impl From<WaterBodyTally> for ApiWaterBodies {
    fn from(tally: WaterBodyTally) -> Self {
        Self {
            rivers: tally.rivers.len(),
            other_water_bodies: tally.other_water_bodies.len(),
            names: ApiWaterBodyNames {
                rivers: tally.rivers.into_names(),
                other_water_bodies: tally.other_water_bodies.into_names(),
            },
        }
    }
}

/// The aggregated city report.
///
/// Sections that degraded carry placeholder values (`null` or empty)
/// and are flagged in `sections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCityReport {
    /// The resolved city.
    pub city: ApiCity,
    /// Population from the local dataset.
    pub population: Option<u64>,
    /// Area from the local dataset.
    pub area: Option<f64>,
    /// Which dataset column matched.
    pub matched_on: Option<MatchedOn>,
    /// Current weather and forecast.
    pub weather: Option<WeatherReport>,
    /// Current AQI and hourly history.
    pub air_quality: AirQualitySection,
    /// Infrastructure tally.
    pub infrastructure: ApiInfrastructure,
    /// Water body tally.
    pub water_bodies: ApiWaterBodies,
    /// Encyclopedia summary.
    pub wikipedia: Option<WikiSummary>,
    /// Per-section fetch outcome.
    pub sections: BTreeMap<Section, SectionStatus>,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use city_dashboard_models::{Facility, NameNormalization, WaterKind};

    use super::*;

    #[test]
    fn blank_city_is_absent() {
        let params = CityQueryParams {
            city: Some("   ".to_string()),
        };
        assert_eq!(params.city_name(), None);
        assert_eq!(CityQueryParams::default().city_name(), None);

        let params = CityQueryParams {
            city: Some(" Delhi ".to_string()),
        };
        assert_eq!(params.city_name(), Some("Delhi"));
    }

    #[test]
    fn infrastructure_shape() {
        let mut tally = InfrastructureTally::new(NameNormalization::Exact);
        tally.record(Facility::MetroStation, "Rajiv Chowk");
        tally.record(Facility::MetroStation, "Rajiv Chowk");
        tally.record(Facility::Hospital, "AIIMS");

        let json = serde_json::to_value(ApiInfrastructure::from(tally)).unwrap();
        assert_eq!(json["metroStations"], 1);
        assert_eq!(json["hospitals"], 1);
        assert_eq!(json["railwayStations"], 0);
        assert_eq!(json["names"]["metroStations"], serde_json::json!(["Rajiv Chowk"]));
    }

    #[test]
    fn water_bodies_shape() {
        let mut tally = WaterBodyTally::new(NameNormalization::Exact);
        tally.record(WaterKind::River, "Yamuna");
        tally.record(WaterKind::Other, "Sanjay Lake");

        let json = serde_json::to_value(ApiWaterBodies::from(tally)).unwrap();
        assert_eq!(json["rivers"], 1);
        assert_eq!(json["otherWaterBodies"], 1);
        assert_eq!(json["names"]["otherWaterBodies"], serde_json::json!(["Sanjay Lake"]));
    }

    #[test]
    fn section_keys_are_snake_case() {
        let report_sections: BTreeMap<Section, SectionStatus> =
            [(Section::AirQuality, SectionStatus::ok())].into_iter().collect();
        let json = serde_json::to_value(&report_sections).unwrap();
        assert_eq!(json["air_quality"]["status"], "ok");
    }
}
