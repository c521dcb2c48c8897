//! Assembles a city report from the geocoder, the local dataset and the
//! upstream sources.
//!
//! Geocoding runs first; every other section depends on its coordinates
//! and all six are then fetched concurrently. Each section either yields
//! data or fails. Failures of sections listed in
//! [`ReportOptions::degradable`] are replaced with a placeholder and
//! flagged in the report's `sections` manifest; any other failure aborts
//! the whole report.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use city_dashboard_dataset::{DatasetError, LocationDataset};
use city_dashboard_geocoder::{GeocodeError, Geocoder};
use city_dashboard_models::{
    AirQualitySection, InfrastructureTally, NameNormalization, Section, SectionStatus,
    WaterBodyTally,
};
use city_dashboard_server_models::{ApiCity, ApiCityReport};
use city_dashboard_source::SourceError;
use city_dashboard_source::air_quality::{self, AirQualityProvider};
use city_dashboard_source::infrastructure;
use city_dashboard_source::overpass::OverpassApi;
use city_dashboard_source::water;
use city_dashboard_source::weather::WeatherProvider;
use city_dashboard_source::wikipedia::EncyclopediaProvider;

/// Request-level failures.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A required query parameter is absent or blank.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The geocoder found no place.
    #[error("City not found: {0}")]
    NotFound(String),

    /// The local dataset has no row for the place.
    #[error("No location data found for {0}")]
    NoLocationData(String),

    /// Every mirror of a multi-endpoint source failed.
    #[error("{0}")]
    AllEndpointsFailed(String),

    /// A single-endpoint upstream or the local dataset failed.
    #[error("{0}")]
    UpstreamTransport(String),

    /// Assembly did not finish in time.
    #[error("Report not ready within {} seconds", .0.as_secs())]
    DeadlineExceeded(Duration),
}

impl From<GeocodeError> for ReportError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::NotFound(city) => Self::NotFound(city),
            e => Self::UpstreamTransport(e.to_string()),
        }
    }
}

impl From<DatasetError> for ReportError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::NoLocationData(name) => Self::NoLocationData(name),
            e => Self::UpstreamTransport(e.to_string()),
        }
    }
}

impl From<SourceError> for ReportError {
    fn from(e: SourceError) -> Self {
        match e {
            e @ SourceError::AllEndpointsFailed { .. } => Self::AllEndpointsFailed(e.to_string()),
            e => Self::UpstreamTransport(e.to_string()),
        }
    }
}

/// The collaborators a report is built from.
#[derive(Clone)]
pub struct Providers {
    /// Resolves the requested city.
    pub geocoder: Arc<dyn Geocoder>,
    /// Population and area.
    pub dataset: Arc<dyn LocationDataset>,
    /// Weather.
    pub weather: Arc<dyn WeatherProvider>,
    /// Current AQI and history.
    pub air_quality: Arc<dyn AirQualityProvider>,
    /// Geospatial queries for infrastructure and water bodies.
    pub overpass: Arc<dyn OverpassApi>,
    /// Encyclopedia summaries.
    pub encyclopedia: Arc<dyn EncyclopediaProvider>,
}

/// How a report is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Sections whose failure yields a placeholder instead of an error.
    pub degradable: BTreeSet<Section>,
    /// How facility and water-body names are deduplicated.
    pub name_normalization: NameNormalization,
    /// Server-side timeout sent with geospatial queries.
    pub overpass_timeout_secs: u32,
    /// Bound on the whole assembly, geocoding included.
    pub deadline: Duration,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            degradable: BTreeSet::from([Section::AirQuality]),
            name_normalization: NameNormalization::Exact,
            overpass_timeout_secs: 25,
            deadline: Duration::from_secs(60),
        }
    }
}

/// Builds the report for `city`.
///
/// # Errors
///
/// * [`ReportError::MissingParameter`] if `city` is `None`; nothing is
///   fetched in that case
/// * [`ReportError::DeadlineExceeded`] if assembly outlives
///   [`ReportOptions::deadline`]
/// * any other [`ReportError`] from geocoding or a non-degradable section
pub async fn build_report(
    providers: &Providers,
    options: &ReportOptions,
    city: Option<&str>,
) -> Result<ApiCityReport, ReportError> {
    let city = city.ok_or(ReportError::MissingParameter("city"))?;

    tokio::time::timeout(options.deadline, assemble(providers, options, city))
        .await
        .map_err(|_| ReportError::DeadlineExceeded(options.deadline))?
}

async fn assemble(
    providers: &Providers,
    options: &ReportOptions,
    city: &str,
) -> Result<ApiCityReport, ReportError> {
    let place = providers.geocoder.resolve(city).await?;
    let (lat, lon) = (place.lat, place.lon);
    let short_name = place.short_name();
    let policy = options.name_normalization;
    let timeout_secs = options.overpass_timeout_secs;

    log::debug!(
        "Resolved {city:?} to {:?} ({lat}, {lon})",
        place.display_name
    );

    let (stats, weather, air_quality, infrastructure, water_bodies, wikipedia) = tokio::join!(
        providers.dataset.lookup(short_name),
        providers.weather.forecast(lat, lon),
        air_quality::aggregate(providers.air_quality.as_ref(), lat, lon),
        infrastructure::fetch(providers.overpass.as_ref(), lat, lon, timeout_secs, policy),
        water::fetch(providers.overpass.as_ref(), lat, lon, timeout_secs, policy),
        providers.encyclopedia.summary(short_name),
    );

    let mut sections = Sections::new(&options.degradable);

    let stats = sections.settle(Section::Population, stats)?;
    let weather = sections.settle(Section::Weather, weather)?;
    let air_quality = if air_quality.failures.is_empty() {
        sections.settle(Section::AirQuality, Ok::<_, ReportError>(air_quality.section))?
    } else {
        let message = air_quality.failures.join("; ");
        sections
            .settle(
                Section::AirQuality,
                Err::<AirQualitySection, _>(ReportError::UpstreamTransport(message)),
            )?
            .or(Some(air_quality.section))
    };
    let infrastructure = sections
        .settle(Section::Infrastructure, infrastructure)?
        .unwrap_or_else(|| InfrastructureTally::new(policy));
    let water_bodies = sections
        .settle(Section::WaterBodies, water_bodies)?
        .unwrap_or_else(|| WaterBodyTally::new(policy));
    let wikipedia = sections.settle(Section::Wikipedia, wikipedia)?;

    Ok(ApiCityReport {
        city: ApiCity::from(&place),
        population: stats.as_ref().map(|s| s.population),
        area: stats.as_ref().map(|s| s.area),
        matched_on: stats.as_ref().map(|s| s.matched_on),
        weather,
        air_quality: air_quality.unwrap_or_else(AirQualitySection::empty),
        infrastructure: infrastructure.into(),
        water_bodies: water_bodies.into(),
        wikipedia,
        sections: sections.into_statuses(),
        generated_at: chrono::Utc::now(),
    })
}

/// Applies the failure policy and records each section's status.
struct Sections<'a> {
    degradable: &'a BTreeSet<Section>,
    statuses: BTreeMap<Section, SectionStatus>,
}

impl<'a> Sections<'a> {
    const fn new(degradable: &'a BTreeSet<Section>) -> Self {
        Self {
            degradable,
            statuses: BTreeMap::new(),
        }
    }

    /// `Ok(Some)` on success, `Ok(None)` for a degraded section, or the
    /// section's error if it may not degrade.
    fn settle<T, E: Into<ReportError>>(
        &mut self,
        section: Section,
        result: Result<T, E>,
    ) -> Result<Option<T>, ReportError> {
        match result {
            Ok(value) => {
                self.statuses.insert(section, SectionStatus::ok());
                Ok(Some(value))
            }
            Err(e) => {
                let e = e.into();
                if !self.degradable.contains(&section) {
                    return Err(e);
                }
                log::warn!("Section {section} degraded: {e}");
                self.statuses
                    .insert(section, SectionStatus::degraded(e.to_string()));
                Ok(None)
            }
        }
    }

    fn into_statuses(self) -> BTreeMap<Section, SectionStatus> {
        self.statuses
    }
}
