#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! City geocoding for the dashboard.
//!
//! Resolves a free-text city name to the canonical display name and
//! coordinates every other section of a report is keyed on. Exactly one
//! upstream call is made per resolution; there is no fallback provider,
//! so an empty result is terminal for the request.

pub mod nominatim;

use async_trait::async_trait;
use city_dashboard_models::ResolvedPlace;
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The search returned no places.
    #[error("City not found: {0}")]
    NotFound(String),
}

/// Resolves city names to places.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `city` to a single place.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NotFound`] if the search has no results,
    /// or another [`GeocodeError`] if the request fails.
    async fn resolve(&self, city: &str) -> Result<ResolvedPlace, GeocodeError>;
}

/// [`Geocoder`] backed by a Nominatim search endpoint, restricted to one
/// country.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
}

impl NominatimGeocoder {
    /// Creates a geocoder querying `base_url` (e.g.
    /// `"https://nominatim.openstreetmap.org/search"`) for places in
    /// `country_code`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, country_code: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            country_code: country_code.to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, city: &str) -> Result<ResolvedPlace, GeocodeError> {
        let found =
            nominatim::search_city(&self.client, &self.base_url, &self.country_code, city).await?;

        let Some(found) = found else {
            log::info!("Nominatim returned no results for {city:?}");
            return Err(GeocodeError::NotFound(city.to_string()));
        };

        Ok(ResolvedPlace {
            query_name: city.to_string(),
            display_name: found.display_name,
            lat: found.lat,
            lon: found.lon,
        })
    }
}
