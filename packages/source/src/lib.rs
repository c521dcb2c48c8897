#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Upstream data source adapters for the city dashboard.
//!
//! Each report section is fetched through a small trait so the server
//! can swap real clients for stubs:
//!
//! - [`weather::WeatherProvider`]: current conditions and daily forecast
//! - [`air_quality::AirQualityProvider`]: current AQI and hourly history
//! - [`overpass::OverpassApi`]: geospatial queries feeding
//!   [`infrastructure`] and [`water`]
//! - [`wikipedia::EncyclopediaProvider`]: page summary
//!
//! Geospatial queries go through [`failover`], which walks a list of
//! equivalent mirrors until one answers.

pub mod air_quality;
pub mod failover;
pub mod http;
pub mod infrastructure;
pub mod overpass;
pub mod service_registry;
pub mod water;
pub mod weather;
pub mod wikipedia;

/// User agent sent to every upstream. OSM-operated services require an
/// identifying one.
pub const USER_AGENT: &str = concat!(
    "city-dashboard/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/city-dashboard/city-dashboard)"
);

/// Errors that can occur while fetching from an upstream.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The upstream answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Request URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The upstream answered successfully but reported an error in its
    /// payload.
    #[error("Upstream error: {message}")]
    Upstream {
        /// Upstream-supplied reason.
        message: String,
    },

    /// A required credential is not configured.
    #[error("No API token configured for {service}")]
    MissingToken {
        /// Service needing the token.
        service: &'static str,
    },

    /// Every candidate endpoint of a multi-endpoint fetch failed.
    #[error("All {} endpoints failed: {}", attempts.len(), attempts.join("; "))]
    AllEndpointsFailed {
        /// One `"<url>: <reason>"` entry per endpoint, in attempt order.
        attempts: Vec<String>,
    },

    /// A multi-endpoint fetch was given no endpoints.
    #[error("No endpoints configured")]
    NoEndpoints,

    /// Service configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
