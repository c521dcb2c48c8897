//! Compile-time registry of upstream service configurations.
//!
//! Each upstream is defined in a TOML file under `services/`. The
//! registry embeds these at compile time and exposes them via
//! [`all_services`], [`enabled_services`] and the typed
//! [`Endpoints::from_services`] view the server wires its clients from.

use serde::Deserialize;

use crate::SourceError;

/// An upstream service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Unique identifier (e.g., `"nominatim"`, `"overpass"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether the service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim place search.
    Nominatim {
        /// Search endpoint URL.
        base_url: String,
        /// ISO 3166-1 alpha-2 code results are restricted to.
        country_code: String,
    },
    /// Open-Meteo forecast API.
    OpenMeteo {
        /// Forecast endpoint URL.
        base_url: String,
    },
    /// World Air Quality Index feed.
    Waqi {
        /// API root (the `/feed/...` path is appended).
        base_url: String,
    },
    /// Open-Meteo air quality API (hourly history).
    OpenMeteoAirQuality {
        /// Air quality endpoint URL.
        base_url: String,
        /// Days of history to request.
        #[serde(default = "default_past_days")]
        past_days: u32,
    },
    /// Overpass API with mirrors.
    Overpass {
        /// Interpreter URLs in failover order.
        endpoints: Vec<String>,
        /// Server-side query timeout in seconds.
        #[serde(default = "default_overpass_timeout")]
        timeout_secs: u32,
    },
    /// Wikipedia REST API.
    Wikipedia {
        /// REST root (the `/page/summary/...` path is appended).
        base_url: String,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_past_days() -> u32 {
    1
}

const fn default_overpass_timeout() -> u32 {
    25
}

impl ServiceConfig {
    /// Every URL this service may be contacted at.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. }
            | ProviderConfig::OpenMeteo { base_url }
            | ProviderConfig::Waqi { base_url }
            | ProviderConfig::OpenMeteoAirQuality { base_url, .. }
            | ProviderConfig::Wikipedia { base_url } => vec![base_url.as_str()],
            ProviderConfig::Overpass { endpoints, .. } => {
                endpoints.iter().map(String::as_str).collect()
            }
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("open_meteo", include_str!("../services/open_meteo.toml")),
    ("waqi", include_str!("../services/waqi.toml")),
    (
        "open_meteo_air_quality",
        include_str!("../services/open_meteo_air_quality.toml"),
    ),
    ("overpass", include_str!("../services/overpass.toml")),
    ("wikipedia", include_str!("../services/wikipedia.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 6;

/// Returns all service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<ServiceConfig> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse service config '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services.
#[must_use]
pub fn enabled_services() -> Vec<ServiceConfig> {
    all_services().into_iter().filter(|s| s.enabled).collect()
}

/// Typed view of the enabled services, one field group per upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Nominatim search URL.
    pub nominatim_url: String,
    /// Country geocoding is restricted to.
    pub country_code: String,
    /// Forecast URL.
    pub forecast_url: String,
    /// WAQI API root.
    pub waqi_url: String,
    /// Air quality history URL.
    pub air_quality_url: String,
    /// Days of air quality history.
    pub air_quality_past_days: u32,
    /// Overpass mirrors in failover order.
    pub overpass_endpoints: Vec<String>,
    /// Overpass server-side timeout.
    pub overpass_timeout_secs: u32,
    /// Wikipedia REST root.
    pub wikipedia_url: String,
}

impl Endpoints {
    /// Collects the endpoints of every required upstream from `services`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if a required service is missing
    /// or disabled, or if the Overpass mirror list is empty.
    pub fn from_services(services: &[ServiceConfig]) -> Result<Self, SourceError> {
        let provider = |id: &str| {
            services
                .iter()
                .find(|s| s.enabled && s.id == id)
                .map(|s| &s.provider)
                .ok_or_else(|| SourceError::Config {
                    message: format!("service '{id}' is missing or disabled"),
                })
        };

        let ProviderConfig::Nominatim {
            base_url: nominatim_url,
            country_code,
        } = provider("nominatim")?.clone()
        else {
            return Err(mismatch("nominatim"));
        };
        let ProviderConfig::OpenMeteo {
            base_url: forecast_url,
        } = provider("open_meteo")?.clone()
        else {
            return Err(mismatch("open_meteo"));
        };
        let ProviderConfig::Waqi { base_url: waqi_url } = provider("waqi")?.clone() else {
            return Err(mismatch("waqi"));
        };
        let ProviderConfig::OpenMeteoAirQuality {
            base_url: air_quality_url,
            past_days: air_quality_past_days,
        } = provider("open_meteo_air_quality")?.clone()
        else {
            return Err(mismatch("open_meteo_air_quality"));
        };
        let ProviderConfig::Overpass {
            endpoints: overpass_endpoints,
            timeout_secs: overpass_timeout_secs,
        } = provider("overpass")?.clone()
        else {
            return Err(mismatch("overpass"));
        };
        let ProviderConfig::Wikipedia {
            base_url: wikipedia_url,
        } = provider("wikipedia")?.clone()
        else {
            return Err(mismatch("wikipedia"));
        };

        if overpass_endpoints.is_empty() {
            return Err(SourceError::Config {
                message: "overpass has no endpoints".to_string(),
            });
        }

        Ok(Self {
            nominatim_url,
            country_code,
            forecast_url,
            waqi_url,
            air_quality_url,
            air_quality_past_days,
            overpass_endpoints,
            overpass_timeout_secs,
            wikipedia_url,
        })
    }
}

fn mismatch(id: &str) -> SourceError {
    SourceError::Config {
        message: format!("service '{id}' has an unexpected provider type"),
    }
}
