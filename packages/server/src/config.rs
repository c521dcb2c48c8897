//! Runtime configuration read from the environment at startup.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use city_dashboard_models::{NameNormalization, Section};

/// Errors from reading [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `BIND_ADDR`.
    pub bind_addr: String,
    /// `PORT`.
    pub port: u16,
    /// `CORS_ORIGIN`; permissive CORS when unset.
    pub cors_origin: Option<String>,
    /// `WAQI_TOKEN`.
    pub waqi_token: Option<String>,
    /// `LOCATION_DATASET`.
    pub dataset_path: PathBuf,
    /// `RATE_LIMIT_MAX`: requests allowed per client per window.
    pub rate_limit_max: u32,
    /// `RATE_LIMIT_WINDOW_SECS`.
    pub rate_limit_window: Duration,
    /// `TRUST_FORWARDED_FOR`: rate limit by `Forwarded`/`X-Forwarded-For`
    /// rather than the socket peer. Only safe behind a proxy that
    /// overwrites those headers.
    pub trust_forwarded_for: bool,
    /// `UPSTREAM_TIMEOUT_SECS`: per-call timeout on the HTTP client.
    pub upstream_timeout: Duration,
    /// `REQUEST_DEADLINE_SECS`: bound on assembling one report.
    pub request_deadline: Duration,
    /// `DEGRADABLE_SECTIONS`.
    pub degradable: BTreeSet<Section>,
    /// `NAME_NORMALIZATION`.
    pub name_normalization: NameNormalization,
    /// `STATIC_DIR`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            cors_origin: None,
            waqi_token: None,
            dataset_path: PathBuf::from("data/locations.csv"),
            rate_limit_max: 50,
            rate_limit_window: Duration::from_secs(15 * 60),
            trust_forwarded_for: false,
            upstream_timeout: Duration::from_secs(30),
            request_deadline: Duration::from_secs(60),
            degradable: BTreeSet::from([Section::AirQuality]),
            name_normalization: NameNormalization::Exact,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparseable
    /// value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset and blank
    /// variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparseable
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parsed(&var, "PORT")?.unwrap_or(defaults.port),
            cors_origin: var("CORS_ORIGIN"),
            waqi_token: var("WAQI_TOKEN"),
            dataset_path: var("LOCATION_DATASET").map_or(defaults.dataset_path, PathBuf::from),
            rate_limit_max: parsed(&var, "RATE_LIMIT_MAX")?.unwrap_or(defaults.rate_limit_max),
            rate_limit_window: parsed(&var, "RATE_LIMIT_WINDOW_SECS")?
                .map_or(defaults.rate_limit_window, Duration::from_secs),
            trust_forwarded_for: parsed(&var, "TRUST_FORWARDED_FOR")?
                .unwrap_or(defaults.trust_forwarded_for),
            upstream_timeout: parsed(&var, "UPSTREAM_TIMEOUT_SECS")?
                .map_or(defaults.upstream_timeout, Duration::from_secs),
            request_deadline: parsed(&var, "REQUEST_DEADLINE_SECS")?
                .map_or(defaults.request_deadline, Duration::from_secs),
            degradable: match var("DEGRADABLE_SECTIONS") {
                Some(value) => parse_sections(&value)?,
                None => defaults.degradable,
            },
            name_normalization: parsed(&var, "NAME_NORMALIZATION")?
                .unwrap_or(defaults.name_normalization),
            static_dir: var("STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parsed<T>(
    var: impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|value| {
            value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

/// Parses `all`, `none` or a comma-separated list of section names.
fn parse_sections(value: &str) -> Result<BTreeSet<Section>, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "all" => return Ok(Section::ALL.into_iter().collect()),
        "none" => return Ok(BTreeSet::new()),
        _ => {}
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            name.parse::<Section>()
                .map_err(|e| ConfigError::Invalid {
                    key: "DEGRADABLE_SECTIONS",
                    value: value.to_string(),
                    reason: format!("{name:?}: {e}"),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.rate_limit_max, 50);
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert_eq!(config.degradable, BTreeSet::from([Section::AirQuality]));
        assert!(!config.trust_forwarded_for);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "3000"),
            ("WAQI_TOKEN", " secret "),
            ("RATE_LIMIT_MAX", "5"),
            ("DEGRADABLE_SECTIONS", "weather, wikipedia"),
            ("NAME_NORMALIZATION", "case_insensitive"),
            ("CORS_ORIGIN", ""),
            ("TRUST_FORWARDED_FOR", "true"),
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.waqi_token.as_deref(), Some("secret"));
        assert_eq!(config.rate_limit_max, 5);
        assert_eq!(
            config.degradable,
            BTreeSet::from([Section::Weather, Section::Wikipedia])
        );
        assert_eq!(config.name_normalization, NameNormalization::CaseInsensitive);
        assert_eq!(config.cors_origin, None);
        assert!(config.trust_forwarded_for);
    }

    #[test]
    fn all_and_none_sections() {
        assert_eq!(
            config(&[("DEGRADABLE_SECTIONS", "ALL")]).unwrap().degradable.len(),
            Section::ALL.len()
        );
        assert!(
            config(&[("DEGRADABLE_SECTIONS", "none")])
                .unwrap()
                .degradable
                .is_empty()
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("DEGRADABLE_SECTIONS", "weather,geocoding")]),
            Err(ConfigError::Invalid {
                key: "DEGRADABLE_SECTIONS",
                ..
            })
        ));
        assert!(config(&[("NAME_NORMALIZATION", "fuzzy")]).is_err());
        assert!(matches!(
            config(&[("TRUST_FORWARDED_FOR", "yes")]),
            Err(ConfigError::Invalid {
                key: "TRUST_FORWARDED_FOR",
                ..
            })
        ));
    }
}
