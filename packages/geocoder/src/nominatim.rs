//! Nominatim / OpenStreetMap place search client.
//!
//! The public instance allows **1 request per second** and requires an
//! identifying `User-Agent`; the caller's [`reqwest::Client`] is expected
//! to carry one.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::GeocodeError;

/// The first place returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    /// Full display name (e.g. `"Delhi, India"`).
    pub display_name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
}

/// Searches for a city by free-form name within one country, returning
/// at most one result.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn search_city(
    client: &reqwest::Client,
    base_url: &str,
    country_code: &str,
    city: &str,
) -> Result<Option<PlaceMatch>, GeocodeError> {
    let resp = client
        .get(base_url)
        .query(&[
            ("q", city),
            ("countrycodes", country_code),
            ("format", "jsonv2"),
            ("limit", "1"),
        ])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.error_for_status()?.json().await?;
    parse_response(&body)
}

/// Parses Nominatim JSON response.
///
/// Nominatim encodes coordinates as strings; both string and numeric
/// forms are accepted.
fn parse_response(body: &serde_json::Value) -> Result<Option<PlaceMatch>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = coordinate(&first["lat"]).ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in Nominatim response".to_string(),
    })?;

    let lon = coordinate(&first["lon"]).ok_or_else(|| GeocodeError::Parse {
        message: "Missing lon in Nominatim response".to_string(),
    })?;

    let display_name = first["display_name"]
        .as_str()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing display_name in Nominatim response".to_string(),
        })?
        .to_string();

    Ok(Some(PlaceMatch {
        display_name,
        lat,
        lon,
    }))
}

fn coordinate(value: &serde_json::Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
}
