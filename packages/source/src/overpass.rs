//! Overpass API client (OpenStreetMap geospatial queries).
//!
//! Queries are POSTed as `application/x-www-form-urlencoded` with the
//! Overpass QL in the `data` field. The client walks its mirror list via
//! [`crate::failover`].
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API>

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{SourceError, failover, http};

/// OSM tag map of one element.
pub type Tags = BTreeMap<String, String>;

/// One element of an Overpass response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverpassElement {
    /// `node`, `way` or `relation`.
    #[serde(rename = "type")]
    pub kind: String,
    /// OSM id.
    pub id: u64,
    /// Element tags; absent when the element has none.
    #[serde(default)]
    pub tags: Tags,
}

impl OverpassElement {
    /// The element's `name` tag, if present and non-empty.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str).filter(|n| !n.is_empty())
    }

    /// The value of tag `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

/// Executes Overpass QL queries.
#[async_trait]
pub trait OverpassApi: Send + Sync {
    /// Runs `query` and returns the matched elements.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if no endpoint produced a usable response.
    async fn query(&self, query: &str) -> Result<Vec<OverpassElement>, SourceError>;
}

/// [`OverpassApi`] over a list of mirrored interpreter endpoints.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl OverpassClient {
    /// Creates a client trying `endpoints` in order.
    #[must_use]
    pub const fn new(client: reqwest::Client, endpoints: Vec<String>) -> Self {
        Self { client, endpoints }
    }
}

#[async_trait]
impl OverpassApi for OverpassClient {
    async fn query(&self, query: &str) -> Result<Vec<OverpassElement>, SourceError> {
        let response: OverpassResponse =
            failover::fetch_with_failover(&self.endpoints, |url| {
                http::send_json(
                    self.client
                        .post(url)
                        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
                        .form(&[("data", query)]),
                )
            })
            .await?;

        log::debug!("Overpass returned {} elements", response.elements.len());
        Ok(response.elements)
    }
}

/// Wraps `body` statements in a JSON-output query that returns tags only.
#[must_use]
pub fn build_query(timeout_secs: u32, body: &str) -> String {
    format!("[out:json][timeout:{timeout_secs}];\n(\n{body});\nout tags;")
}

/// Formats an `around` filter for `radius_m` metres around a point.
#[must_use]
pub fn around(radius_m: u32, lat: f64, lon: f64) -> String {
    format!("(around:{radius_m},{lat},{lon})")
}
