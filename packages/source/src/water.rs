//! Water-body tally: rivers versus other water features.
//!
//! Uses the same radius, unnamed-element filtering and name
//! deduplication as [`crate::infrastructure`].

use city_dashboard_models::{NameNormalization, WaterBodyTally, WaterKind};

use crate::SourceError;
use crate::infrastructure::SEARCH_RADIUS_M;
use crate::overpass::{self, OverpassApi, OverpassElement};

const SELECTORS: &[&str] = &[
    r#"way["waterway"]"#,
    r#"way["natural"="water"]"#,
    r#"relation["natural"="water"]"#,
];

/// Classifies a water element. `waterway=river` is a river; any other
/// waterway or water area is [`WaterKind::Other`].
#[must_use]
pub fn classify(element: &OverpassElement) -> Option<WaterKind> {
    match element.tag("waterway") {
        Some("river") => Some(WaterKind::River),
        Some(_) => Some(WaterKind::Other),
        None if element.tag("natural") == Some("water") || element.tag("water").is_some() => {
            Some(WaterKind::Other)
        }
        None => None,
    }
}

/// Builds the Overpass query for water features around a point.
#[must_use]
pub fn query(lat: f64, lon: f64, timeout_secs: u32) -> String {
    let around = overpass::around(SEARCH_RADIUS_M, lat, lon);
    let body: String = SELECTORS
        .iter()
        .map(|selector| format!("  {selector}{around};\n"))
        .collect();
    overpass::build_query(timeout_secs, &body)
}

/// Classifies and deduplicates `elements`.
#[must_use]
pub fn tally_elements(elements: &[OverpassElement], policy: NameNormalization) -> WaterBodyTally {
    let mut tally = WaterBodyTally::new(policy);

    for element in elements {
        let Some(name) = element.name() else {
            continue;
        };
        if let Some(kind) = classify(element) {
            tally.record(kind, name);
        }
    }

    tally
}

/// Queries and tallies water bodies around a point.
///
/// # Errors
///
/// Returns [`SourceError`] if the geospatial query fails.
pub async fn fetch(
    api: &dyn OverpassApi,
    lat: f64,
    lon: f64,
    timeout_secs: u32,
    policy: NameNormalization,
) -> Result<WaterBodyTally, SourceError> {
    let elements = api.query(&query(lat, lon, timeout_secs)).await?;
    let tally = tally_elements(&elements, policy);

    log::debug!(
        "Water bodies: {} rivers, {} other",
        tally.rivers.len(),
        tally.other_water_bodies.len()
    );

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(id: u64, tags: &[(&str, &str)]) -> OverpassElement {
        OverpassElement {
            kind: "way".to_string(),
            id,
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn rivers_and_other_water() {
        assert_eq!(classify(&way(1, &[("waterway", "river")])), Some(WaterKind::River));
        assert_eq!(classify(&way(2, &[("waterway", "canal")])), Some(WaterKind::Other));
        assert_eq!(classify(&way(3, &[("natural", "water")])), Some(WaterKind::Other));
        assert_eq!(classify(&way(4, &[("water", "lake")])), Some(WaterKind::Other));
        assert_eq!(classify(&way(5, &[("highway", "primary")])), None);
    }

    #[test]
    fn river_segments_sharing_a_name_count_once() {
        let elements = [
            way(1, &[("waterway", "river"), ("name", "Yamuna")]),
            way(2, &[("waterway", "river"), ("name", "Yamuna")]),
            way(3, &[("natural", "water"), ("name", "Bhalswa Lake")]),
            way(4, &[("natural", "water")]),
        ];
        let tally = tally_elements(&elements, NameNormalization::Exact);
        assert_eq!(tally.rivers.names(), ["Yamuna"]);
        assert_eq!(tally.other_water_bodies.names(), ["Bhalswa Lake"]);
    }

    #[test]
    fn query_uses_shared_radius() {
        let q = query(28.6, 77.2, 25);
        assert!(q.contains("(around:12000,28.6,77.2)"));
        assert!(q.contains(r#"way["waterway"]"#));
    }
}
