//! Infrastructure tally: hospitals, schools, colleges and stations
//! within a fixed radius.
//!
//! Each returned element is classified by [`RULES`], an ordered table
//! of tag predicates. The first matching rule decides the category.
//! Elements without a `name` tag are dropped before classification, and
//! names are deduplicated per category by the configured
//! [`NameNormalization`].

use city_dashboard_models::{Facility, InfrastructureTally, NameNormalization};

use crate::SourceError;
use crate::overpass::{self, OverpassApi, OverpassElement};

/// Search radius around the place, in metres.
pub const SEARCH_RADIUS_M: u32 = 12_000;

/// One classification rule.
pub struct Rule {
    /// Category assigned when `matches` holds.
    pub facility: Facility,
    /// Tag predicate.
    pub matches: fn(&OverpassElement) -> bool,
}

/// Classification rules in precedence order.
pub const RULES: &[Rule] = &[
    Rule {
        facility: Facility::Hospital,
        matches: is_hospital,
    },
    Rule {
        facility: Facility::School,
        matches: is_school,
    },
    Rule {
        facility: Facility::College,
        matches: is_college,
    },
    Rule {
        facility: Facility::RailwayStation,
        matches: is_railway_station,
    },
    Rule {
        facility: Facility::MetroStation,
        matches: is_metro_station,
    },
];

fn is_hospital(e: &OverpassElement) -> bool {
    e.tag("amenity") == Some("hospital")
}

fn is_school(e: &OverpassElement) -> bool {
    e.tag("amenity") == Some("school")
}

fn is_college(e: &OverpassElement) -> bool {
    e.tag("amenity") == Some("college")
}

fn is_railway_station(e: &OverpassElement) -> bool {
    e.tag("railway") == Some("station") && e.tag("station") != Some("subway")
}

fn is_metro_station(e: &OverpassElement) -> bool {
    e.tag("station") == Some("subway")
        || e.tag("railway") == Some("subway_entrance")
        || (e.tag("public_transport") == Some("station") && e.tag("subway") == Some("yes"))
}

/// Returns the category of the first rule `element` satisfies.
#[must_use]
pub fn classify(element: &OverpassElement) -> Option<Facility> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(element))
        .map(|rule| rule.facility)
}

/// Overpass selectors covering every rule in [`RULES`].
const SELECTORS: &[&str] = &[
    r#"nwr["amenity"="hospital"]"#,
    r#"nwr["amenity"="school"]"#,
    r#"nwr["amenity"="college"]"#,
    r#"node["railway"="station"]"#,
    r#"node["station"="subway"]"#,
    r#"node["railway"="subway_entrance"]"#,
    r#"node["public_transport"="station"]["subway"="yes"]"#,
];

/// Builds the Overpass query for every facility kind around a point.
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
pub fn tally_elements(elements: &[OverpassElement], policy: NameNormalization) -> InfrastructureTally {
    let mut tally = InfrastructureTally::new(policy);

    for element in elements {
        let Some(name) = element.name() else {
            continue;
        };
        if let Some(facility) = classify(element) {
            tally.record(facility, name);
        }
    }

    tally
}

/// Queries and tallies infrastructure around a point.
///
/// # Errors
///
/// Returns [`SourceError`] (typically [`SourceError::AllEndpointsFailed`])
/// if the geospatial query fails.
pub async fn fetch(
    api: &dyn OverpassApi,
    lat: f64,
    lon: f64,
    timeout_secs: u32,
    policy: NameNormalization,
) -> Result<InfrastructureTally, SourceError> {
    let elements = api.query(&query(lat, lon, timeout_secs)).await?;
    let tally = tally_elements(&elements, policy);

    log::debug!(
        "Infrastructure: {} hospitals, {} schools, {} colleges, {} railway, {} metro",
        tally.hospitals.len(),
        tally.schools.len(),
        tally.colleges.len(),
        tally.railway_stations.len(),
        tally.metro_stations.len(),
    );

    Ok(tally)
}
