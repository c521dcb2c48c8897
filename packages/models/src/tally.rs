//! Named-entity tallies for infrastructure and water bodies.
//!
//! Points of interest are counted by distinct name, not by raw point, so
//! two stations sharing a name count once. How names are compared is
//! controlled by [`NameNormalization`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How facility names are compared when deduplicating.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NameNormalization {
    /// Raw tag value; `"City Hospital"` and `"city hospital"` are distinct.
    #[default]
    Exact,
    /// Trimmed and lowercased; the first spelling seen is reported.
    CaseInsensitive,
}

impl NameNormalization {
    fn key(self, name: &str) -> String {
        match self {
            Self::Exact => name.to_string(),
            Self::CaseInsensitive => name.trim().to_lowercase(),
        }
    }
}

/// Distinct names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    policy: NameNormalization,
    keys: BTreeSet<String>,
    names: Vec<String>,
}

impl NameSet {
    /// Creates an empty set using `policy` for comparisons.
    #[must_use]
    pub const fn new(policy: NameNormalization) -> Self {
        Self {
            policy,
            keys: BTreeSet::new(),
            names: Vec::new(),
        }
    }

    /// Adds `name`. Returns `false` if an equal name was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if !self.keys.insert(self.policy.key(name)) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no names have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Distinct names in the order they were first seen.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Consumes the set, returning the names.
    #[must_use]
    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Infrastructure categories recognised in geospatial query results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "camelCase")]
pub enum Facility {
    /// `amenity=hospital`
    Hospital,
    /// `amenity=school`
    School,
    /// `amenity=college`
    College,
    /// Mainline railway station.
    RailwayStation,
    /// Metro / subway station or entrance.
    MetroStation,
}

/// Distinct facility names around a place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfrastructureTally {
    /// Hospitals.
    pub hospitals: NameSet,
    /// Schools.
    pub schools: NameSet,
    /// Colleges.
    pub colleges: NameSet,
    /// Mainline railway stations.
    pub railway_stations: NameSet,
    /// Metro stations.
    pub metro_stations: NameSet,
}

impl InfrastructureTally {
    /// An empty tally.
    #[must_use]
    pub const fn new(policy: NameNormalization) -> Self {
        Self {
            hospitals: NameSet::new(policy),
            schools: NameSet::new(policy),
            colleges: NameSet::new(policy),
            railway_stations: NameSet::new(policy),
            metro_stations: NameSet::new(policy),
        }
    }

    /// Records a named facility. Returns `false` for a duplicate name.
    pub fn record(&mut self, facility: Facility, name: &str) -> bool {
        let set = match facility {
            Facility::Hospital => &mut self.hospitals,
            Facility::School => &mut self.schools,
            Facility::College => &mut self.colleges,
            Facility::RailwayStation => &mut self.railway_stations,
            Facility::MetroStation => &mut self.metro_stations,
        };
        set.insert(name)
    }
}

/// Water feature categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "camelCase")]
pub enum WaterKind {
    /// `waterway=river`
    River,
    /// Any other waterway or water area.
    Other,
}

/// Distinct water feature names around a place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaterBodyTally {
    /// Rivers.
    pub rivers: NameSet,
    /// Lakes, ponds, canals, streams and the like.
    pub other_water_bodies: NameSet,
}

impl WaterBodyTally {
    /// An empty tally.
    #[must_use]
    pub const fn new(policy: NameNormalization) -> Self {
        Self {
            rivers: NameSet::new(policy),
            other_water_bodies: NameSet::new(policy),
        }
    }

    /// Records a named water feature. Returns `false` for a duplicate name.
    pub fn record(&mut self, kind: WaterKind, name: &str) -> bool {
        match kind {
            WaterKind::River => self.rivers.insert(name),
            WaterKind::Other => self.other_water_bodies.insert(name),
        }
    }
}
