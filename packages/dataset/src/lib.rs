#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population and area lookup over a flat location dataset.
//!
//! The dataset is a CSV file with (at least) `City`, `District`, `State`,
//! `Population` and `Area` columns. A lookup streams the file row by row
//! and stops at the first row where the city, district or state cell
//! equals the query (case-insensitive, trimmed). Columns are checked in
//! that order within a row, so a row matching on `City` reports
//! [`MatchedOn::City`] even if its `State` cell also matches.
//!
//! Rows after the first match are never read. The file handle lives in
//! the reader built by [`scan_file`] and is closed when that function
//! returns, whichever way it returns.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use city_dashboard_models::{LocationStats, MatchedOn};

/// Errors from dataset lookups.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The dataset file could not be opened.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Dataset path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A row could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Dataset is missing the {0} column")]
    MissingColumn(&'static str),

    /// The matched row holds a value that is not a number.
    #[error("Invalid {column} value {value:?} on row {row}")]
    InvalidValue {
        /// 1-based data row number.
        row: u64,
        /// Column name.
        column: &'static str,
        /// Raw cell contents.
        value: String,
    },

    /// The whole file was scanned without a match.
    #[error("No location data found for {0}")]
    NoLocationData(String),

    /// The blocking scan task panicked or was cancelled.
    #[error("Dataset scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Source of population/area figures for a place name.
#[async_trait]
pub trait LocationDataset: Send + Sync {
    /// Returns the stats for the first entry matching `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NoLocationData`] if nothing matches, or
    /// another [`DatasetError`] if the dataset cannot be read.
    async fn lookup(&self, name: &str) -> Result<LocationStats, DatasetError>;
}

/// A [`LocationDataset`] backed by a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvLocationDataset {
    path: PathBuf,
}

impl CsvLocationDataset {
    /// Creates a dataset reading from `path`. The file is opened afresh
    /// on every lookup.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Dataset file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocationDataset for CsvLocationDataset {
    async fn lookup(&self, name: &str) -> Result<LocationStats, DatasetError> {
        let path = self.path.clone();
        let query = name.to_string();

        tokio::task::spawn_blocking(move || scan_file(&path, &query)).await?
    }
}

/// Scans the CSV file at `path` for `query`.
///
/// # Errors
///
/// See [`LocationDataset::lookup`].
pub fn scan_file(path: &Path, query: &str) -> Result<LocationStats, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    scan_reader(file, query)?.ok_or_else(|| DatasetError::NoLocationData(query.to_string()))
}

/// Scans CSV data from any [`Read`] source, returning the first match.
///
/// Returns `Ok(None)` when the input is exhausted without a match.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header lacks a required column, a row
/// before the match cannot be parsed, or the matched row has a
/// non-numeric population or area.
pub fn scan_reader(reader: impl Read, query: &str) -> Result<Option<LocationStats>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let columns = Columns::locate(csv_reader.headers()?)?;
    let needle = query.trim().to_lowercase();

    let mut row_number = 0u64;
    for result in csv_reader.records() {
        let record = result?;
        row_number += 1;

        let Some((matched_on, name)) = columns.match_record(&record, &needle) else {
            continue;
        };

        log::debug!("Dataset match for {query:?} on row {row_number} ({matched_on})");

        let population = parse_population(columns.cell(&record, columns.population))
            .ok_or_else(|| DatasetError::InvalidValue {
                row: row_number,
                column: "Population",
                value: columns.cell(&record, columns.population).to_string(),
            })?;
        let area = parse_area(columns.cell(&record, columns.area)).ok_or_else(|| {
            DatasetError::InvalidValue {
                row: row_number,
                column: "Area",
                value: columns.cell(&record, columns.area).to_string(),
            }
        })?;

        return Ok(Some(LocationStats {
            population,
            area,
            matched_on,
            name: name.to_string(),
        }));
    }

    log::debug!("Dataset exhausted after {row_number} rows without a match for {query:?}");
    Ok(None)
}

/// Header positions of the columns a lookup reads.
struct Columns {
    city: usize,
    district: usize,
    state: usize,
    population: usize,
    area: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(DatasetError::MissingColumn(name))
        };

        Ok(Self {
            city: find("City")?,
            district: find("District")?,
            state: find("State")?,
            population: find("Population")?,
            area: find("Area")?,
        })
    }

    fn cell<'a>(&self, record: &'a csv::StringRecord, index: usize) -> &'a str {
        record.get(index).unwrap_or("")
    }

    /// Checks city, district and state in that order against an already
    /// lowercased needle.
    fn match_record<'a>(
        &self,
        record: &'a csv::StringRecord,
        needle: &str,
    ) -> Option<(MatchedOn, &'a str)> {
        [
            (MatchedOn::City, self.city),
            (MatchedOn::District, self.district),
            (MatchedOn::State, self.state),
        ]
        .into_iter()
        .map(|(matched_on, index)| (matched_on, self.cell(record, index)))
        .find(|(_, cell)| cell.trim().to_lowercase() == needle)
    }
}

/// Parses a population cell, tolerating thousands separators.
fn parse_population(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| *c != ',' && *c != '_').collect();
    digits.trim().parse().ok()
}

fn parse_area(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    digits.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
City,District,State,Population,Area
Mumbai,Mumbai City,Maharashtra,12442373,603.4
Pune,Pune,Maharashtra,3124458,331.3
New Delhi,Delhi,Delhi,16787941,1484
Noida,Gautam Buddha Nagar,Uttar Pradesh,637272,203
";

    #[test]
    fn matches_city_column_case_insensitively() {
        let stats = scan_reader(SAMPLE.as_bytes(), "  mUMBAI ").unwrap().unwrap();
        assert_eq!(stats.population, 12_442_373);
        assert!((stats.area - 603.4).abs() < f64::EPSILON);
        assert_eq!(stats.matched_on, MatchedOn::City);
        assert_eq!(stats.name, "Mumbai");
    }

    #[test]
    fn city_beats_district_within_a_row() {
        let stats = scan_reader(SAMPLE.as_bytes(), "Pune").unwrap().unwrap();
        assert_eq!(stats.matched_on, MatchedOn::City);
    }

    #[test]
    fn first_matching_row_wins_over_better_later_match() {
        // "Delhi" is the District of row 3 and would be an exact City
        // match on row 5, but row 3 comes first.
        let data = format!("{SAMPLE}Delhi,Central Delhi,Delhi,1,1\n");
        let stats = scan_reader(data.as_bytes(), "Delhi").unwrap().unwrap();
        assert_eq!(stats.matched_on, MatchedOn::District);
        assert_eq!(stats.population, 16_787_941);
    }

    #[test]
    fn falls_back_to_state_column() {
        let stats = scan_reader(SAMPLE.as_bytes(), "uttar pradesh").unwrap().unwrap();
        assert_eq!(stats.matched_on, MatchedOn::State);
        assert_eq!(stats.name, "Uttar Pradesh");
    }

    #[test]
    fn repeated_lookups_are_deterministic() {
        let first = scan_reader(SAMPLE.as_bytes(), "Maharashtra").unwrap();
        let second = scan_reader(SAMPLE.as_bytes(), "Maharashtra").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.unwrap().population, 12_442_373);
    }

    #[test]
    fn stops_before_malformed_trailing_rows() {
        let data = format!("{SAMPLE}broken row with,too,many,fields,here,and,more\nx,y,z,not-a-number,\n");
        let stats = scan_reader(data.as_bytes(), "Pune").unwrap().unwrap();
        assert_eq!(stats.population, 3_124_458);

        // The same input errors once the scan has to reach the bad row.
        assert!(scan_reader(data.as_bytes(), "Nagpur").is_err());
    }

    #[test]
    fn no_match_returns_none() {
        assert!(scan_reader(SAMPLE.as_bytes(), "Atlantis").unwrap().is_none());
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "City,State,Population,Area\nPune,Maharashtra,1,1\n";
        assert!(matches!(
            scan_reader(data.as_bytes(), "Pune"),
            Err(DatasetError::MissingColumn("District"))
        ));
    }

    #[test]
    fn invalid_population_on_matched_row() {
        let data = "City,District,State,Population,Area\nPune,Pune,MH,unknown,1\n";
        assert!(matches!(
            scan_reader(data.as_bytes(), "Pune"),
            Err(DatasetError::InvalidValue { column: "Population", row: 1, .. })
        ));
    }

    #[test]
    fn population_tolerates_separators() {
        assert_eq!(parse_population("1,234,567"), Some(1_234_567));
        assert_eq!(parse_population(""), None);
        assert_eq!(parse_area("1,484.5"), Some(1484.5));
    }

    #[tokio::test]
    async fn csv_dataset_reads_from_disk() {
        let dir = std::env::temp_dir().join("city_dashboard_dataset_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("locations.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let dataset = CsvLocationDataset::new(&path);
        let stats = dataset.lookup("Noida").await.unwrap();
        assert_eq!(stats.population, 637_272);

        let missing = dataset.lookup("Atlantis").await;
        assert!(matches!(missing, Err(DatasetError::NoLocationData(name)) if name == "Atlantis"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dataset = CsvLocationDataset::new("/nonexistent/city_dashboard/locations.csv");
        assert!(matches!(
            dataset.lookup("Pune").await,
            Err(DatasetError::Io { .. })
        ));
    }
}
