//! Stub providers with call counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use city_dashboard_dataset::{DatasetError, LocationDataset};
use city_dashboard_geocoder::{GeocodeError, Geocoder};
use city_dashboard_models::{
    AqiHistoryPoint, AqiReading, LocationStats, MatchedOn, Pollutants, ResolvedPlace,
    WeatherReport, WikiSummary,
};
use city_dashboard_source::SourceError;
use city_dashboard_source::air_quality::AirQualityProvider;
use city_dashboard_source::overpass::{OverpassApi, OverpassElement};
use city_dashboard_source::weather::WeatherProvider;
use city_dashboard_source::wikipedia::EncyclopediaProvider;

use crate::report::Providers;

pub const DELHI_POPULATION: u64 = 16_787_941;

/// Which stubs misbehave.
#[derive(Debug, Clone, Default)]
pub struct StubBehavior {
    pub geocoder_not_found: bool,
    pub dataset_empty: bool,
    pub weather_fails: bool,
    pub weather_delay: Option<Duration>,
    pub aqi_current_fails: bool,
    pub overpass_fails: bool,
    pub wikipedia_fails: bool,
}

pub struct StubSet {
    pub geocoder: Arc<StubGeocoder>,
    pub dataset: Arc<StubDataset>,
    pub weather: Arc<StubWeather>,
    pub air_quality: Arc<StubAirQuality>,
    pub overpass: Arc<StubOverpass>,
    pub encyclopedia: Arc<StubEncyclopedia>,
}

impl StubSet {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            geocoder: Arc::new(StubGeocoder {
                not_found: behavior.geocoder_not_found,
                calls: AtomicUsize::new(0),
            }),
            dataset: Arc::new(StubDataset {
                empty: behavior.dataset_empty,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }),
            weather: Arc::new(StubWeather {
                fails: behavior.weather_fails,
                delay: behavior.weather_delay,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }),
            air_quality: Arc::new(StubAirQuality {
                current_fails: behavior.aqi_current_fails,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }),
            overpass: Arc::new(StubOverpass {
                fails: behavior.overpass_fails,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }),
            encyclopedia: Arc::new(StubEncyclopedia {
                fails: behavior.wikipedia_fails,
                calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            geocoder: self.geocoder.clone(),
            dataset: self.dataset.clone(),
            weather: self.weather.clone(),
            air_quality: self.air_quality.clone(),
            overpass: self.overpass.clone(),
            encyclopedia: self.encyclopedia.clone(),
        }
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.geocoder.calls,
            &self.dataset.calls,
            &self.weather.calls,
            &self.air_quality.calls,
            &self.overpass.calls,
            &self.encyclopedia.calls,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

pub struct StubGeocoder {
    not_found: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, city: &str) -> Result<ResolvedPlace, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.not_found {
            return Err(GeocodeError::NotFound(city.to_string()));
        }
        Ok(ResolvedPlace {
            query_name: city.to_string(),
            display_name: "Delhi, India".to_string(),
            lat: 28.6139,
            lon: 77.2090,
        })
    }
}

pub struct StubDataset {
    empty: bool,
    pub calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl StubDataset {
    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationDataset for StubDataset {
    async fn lookup(&self, name: &str) -> Result<LocationStats, DatasetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(name.to_string());
        if self.empty {
            return Err(DatasetError::NoLocationData(name.to_string()));
        }
        Ok(LocationStats {
            population: DELHI_POPULATION,
            area: 1484.0,
            matched_on: MatchedOn::City,
            name: "Delhi".to_string(),
        })
    }
}

pub struct StubWeather {
    fails: bool,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    seen: Mutex<Vec<(f64, f64)>>,
}

impl StubWeather {
    /// Coordinates of every forecast request.
    pub fn seen(&self) -> Vec<(f64, f64)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((lat, lon));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fails {
            return Err(SourceError::Status {
                url: "https://forecast.invalid/v1/forecast".to_string(),
                status: 503,
            });
        }
        Ok(serde_json::from_value(serde_json::json!({
            "timezone": "Asia/Kolkata",
            "current_weather": {
                "temperature": 31.4,
                "windspeed": 7.2,
                "winddirection": 290.0,
                "weathercode": 1,
                "time": "2024-05-01T14:00"
            },
            "daily": {
                "time": ["2024-05-01"],
                "temperature_2m_max": [38.2],
                "temperature_2m_min": [24.9],
                "precipitation_sum": [0.0]
            }
        }))
        .unwrap())
    }
}

pub struct StubAirQuality {
    current_fails: bool,
    pub calls: AtomicUsize,
    seen: Mutex<Vec<(f64, f64)>>,
}

impl StubAirQuality {
    /// Coordinates of every current and history request.
    pub fn seen(&self) -> Vec<(f64, f64)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AirQualityProvider for StubAirQuality {
    async fn current(&self, lat: f64, lon: f64) -> Result<AqiReading, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((lat, lon));
        if self.current_fails {
            return Err(SourceError::Upstream {
                message: "Invalid key".to_string(),
            });
        }
        Ok(AqiReading::new(
            Some(162),
            Pollutants {
                pm25: Some(162.0),
                ..Pollutants::default()
            },
            Some("pm25".to_string()),
            None,
        ))
    }

    async fn history(&self, lat: f64, lon: f64) -> Result<Vec<AqiHistoryPoint>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((lat, lon));
        Ok(vec![
            AqiHistoryPoint::new("2024-05-01T00:00".to_string(), Some(88.0)),
            AqiHistoryPoint::new("2024-05-01T01:00".to_string(), Some(91.5)),
        ])
    }
}

pub struct StubOverpass {
    fails: bool,
    pub calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl StubOverpass {
    /// Text of every query received.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

fn element(id: u64, tags: &[(&str, &str)]) -> OverpassElement {
    OverpassElement {
        kind: "node".to_string(),
        id,
        tags: tags
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    }
}

#[async_trait]
impl OverpassApi for StubOverpass {
    async fn query(&self, query: &str) -> Result<Vec<OverpassElement>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.fails {
            return Err(SourceError::AllEndpointsFailed {
                attempts: vec![
                    "https://overpass-a.invalid/api/interpreter: HTTP 504".to_string(),
                    "https://overpass-b.invalid/api/interpreter: HTTP 429".to_string(),
                ],
            });
        }

        if query.contains("waterway") {
            return Ok(vec![
                element(10, &[("waterway", "river"), ("name", "Yamuna")]),
                element(11, &[("waterway", "river"), ("name", "Yamuna")]),
                element(12, &[("natural", "water"), ("name", "Bhalswa Lake")]),
            ]);
        }

        Ok(vec![
            element(1, &[("amenity", "hospital"), ("name", "AIIMS")]),
            element(2, &[("amenity", "school"), ("name", "Modern School")]),
            element(3, &[("amenity", "school"), ("name", "modern school")]),
            element(4, &[("amenity", "school")]),
            element(
                5,
                &[
                    ("railway", "station"),
                    ("station", "subway"),
                    ("name", "Rajiv Chowk"),
                ],
            ),
            element(6, &[("railway", "station"), ("name", "New Delhi")]),
        ])
    }
}

pub struct StubEncyclopedia {
    fails: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl EncyclopediaProvider for StubEncyclopedia {
    async fn summary(&self, title: &str) -> Result<WikiSummary, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(SourceError::Status {
                url: format!("https://wiki.invalid/page/summary/{title}"),
                status: 404,
            });
        }
        Ok(serde_json::from_value(serde_json::json!({
            "title": title,
            "description": "Capital territory of India",
            "extract": "Delhi is the capital territory of India.",
            "thumbnail": { "source": "https://upload.invalid/delhi.jpg", "width": 320, "height": 213 }
        }))
        .unwrap())
    }
}
