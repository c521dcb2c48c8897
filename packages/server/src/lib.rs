#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the city dashboard.
//!
//! Serves `GET /api?city=<name>`, which geocodes the city and aggregates
//! population, weather, air quality, infrastructure, water bodies and an
//! encyclopedia summary into one JSON report. The `/api` scope is rate
//! limited per client IP. The built frontend is served from `STATIC_DIR`
//! when configured.

pub mod config;
mod handlers;
pub mod rate_limit;
pub mod report;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use city_dashboard_dataset::CsvLocationDataset;
use city_dashboard_geocoder::NominatimGeocoder;
use city_dashboard_source::air_quality::AirQualityClient;
use city_dashboard_source::overpass::OverpassClient;
use city_dashboard_source::service_registry::{self, Endpoints};
use city_dashboard_source::weather::OpenMeteoWeather;
use city_dashboard_source::wikipedia::WikipediaClient;

use crate::config::ServerConfig;
use crate::rate_limit::{FixedWindowRateLimiter, RateLimiter};
use crate::report::{Providers, ReportOptions};

/// Shared application state.
pub struct AppState {
    /// Report collaborators.
    pub providers: Providers,
    /// Failure policy, name normalization and deadline.
    pub options: ReportOptions,
    /// Per-client request limiter for the `/api` scope.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Key the limiter on forwarded client addresses instead of the
    /// socket peer.
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Wires the real upstream clients described by `endpoints`.
    #[must_use]
    pub fn new(config: &ServerConfig, endpoints: &Endpoints, client: &reqwest::Client) -> Self {
        let providers = Providers {
            geocoder: Arc::new(NominatimGeocoder::new(
                client.clone(),
                &endpoints.nominatim_url,
                &endpoints.country_code,
            )),
            dataset: Arc::new(CsvLocationDataset::new(config.dataset_path.clone())),
            weather: Arc::new(OpenMeteoWeather::new(client.clone(), &endpoints.forecast_url)),
            air_quality: Arc::new(AirQualityClient::new(
                client.clone(),
                &endpoints.waqi_url,
                config.waqi_token.clone(),
                &endpoints.air_quality_url,
                endpoints.air_quality_past_days,
            )),
            overpass: Arc::new(OverpassClient::new(
                client.clone(),
                endpoints.overpass_endpoints.clone(),
            )),
            encyclopedia: Arc::new(WikipediaClient::new(
                client.clone(),
                &endpoints.wikipedia_url,
            )),
        };

        Self {
            providers,
            options: ReportOptions {
                degradable: config.degradable.clone(),
                name_normalization: config.name_normalization,
                overpass_timeout_secs: endpoints.overpass_timeout_secs,
                deadline: config.request_deadline,
            },
            rate_limiter: Arc::new(FixedWindowRateLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}

/// Registers the `/api` scope.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(middleware::from_fn(rate_limit::enforce))
            .route("", web::get().to(handlers::city_report))
            .route("/", web::get().to(handlers::city_report))
            .route("/health", web::get().to(handlers::health)),
    );
}

fn cors(origin: Option<&str>) -> Cors {
    origin.map_or_else(Cors::permissive, |origin| {
        Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET"])
            .allow_any_header()
            .max_age(3600)
    })
}

/// Starts the city dashboard API server.
///
/// Reads [`ServerConfig`] from the environment, resolves upstream
/// endpoints from the embedded service registry and starts the Actix-Web
/// HTTP server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration is invalid,
/// the HTTP server fails to bind, or it encounters a runtime error.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;
    let endpoints = Endpoints::from_services(&service_registry::enabled_services())
        .map_err(std::io::Error::other)?;

    let client = reqwest::Client::builder()
        .user_agent(city_dashboard_source::USER_AGENT)
        .timeout(config.upstream_timeout)
        .build()
        .expect("Failed to build HTTP client");

    if config.waqi_token.is_none() {
        log::warn!("WAQI_TOKEN is not set; current AQI will report no data");
    }
    log::info!(
        "Location dataset: {}, degradable sections: {:?}",
        config.dataset_path.display(),
        config.degradable
    );

    let state = web::Data::new(AppState::new(&config, &endpoints, &client));
    let cors_origin = config.cors_origin.clone();
    let static_dir = config.static_dir.clone().filter(|dir| dir.is_dir());

    if let Some(dir) = &static_dir {
        log::info!("Serving frontend from {}", dir.display());
    }
    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let app = App::new()
            .wrap(cors(cors_origin.as_deref()))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes);

        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
