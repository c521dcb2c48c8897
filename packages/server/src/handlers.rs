//! HTTP handler functions for the city dashboard API.

use actix_web::{HttpResponse, web};
use city_dashboard_server_models::{ApiError, ApiHealth, CityQueryParams};

use crate::AppState;
use crate::report::{self, ReportError};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api?city=<name>`
///
/// Builds the aggregated report for one city.
pub async fn city_report(
    state: web::Data<AppState>,
    params: web::Query<CityQueryParams>,
) -> HttpResponse {
    match report::build_report(&state.providers, &state.options, params.city_name()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e @ ReportError::MissingParameter(_)) => {
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Failed to build report for {:?}: {e}", params.city_name());
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}
