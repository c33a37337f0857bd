//! HTTP handler functions for the damage map API.

use actix_web::{HttpResponse, web};
use damage_map_server_models::{ApiError, ApiHealth};

use crate::{AppState, PolygonsError, load_polygons, sample_collection};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/polygons`
///
/// Returns the results file as-is, or the sample collection if the file
/// does not exist yet.
pub async fn polygons(state: web::Data<AppState>) -> HttpResponse {
    match load_polygons(&state.polygons_path) {
        Ok(collection) => HttpResponse::Ok().json(collection),
        Err(PolygonsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!(
                "{} not found, serving sample collection",
                state.polygons_path.display()
            );
            HttpResponse::Ok().json(sample_collection())
        }
        Err(e) => {
            log::error!(
                "Failed to load polygons from {}: {e}",
                state.polygons_path.display()
            );
            HttpResponse::InternalServerError().json(ApiError::new("Failed to load polygons"))
        }
    }
}
