#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for damage-assessment polygons.
//!
//! Serves the analysis results file as `GeoJSON` at `/api/polygons` and the
//! static map frontend. The payload is passed through as-is: validating and
//! repairing it is the client's job (`damage_map_normalize`), so the server
//! never rejects a results file for having bad geometry.

mod handlers;

use std::path::{Path, PathBuf};

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};

/// Default results file served at `/api/polygons`.
pub const DEFAULT_POLYGONS_PATH: &str = "results/polygons.json";

/// Default directory of the static frontend.
pub const DEFAULT_STATIC_DIR: &str = "web/static";

/// Errors that can occur while loading the results file.
#[derive(Debug, thiserror::Error)]
pub enum PolygonsError {
    /// The results file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The results file is not JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Results file served at `/api/polygons`.
    pub polygons_path: PathBuf,
    /// Static frontend directory, served at `/` when it exists.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            polygons_path: PathBuf::from(DEFAULT_POLYGONS_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `POLYGONS_PATH`, and `STATIC_DIR`, using
    /// the defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let polygons_path = std::env::var("POLYGONS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.polygons_path);
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        Self {
            bind_addr,
            port,
            polygons_path,
            static_dir,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Results file served at `/api/polygons`.
    pub polygons_path: PathBuf,
}

/// Loads the results file as raw JSON.
///
/// # Errors
///
/// Returns [`PolygonsError`] if the file cannot be read or is not JSON.
pub fn load_polygons(path: &Path) -> Result<serde_json::Value, PolygonsError> {
    let body = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

/// Collection served when no results file exists yet.
#[must_use]
pub fn sample_collection() -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "id": "damage_001",
                    "class": "building-major-damage",
                    "damage_type": "severe",
                    "confidence": 0.92,
                    "notes": "Collapsed building, route blocked"
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [106.8025, -6.2015],
                        [106.8030, -6.2010],
                        [106.8035, -6.2015],
                        [106.8030, -6.2020],
                        [106.8025, -6.2015]
                    ]]
                }
            }
        ]
    })
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/polygons", web::get().to(handlers::polygons)),
    );
}

/// Starts the damage map API server.
///
/// This is a regular async function; the caller provides the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    if !config.polygons_path.is_file() {
        log::warn!(
            "Results file {} not found, serving sample data until it exists",
            config.polygons_path.display()
        );
    }

    let state = web::Data::new(AppState {
        polygons_path: config.polygons_path.clone(),
    });
    let static_dir = config.static_dir.is_dir().then(|| config.static_dir.clone());
    if static_dir.is_none() {
        log::info!(
            "Static directory {} not found, serving API only",
            config.static_dir.display()
        );
    }

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure);

        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
