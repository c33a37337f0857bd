#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fetch, normalize, and render damage-assessment polygons.
//!
//! Ties the pipeline together: the feature collection is fetched from the
//! backend's `/api/polygons` endpoint (or read from disk), normalized with
//! `damage_map_normalize`, and drawn with a `damage_map_render` renderer.
//! Transport failures are the only errors that reach the caller; anything
//! wrong with the payload itself is absorbed by the normalizer.
//!
//! The processing countdown is driven by [`run_countdown`], a one-second
//! `tokio` interval on the current task.

use std::path::Path;
use std::time::Duration;

use damage_map_render::{MapHandle, RenderOutcome, Renderer, StatusHandle, TickOutcome};
use serde_json::Value;

/// Path of the polygons endpoint on the backend.
pub const POLYGONS_PATH: &str = "/api/polygons";

/// Interval between countdown ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Errors that can occur while loading a feature collection.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code returned.
        status: reqwest::StatusCode,
    },

    /// Body is not JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the polygons endpoint URL for a backend base URL.
///
/// A URL that already points at the endpoint is returned unchanged.
#[must_use]
pub fn polygons_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(POLYGONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{POLYGONS_PATH}")
    }
}

/// Fetches the raw feature collection from `url`.
///
/// The body is returned as plain JSON. Its shape is not checked here.
///
/// # Errors
///
/// Returns [`ClientError`] if the request fails, the status is not 2xx, or
/// the body is not JSON. No retry is attempted.
pub async fn fetch_collection(client: &reqwest::Client, url: &str) -> Result<Value, ClientError> {
    log::debug!("Fetching {url}");

    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(ClientError::Status {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    let body = resp.text().await?;

    Ok(serde_json::from_str(&body)?)
}

/// Reads a raw feature collection from a JSON file.
///
/// # Errors
///
/// Returns [`ClientError`] if the file cannot be read or is not JSON.
pub fn read_collection(path: &Path) -> Result<Value, ClientError> {
    let body = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

/// Fetches `url`, normalizes the payload, and renders it.
///
/// On a transport failure nothing is drawn and the map and status handles
/// are left untouched.
///
/// # Errors
///
/// Returns [`ClientError`] if fetching fails.
pub async fn load_and_render(
    client: &reqwest::Client,
    url: &str,
    renderer: &mut Renderer,
    map: &mut impl MapHandle,
    status: &mut impl StatusHandle,
) -> Result<RenderOutcome, ClientError> {
    let raw = match fetch_collection(client, url).await {
        Ok(raw) => raw,
        Err(e) => {
            log::error!("Failed to load polygons: {e}");
            return Err(e);
        }
    };

    Ok(render_raw(&raw, renderer, map, status))
}

/// Normalizes `raw` and renders it. Never fails.
pub fn render_raw(
    raw: &Value,
    renderer: &mut Renderer,
    map: &mut impl MapHandle,
    status: &mut impl StatusHandle,
) -> RenderOutcome {
    let normalized = damage_map_normalize::normalize_with_report(raw);
    if !normalized.dropped.is_empty() {
        log::info!(
            "Dropped {} invalid features before rendering",
            normalized.dropped.len()
        );
    }

    renderer.render(&normalized.collection, map, status)
}

/// Ticks the renderer's countdown once per second until it stops.
///
/// Returns immediately when no countdown is running. Returns the number of
/// ticks delivered.
pub async fn run_countdown(renderer: &mut Renderer, status: &mut impl StatusHandle) -> u32 {
    if !renderer.status().is_counting() {
        return 0;
    }

    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    interval.tick().await;

    let mut ticks = 0;
    loop {
        interval.tick().await;
        ticks += 1;
        if renderer.tick(status) == TickOutcome::Stop {
            log::debug!("Countdown stopped after {ticks} ticks");
            return ticks;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use damage_map_render::{RecordingMap, RecordingStatus, StatusState};
    use serde_json::json;

    #[test]
    fn polygons_url_appends_endpoint_once() {
        assert_eq!(
            polygons_url("http://localhost:8080"),
            "http://localhost:8080/api/polygons"
        );
        assert_eq!(
            polygons_url("http://localhost:8080/"),
            "http://localhost:8080/api/polygons"
        );
        assert_eq!(
            polygons_url("http://localhost:8080/api/polygons"),
            "http://localhost:8080/api/polygons"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_thirty_seconds_then_stops() {
        let raw = json!({
            "features": [{
                "properties": {"waiting": true},
                "geometry": {"type": "Point", "coordinates": [1, 2]}
            }]
        });
        let mut renderer = Renderer::default();
        let mut map = RecordingMap::new();
        let mut status = RecordingStatus::default();
        render_raw(&raw, &mut renderer, &mut map, &mut status);

        let started = tokio::time::Instant::now();
        let ticks = run_countdown(&mut renderer, &mut status).await;

        assert_eq!(ticks, 30);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
        assert_eq!(renderer.status().state(), StatusState::TimedOut);
        assert_eq!(status.text, "Still processing ... reload soon.");
        assert!(!status.spinner_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_skipped_when_complete() {
        let mut renderer = Renderer::default();
        let mut map = RecordingMap::new();
        let mut status = RecordingStatus::default();
        render_raw(&json!({"features": []}), &mut renderer, &mut map, &mut status);

        assert_eq!(run_countdown(&mut renderer, &mut status).await, 0);
        assert_eq!(status.text, "Analysis complete.");
    }

    #[tokio::test]
    async fn transport_failure_leaves_map_untouched() {
        let client = reqwest::Client::new();
        let mut renderer = Renderer::default();
        let mut map = RecordingMap::new();
        let mut status = RecordingStatus::default();

        let result = load_and_render(
            &client,
            "http://127.0.0.1:1/api/polygons",
            &mut renderer,
            &mut map,
            &mut status,
        )
        .await;

        assert!(matches!(result, Err(ClientError::Http(_))));
        assert!(map.calls.is_empty());
        assert_eq!(status, RecordingStatus::default());
    }

    #[test]
    fn read_collection_rejects_non_json() {
        let dir = std::env::temp_dir().join(format!("damage_map_client_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(read_collection(&path), Err(ClientError::Json(_))));
        assert!(matches!(
            read_collection(&dir.join("missing.json")),
            Err(ClientError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
