//! `render` and `normalize` subcommands.

use std::path::PathBuf;

use clap::Args;
use damage_map_cli_utils::{MultiProgress, SpinnerStatus};
use damage_map_client::{
    fetch_collection, polygons_url, read_collection, render_raw, run_countdown,
};
use damage_map_render::{ClassColorMap, RecordingMap, RenderOutcome, Renderer, to_geojson};
use serde::Serialize;

/// Backend used when neither `--url` nor `--file` is given.
const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// Where to load the feature collection from.
#[derive(Args)]
pub struct SourceArgs {
    /// Backend base URL (or full `/api/polygons` URL)
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,
    /// Read the collection from a JSON file instead of the backend
    #[arg(long)]
    file: Option<PathBuf>,
}

/// What the map was asked to draw.
#[derive(Serialize)]
struct RenderPlan<'a> {
    outcome: &'a RenderOutcome,
    map: &'a RecordingMap,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// TOML palette overriding class colors
    #[arg(long)]
    palette: Option<PathBuf>,
    /// Print the plan and exit without running the processing countdown
    #[arg(long)]
    no_wait: bool,
}

/// Loads the raw payload named by `source`.
async fn load(source: &SourceArgs) -> Result<serde_json::Value, damage_map_client::ClientError> {
    if let Some(path) = &source.file {
        log::info!("Reading {}", path.display());
        return read_collection(path);
    }

    let url = polygons_url(source.url.as_deref().unwrap_or(DEFAULT_URL));
    log::info!("Fetching {url}");
    let client = reqwest::Client::new();
    match fetch_collection(&client, &url).await {
        Ok(raw) => Ok(raw),
        Err(e) => {
            log::error!("Failed to load polygon data: {e}");
            Err(e)
        }
    }
}

fn print_json(multi: &MultiProgress, value: &impl Serialize) -> Result<(), serde_json::Error> {
    let text = serde_json::to_string_pretty(value)?;
    multi.suspend(|| println!("{text}"));
    Ok(())
}

/// Runs `render`.
///
/// # Errors
///
/// Returns an error if the palette or the collection cannot be loaded.
pub async fn run(
    args: &RenderArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let palette = match &args.palette {
        Some(path) => ClassColorMap::from_path(path)?,
        None => ClassColorMap::default(),
    };

    let raw = load(&args.source).await?;

    let mut renderer = Renderer::new(palette);
    let mut map = RecordingMap::new();
    let mut status = SpinnerStatus::new(multi);

    let outcome = render_raw(&raw, &mut renderer, &mut map, &mut status);

    print_json(
        multi,
        &RenderPlan {
            outcome: &outcome,
            map: &map,
        },
    )?;

    if !args.no_wait {
        run_countdown(&mut renderer, &mut status).await;
    }
    status.finish();

    Ok(())
}

/// Runs `normalize`.
///
/// # Errors
///
/// Returns an error if the collection cannot be loaded.
pub async fn normalize(
    source: &SourceArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = load(source).await?;
    let normalized = damage_map_normalize::normalize_with_report(&raw);

    for dropped in &normalized.dropped {
        log::info!("Feature {} dropped: {}", dropped.index, dropped.reason);
    }

    print_json(multi, &to_geojson(&normalized.collection))?;

    Ok(())
}
