//! Export of normalized collections as strict GeoJSON.
//!
//! The normalizer lets unknown geometry types and foreign members through
//! untouched, and the `geojson` crate may reject them. Export therefore
//! works one feature at a time and leaves out the ones it cannot express.

use damage_map_feature_models::{Feature, FeatureCollection};
use geojson::GeoJson;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while exporting a single feature.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The feature could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The `geojson` crate rejected the serialized feature.
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    /// The serialized feature parsed as some other GeoJSON object.
    #[error("Expected a Feature, got another GeoJSON object")]
    NotAFeature,
}

/// Re-reads one feature through the `geojson` crate.
///
/// # Errors
///
/// * If the feature fails to serialize
/// * If the `geojson` crate rejects its geometry or foreign members
pub fn feature_to_geojson(feature: &Feature) -> Result<geojson::Feature, ExportError> {
    match serde_json::to_string(feature)?.parse::<GeoJson>()? {
        GeoJson::Feature(feature) => Ok(feature),
        GeoJson::FeatureCollection(_) | GeoJson::Geometry(_) => Err(ExportError::NotAFeature),
    }
}

/// Converts `collection` into a `geojson::FeatureCollection`.
///
/// Features the `geojson` crate rejects are skipped with a warning. The
/// top-level `properties` survive as a foreign member.
#[must_use]
pub fn to_geojson(collection: &FeatureCollection) -> geojson::FeatureCollection {
    let features = collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| match feature_to_geojson(feature) {
            Ok(exported) => Some(exported),
            Err(e) => {
                log::warn!("Feature {index} left out of GeoJSON export: {e}");
                None
            }
        })
        .collect();

    let mut foreign_members = serde_json::Map::new();
    foreign_members.insert(
        "properties".to_string(),
        Value::Object(collection.properties.clone()),
    );

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}
