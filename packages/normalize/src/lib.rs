#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Validates and repairs raw `GeoJSON` payloads into [`FeatureCollection`]s.
//!
//! The backend that produces damage-assessment annotations is not trusted to
//! send well-formed `GeoJSON`. Normalization never fails: a payload without a
//! usable `features` array degrades to an empty collection, and each invalid
//! feature is dropped on its own without affecting the rest of the batch.
//! Every degradation is logged at `warn` level.

use damage_map_feature_models::{Feature, FeatureCollection, Geometry, Position, Properties};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

/// Minimum number of positions in a polygon's outer ring (three distinct
/// corners plus the closing position).
pub const MIN_RING_POSITIONS: usize = 4;

/// Minimum number of positions in a line string.
pub const MIN_LINE_POSITIONS: usize = 2;

/// Why a feature was left out of the normalized collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    /// The feature itself is not a JSON object.
    NotAnObject,
    /// No `geometry` member, or it is null.
    MissingGeometry,
    /// Geometry has no usable `type` member.
    MissingType,
    /// Geometry has no `coordinates` member, or it is null.
    MissingCoordinates,
    /// Polygon outer ring is not an array of at least four positions.
    InvalidPolygonRing,
    /// Line string has fewer than two positions.
    InvalidLineString,
    /// Point coordinates are not exactly two components.
    InvalidPoint,
    /// A position is not a pair of numbers.
    InvalidPosition,
}

/// A feature that did not survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedFeature {
    /// Index of the feature in the raw `features` array.
    pub index: usize,
    /// Why it was dropped.
    pub reason: DropReason,
}

/// Result of [`normalize_with_report`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// The well-formed collection.
    pub collection: FeatureCollection,
    /// Features that were dropped, in input order.
    pub dropped: Vec<DroppedFeature>,
    /// Whether the payload itself was unusable (no `features` array).
    pub malformed: bool,
}

/// Normalizes an arbitrary JSON payload into a well-formed collection.
///
/// See [`normalize_with_report`] for the rules applied.
#[must_use]
pub fn normalize(raw: &Value) -> FeatureCollection {
    normalize_with_report(raw).collection
}

/// Parses and normalizes a response body.
///
/// A body that is not JSON at all is treated like a payload with no
/// `features` array.
#[must_use]
pub fn normalize_str(body: &str) -> FeatureCollection {
    match serde_json::from_str::<Value>(body) {
        Ok(raw) => normalize(&raw),
        Err(e) => {
            log::warn!("Invalid GeoJSON body ({e}), returning empty collection");
            FeatureCollection::default()
        }
    }
}

/// Normalizes a payload and reports what was dropped.
///
/// * A payload that is not an object, or whose `features` member is missing
///   or not an array, yields an empty collection. Collection `properties`
///   are still copied when present.
/// * Features without `geometry`, `geometry.type`, or
///   `geometry.coordinates` are dropped.
/// * Polygons keep only their outer ring, which must hold at least
///   [`MIN_RING_POSITIONS`] positions. An unclosed ring is closed by
///   appending its first position.
/// * Line strings need at least [`MIN_LINE_POSITIONS`] positions, points
///   exactly two coordinate components.
/// * Unknown geometry types pass through untouched.
///
/// Surviving features keep their input order.
#[must_use]
pub fn normalize_with_report(raw: &Value) -> Normalized {
    let properties = raw
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let Some(raw_features) = raw.get("features").and_then(Value::as_array) else {
        log::warn!("Invalid GeoJSON, returning empty collection");
        return Normalized {
            collection: FeatureCollection::empty(properties),
            dropped: Vec::new(),
            malformed: true,
        };
    };

    let mut features = Vec::with_capacity(raw_features.len());
    let mut dropped = Vec::new();

    for (index, raw_feature) in raw_features.iter().enumerate() {
        match normalize_feature(raw_feature) {
            Ok(feature) => features.push(feature),
            Err(reason) => {
                log::warn!("Skipping feature {index}: {reason}");
                dropped.push(DroppedFeature { index, reason });
            }
        }
    }

    log::debug!(
        "Normalized {} of {} features ({} dropped)",
        features.len(),
        raw_features.len(),
        dropped.len()
    );

    Normalized {
        collection: FeatureCollection {
            features,
            properties,
        },
        dropped,
        malformed: false,
    }
}

fn normalize_feature(raw: &Value) -> Result<Feature, DropReason> {
    let object = raw.as_object().ok_or(DropReason::NotAnObject)?;

    let geom = object
        .get("geometry")
        .filter(|g| !g.is_null())
        .ok_or(DropReason::MissingGeometry)?;
    let kind = geom
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(DropReason::MissingType)?;
    let coordinates = geom
        .get("coordinates")
        .filter(|c| !c.is_null())
        .ok_or(DropReason::MissingCoordinates)?;

    let geometry = match kind {
        "Polygon" => normalize_polygon(coordinates)?,
        "LineString" => normalize_line_string(coordinates)?,
        "Point" => normalize_point(coordinates)?,
        other => Geometry::Other {
            kind: other.to_string(),
            coordinates: coordinates.clone(),
        },
    };

    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let foreign_members: Properties = object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "type" | "geometry" | "properties"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Feature {
        geometry,
        properties,
        foreign_members,
    })
}

/// Keeps the outer ring only and makes sure it is closed.
fn normalize_polygon(coordinates: &Value) -> Result<Geometry, DropReason> {
    let ring = coordinates
        .get(0)
        .and_then(Value::as_array)
        .filter(|ring| ring.len() >= MIN_RING_POSITIONS)
        .ok_or(DropReason::InvalidPolygonRing)?;

    let mut ring = parse_positions(ring)?;

    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
        if first != *last {
            ring.push(first);
        }
    }

    Ok(Geometry::Polygon(vec![ring]))
}

fn normalize_line_string(coordinates: &Value) -> Result<Geometry, DropReason> {
    let positions = coordinates
        .as_array()
        .filter(|line| line.len() >= MIN_LINE_POSITIONS)
        .ok_or(DropReason::InvalidLineString)?;

    Ok(Geometry::LineString(parse_positions(positions)?))
}

fn normalize_point(coordinates: &Value) -> Result<Geometry, DropReason> {
    let pair = coordinates
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or(DropReason::InvalidPoint)?;

    parse_pair(pair)
        .map(Geometry::Point)
        .ok_or(DropReason::InvalidPosition)
}

fn parse_positions(values: &[Value]) -> Result<Vec<Position>, DropReason> {
    values
        .iter()
        .map(|value| {
            value
                .as_array()
                .and_then(|pair| parse_pair(pair))
                .ok_or(DropReason::InvalidPosition)
        })
        .collect()
}

/// Reads `[lon, lat, ...]`, ignoring any extra components.
fn parse_pair(pair: &[Value]) -> Option<Position> {
    match pair {
        [lon, lat, ..] => Some(Position::new(lon.as_f64()?, lat.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn polygon(ring: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": {"class": "building-major-damage"},
            "geometry": {"type": "Polygon", "coordinates": [ring]}
        })
    }

    fn collection(features: Vec<Value>) -> Value {
        json!({"type": "FeatureCollection", "features": features})
    }

    #[test]
    fn missing_or_non_array_features_yield_empty_collection() {
        for raw in [
            json!({}),
            json!({"features": null}),
            json!({"features": "nope"}),
            json!({"features": {"0": 1}}),
            json!(null),
            json!([1, 2, 3]),
            json!("FeatureCollection"),
        ] {
            let normalized = normalize_with_report(&raw);
            assert!(normalized.malformed, "{raw} should be malformed");
            assert_eq!(normalized.collection, FeatureCollection::default());
            assert_eq!(
                serde_json::to_value(&normalized.collection).unwrap(),
                json!({"type": "FeatureCollection", "features": [], "properties": {}})
            );
        }
    }

    #[test]
    fn malformed_payload_keeps_properties() {
        let raw = json!({"features": 7, "properties": {"center_lat": 1.5}});
        let normalized = normalize(&raw);
        assert!(normalized.features.is_empty());
        assert_eq!(normalized.properties.get("center_lat"), Some(&json!(1.5)));
    }

    #[test]
    fn unclosed_ring_is_closed() {
        let raw = collection(vec![polygon(json!([
            [106.8025, -6.2015],
            [106.8030, -6.2010],
            [106.8035, -6.2015],
            [106.8030, -6.2020]
        ]))]);

        let normalized = normalize(&raw);
        let ring = normalized.features[0].geometry.outer_ring().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring[4], Position::new(106.8025, -6.2015));
    }

    #[test]
    fn closed_ring_is_untouched() {
        let ring = json!([[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]);
        let raw = collection(vec![polygon(ring.clone())]);

        let normalized = normalize(&raw);
        let value = serde_json::to_value(&normalized.features[0].geometry).unwrap();
        assert_eq!(
            value["coordinates"][0].as_array().unwrap().len(),
            ring.as_array().unwrap().len()
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = collection(vec![
            polygon(json!([[0, 0], [1, 0], [1, 1], [0, 1]])),
            json!({
                "type": "Feature",
                "id": "abc",
                "properties": {"class": "vehicle", "confidence": 0},
                "geometry": {"type": "Point", "coordinates": [3.5, 4.5]}
            }),
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]}
            }),
        ]);

        let once = normalize(&raw);
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn interior_rings_are_dropped() {
        let raw = collection(vec![json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [
                    [[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]],
                    [[1, 1], [2, 1], [2, 2], [1, 1]]
                ]
            }
        })]);

        let normalized = normalize(&raw);
        let Geometry::Polygon(rings) = &normalized.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 1);
    }

    #[test]
    fn invalid_features_are_dropped_and_order_is_kept() {
        let raw = collection(vec![
            json!({"properties": {"class": "a"}, "geometry": {"type": "Point", "coordinates": [1, 2]}}),
            polygon(json!([[0, 0], [1, 0], [0, 0]])),
            json!({"properties": {"class": "b"}, "geometry": {"type": "LineString", "coordinates": [[0, 0]]}}),
            json!({"properties": {"class": "c"}, "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}}),
            json!({"properties": {"class": "d"}, "geometry": {"type": "Point", "coordinates": [1, 2, 3]}}),
            json!({"properties": {"class": "e"}, "geometry": {"type": "Point", "coordinates": [5, 6]}}),
        ]);

        let normalized = normalize_with_report(&raw);
        let classes: Vec<String> = normalized
            .collection
            .features
            .iter()
            .filter_map(Feature::class_label)
            .collect();
        assert_eq!(classes, vec!["a", "c", "e"]);

        assert_eq!(
            normalized.dropped,
            vec![
                DroppedFeature {
                    index: 1,
                    reason: DropReason::InvalidPolygonRing
                },
                DroppedFeature {
                    index: 2,
                    reason: DropReason::InvalidLineString
                },
                DroppedFeature {
                    index: 4,
                    reason: DropReason::InvalidPoint
                },
            ]
        );
    }

    #[test]
    fn missing_geometry_members_are_dropped() {
        let raw = collection(vec![
            json!({"properties": {}}),
            json!({"geometry": null}),
            json!({"geometry": {"coordinates": [1, 2]}}),
            json!({"geometry": {"type": "Point"}}),
            json!({"geometry": {"type": "Point", "coordinates": null}}),
            json!(null),
        ]);

        let reasons: Vec<DropReason> = normalize_with_report(&raw)
            .dropped
            .into_iter()
            .map(|d| d.reason)
            .collect();
        assert_eq!(
            reasons,
            vec![
                DropReason::MissingGeometry,
                DropReason::MissingGeometry,
                DropReason::MissingType,
                DropReason::MissingCoordinates,
                DropReason::MissingCoordinates,
                DropReason::NotAnObject,
            ]
        );
    }

    #[test]
    fn polygon_with_non_array_ring_is_dropped() {
        let raw = collection(vec![json!({
            "geometry": {"type": "Polygon", "coordinates": [5]}
        })]);
        let normalized = normalize_with_report(&raw);
        assert!(normalized.collection.features.is_empty());
        assert_eq!(normalized.dropped[0].reason, DropReason::InvalidPolygonRing);
    }

    #[test]
    fn non_numeric_positions_are_dropped() {
        let raw = collection(vec![
            polygon(json!([[0, 0], ["x", 0], [1, 1], [0, 1]])),
            json!({"geometry": {"type": "Point", "coordinates": ["a", "b"]}}),
        ]);
        let normalized = normalize_with_report(&raw);
        assert!(normalized.collection.features.is_empty());
        assert!(
            normalized
                .dropped
                .iter()
                .all(|d| d.reason == DropReason::InvalidPosition)
        );
    }

    #[test]
    fn unknown_geometry_passes_through() {
        let raw = collection(vec![json!({
            "geometry": {"type": "MultiPolygon", "coordinates": [[[[0, 0], [1, 0], [0, 0]]]]}
        })]);
        let normalized = normalize(&raw);
        assert_eq!(
            normalized.features[0].geometry,
            Geometry::Other {
                kind: "MultiPolygon".to_string(),
                coordinates: json!([[[[0, 0], [1, 0], [0, 0]]]]),
            }
        );
    }

    #[test]
    fn missing_feature_properties_become_empty() {
        let raw = collection(vec![json!({
            "properties": null,
            "geometry": {"type": "Point", "coordinates": [1, 2]}
        })]);
        assert!(normalize(&raw).features[0].properties.is_empty());
    }

    #[test]
    fn unparsable_body_yields_empty_collection() {
        assert_eq!(normalize_str("<html>oops</html>"), FeatureCollection::default());
        assert_eq!(
            normalize_str(r#"{"features": [{"geometry": {"type": "Point", "coordinates": [1, 2]}}]}"#)
                .features
                .len(),
            1
        );
    }

    #[test]
    fn drop_reason_display() {
        assert_eq!(DropReason::InvalidPolygonRing.to_string(), "invalid_polygon_ring");
        assert_eq!(DropReason::MissingGeometry.as_ref(), "missing_geometry");
    }
}
