#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Damage-assessment feature collection types.
//!
//! These types describe a collection *after* normalization: every feature
//! carries a geometry whose shape has already been checked, polygons have a
//! single closed outer ring, and `features` is never absent. Raw payloads
//! coming off the wire are plain [`serde_json::Value`]s until
//! `damage_map_normalize` turns them into a [`FeatureCollection`].

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Free-form `GeoJSON` properties object.
pub type Properties = serde_json::Map<String, Value>;

/// Collection property holding the explicit view center latitude.
pub const CENTER_LAT_KEY: &str = "center_lat";
/// Collection property holding the explicit view center longitude.
pub const CENTER_LON_KEY: &str = "center_lon";
/// Zoom level used when the collection supplies an explicit center.
pub const CENTER_ZOOM: u8 = 12;

/// A longitude/latitude pair.
///
/// Serialized as a two-element `[lon, lat]` array. Components beyond the
/// second (altitude etc.) are not kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl Position {
    /// Creates a position from longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.lon)?;
        seq.serialize_element(&self.lat)?;
        seq.end()
    }
}

/// A validated feature geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Position),
    /// Two or more positions.
    LineString(Vec<Position>),
    /// Rings of positions. After normalization there is exactly one ring,
    /// it has at least four positions, and its first and last positions
    /// are equal.
    Polygon(Vec<Vec<Position>>),
    /// Any geometry type the normalizer does not understand, passed
    /// through with its coordinates untouched.
    Other {
        /// The raw `GeoJSON` `type` member.
        kind: String,
        /// The raw `coordinates` member.
        coordinates: Value,
    },
}

impl Geometry {
    /// Returns the `GeoJSON` `type` name of this geometry.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Whether this geometry is rendered as a circle marker rather than a
    /// stroked path.
    #[must_use]
    pub const fn is_point(&self) -> bool {
        matches!(self, Self::Point(_))
    }

    /// Returns the outer ring of a polygon.
    #[must_use]
    pub fn outer_ring(&self) -> Option<&[Position]> {
        match self {
            Self::Polygon(rings) => rings.first().map(Vec::as_slice),
            _ => None,
        }
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", self.kind())?;
        match self {
            Self::Point(position) => map.serialize_entry("coordinates", position)?,
            Self::LineString(positions) => map.serialize_entry("coordinates", positions)?,
            Self::Polygon(rings) => map.serialize_entry("coordinates", rings)?,
            Self::Other { coordinates, .. } => map.serialize_entry("coordinates", coordinates)?,
        }
        map.end()
    }
}

/// A single annotated feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Validated geometry.
    pub geometry: Geometry,
    /// Feature properties (`class`, `confidence`, `notes`, ...).
    pub properties: Properties,
    /// Top-level members other than `type`, `geometry`, and `properties`
    /// (e.g. `id`), carried through unchanged.
    pub foreign_members: Properties,
}

impl Feature {
    /// Creates a feature with no foreign members.
    #[must_use]
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
            foreign_members: Properties::new(),
        }
    }

    /// Raw `class` property, if any.
    #[must_use]
    pub fn class(&self) -> Option<&Value> {
        self.properties.get("class")
    }

    /// Class rendered as display text. `None` when the class is absent,
    /// null, or an empty string.
    #[must_use]
    pub fn class_label(&self) -> Option<String> {
        self.class().filter(|v| is_truthy(v)).map(display_value)
    }

    /// Raw `confidence` property.
    ///
    /// Present whenever the key exists and is not null, so a confidence of
    /// exactly `0` is still reported. An explicit `null` counts as absent
    /// rather than rendering as the text `null`.
    #[must_use]
    pub fn confidence(&self) -> Option<&Value> {
        self.properties.get("confidence").filter(|v| !v.is_null())
    }

    /// Free-text notes, when present and non-empty.
    #[must_use]
    pub fn notes(&self) -> Option<String> {
        self.properties
            .get("notes")
            .filter(|v| is_truthy(v))
            .map(display_value)
    }

    /// Creation timestamp as sent by the backend.
    #[must_use]
    pub fn created_at(&self) -> Option<String> {
        self.properties
            .get("created_at")
            .filter(|v| is_truthy(v))
            .map(display_value)
    }

    /// Explicit color override.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.properties
            .get("color")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether the backend flagged this feature as still being analyzed.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.properties.get("waiting").is_some_and(is_truthy)
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.foreign_members.len()))?;
        map.serialize_entry("type", "Feature")?;
        for (key, value) in &self.foreign_members {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("geometry", &self.geometry)?;
        map.serialize_entry("properties", &self.properties)?;
        map.end()
    }
}

/// A normalized `GeoJSON` `FeatureCollection`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// Valid features in input order.
    pub features: Vec<Feature>,
    /// Collection-level properties (`center_lat`, `center_lon`, ...).
    pub properties: Properties,
}

impl FeatureCollection {
    /// Creates an empty collection with the given properties.
    #[must_use]
    pub fn empty(properties: Properties) -> Self {
        Self {
            features: Vec::new(),
            properties,
        }
    }

    /// Explicit view center as `(lat, lon)`.
    ///
    /// Only returned when both `center_lat` and `center_lon` are present,
    /// truthy, and numeric. A center of exactly `0` counts as absent.
    #[must_use]
    pub fn center(&self) -> Option<(f64, f64)> {
        let lat = self.properties.get(CENTER_LAT_KEY).and_then(truthy_number)?;
        let lon = self.properties.get(CENTER_LON_KEY).and_then(truthy_number)?;
        Some((lat, lon))
    }

    /// First feature the backend flagged as still processing.
    #[must_use]
    pub fn waiting_feature(&self) -> Option<&Feature> {
        self.features.iter().find(|f| f.is_waiting())
    }

    /// Whether there are no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "FeatureCollection")?;
        map.serialize_entry("features", &self.features)?;
        map.serialize_entry("properties", &self.properties)?;
        map.end()
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }
}

/// Viewport decision made after a render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    /// Recenter on an explicit point.
    Center {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
        /// Map zoom level.
        zoom: u8,
    },
    /// Fit the viewport to the bounds of everything rendered.
    FitBounds(BoundingBox),
    /// Leave the map where it is.
    Unchanged,
}

/// Loose truthiness of a JSON value.
///
/// `null`, `false`, `0`, `NaN`, and `""` are falsy; everything else
/// (including empty arrays and objects) is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads a truthy number, accepting numeric strings.
fn truthy_number(value: &Value) -> Option<f64> {
    if !is_truthy(value) {
        return None;
    }
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| *f != 0.0 && f.is_finite())
}

/// Renders a JSON scalar the way it would read in running text: strings
/// without quotes, everything else in its JSON form.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    fn point_feature(properties: Value) -> Feature {
        Feature::new(Geometry::Point(Position::new(1.0, 2.0)), props(properties))
    }

    #[test]
    fn collection_serializes_as_geojson() {
        let mut feature = point_feature(json!({"class": "tree"}));
        feature.foreign_members.insert("id".into(), json!("f-1"));
        let collection = FeatureCollection {
            features: vec![feature],
            properties: Properties::new(),
        };

        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "id": "f-1",
                    "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                    "properties": {"class": "tree"}
                }],
                "properties": {}
            })
        );
    }

    #[test]
    fn other_geometry_keeps_raw_coordinates() {
        let geometry = Geometry::Other {
            kind: "MultiPoint".to_string(),
            coordinates: json!([[1, 2], [3, 4]]),
        };
        assert_eq!(
            serde_json::to_value(&geometry).unwrap(),
            json!({"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]})
        );
    }

    #[test]
    fn confidence_zero_is_present() {
        let feature = point_feature(json!({"confidence": 0}));
        assert_eq!(feature.confidence(), Some(&json!(0)));

        let feature = point_feature(json!({"confidence": null}));
        assert_eq!(feature.confidence(), None);
    }

    #[test]
    fn empty_notes_and_class_are_absent() {
        let feature = point_feature(json!({"class": "", "notes": ""}));
        assert_eq!(feature.class_label(), None);
        assert_eq!(feature.notes(), None);
    }

    #[test]
    fn waiting_uses_truthiness() {
        assert!(point_feature(json!({"waiting": true})).is_waiting());
        assert!(point_feature(json!({"waiting": 1})).is_waiting());
        assert!(!point_feature(json!({"waiting": false})).is_waiting());
        assert!(!point_feature(json!({"waiting": 0})).is_waiting());
        assert!(!point_feature(json!({})).is_waiting());
    }

    #[test]
    fn center_requires_both_truthy_members() {
        let mut collection = FeatureCollection::empty(props(json!({
            "center_lat": 10,
            "center_lon": 20.5
        })));
        assert_eq!(collection.center(), Some((10.0, 20.5)));

        collection.properties.insert("center_lon".into(), json!(0));
        assert_eq!(collection.center(), None);

        collection.properties.insert("center_lon".into(), json!("20"));
        assert_eq!(collection.center(), Some((10.0, 20.0)));

        collection.properties.remove("center_lat");
        assert_eq!(collection.center(), None);
    }

    #[test]
    fn bounding_box_union() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(-1.0, 0.5, 0.5, 2.0);
        assert_eq!(a.union(b), BoundingBox::new(-1.0, 0.0, 1.0, 2.0));
    }
}
