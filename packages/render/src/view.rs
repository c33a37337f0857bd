//! Initial viewport derivation.

use damage_map_feature_models::{
    BoundingBox, CENTER_ZOOM, Feature, FeatureCollection, Geometry, Position, ViewState,
};
use geo::BoundingRect;

/// Decides where the map should look after `collection` is rendered.
///
/// An explicit `center_lat`/`center_lon` pair wins. Otherwise the view fits
/// the bounds of every rendered feature, and an empty collection leaves the
/// view alone.
#[must_use]
pub fn derive_view(collection: &FeatureCollection) -> ViewState {
    if let Some((lat, lon)) = collection.center() {
        return ViewState::Center {
            lat,
            lon,
            zoom: CENTER_ZOOM,
        };
    }

    collection_bounds(&collection.features).map_or(ViewState::Unchanged, ViewState::FitBounds)
}

/// Bounding box of all `features`, skipping geometries whose extent cannot
/// be computed.
#[must_use]
pub fn collection_bounds(features: &[Feature]) -> Option<BoundingBox> {
    features
        .iter()
        .filter_map(|feature| geometry_bounds(&feature.geometry))
        .reduce(BoundingBox::union)
}

/// Bounding box of a single geometry.
///
/// Geometries the normalizer passed through unvalidated are read with the
/// `geojson` crate. Ones it cannot parse have no bounds.
#[must_use]
pub fn geometry_bounds(geometry: &Geometry) -> Option<BoundingBox> {
    let rect = to_geo(geometry)?.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    Some(BoundingBox::new(min.x, min.y, max.x, max.y))
}

fn to_geo(geometry: &Geometry) -> Option<geo::Geometry<f64>> {
    match geometry {
        Geometry::Point(position) => Some(geo::Point::new(position.lon, position.lat).into()),
        Geometry::LineString(positions) => Some(to_line_string(positions).into()),
        Geometry::Polygon(rings) => {
            let mut rings = rings.iter().map(|ring| to_line_string(ring));
            let exterior = rings.next()?;
            Some(geo::Polygon::new(exterior, rings.collect()).into())
        }
        Geometry::Other { kind, coordinates } => {
            let value = serde_json::json!({ "type": kind, "coordinates": coordinates });
            let parsed = match geojson::Geometry::from_json_value(value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::debug!("Cannot compute bounds of {kind} geometry: {e}");
                    return None;
                }
            };
            geo::Geometry::<f64>::try_from(parsed).ok()
        }
    }
}

fn to_line_string(positions: &[Position]) -> geo::LineString<f64> {
    positions
        .iter()
        .map(|p| geo::Coord { x: p.lon, y: p.lat })
        .collect()
}
