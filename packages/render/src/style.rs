//! Per-feature visual style.

use damage_map_feature_models::Feature;
use serde::Serialize;

use crate::palette::{ClassColorMap, class_key_of};

/// Radius of point markers, in pixels.
pub const POINT_RADIUS: f64 = 6.0;
/// Fill opacity of point markers. Higher than paths so small markers stay
/// visible.
pub const POINT_FILL_OPACITY: f64 = 0.9;
/// Fill opacity of polygons and lines.
pub const PATH_FILL_OPACITY: f64 = 0.5;
/// Stroke weight of polygons and lines, in pixels.
pub const PATH_WEIGHT: f64 = 2.0;

/// How a single feature is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureStyle {
    /// Filled circle marker for point geometries.
    CircleMarker {
        /// Marker radius in pixels.
        radius: f64,
        /// Stroke color.
        color: String,
        /// Fill color.
        fill_color: String,
        /// Fill opacity, 0 to 1.
        fill_opacity: f64,
    },
    /// Stroked (and for polygons, filled) path.
    Path {
        /// Stroke color.
        color: String,
        /// Fill color.
        fill_color: String,
        /// Fill opacity, 0 to 1.
        fill_opacity: f64,
        /// Stroke weight in pixels.
        weight: f64,
    },
}

impl FeatureStyle {
    /// Stroke color of this style.
    #[must_use]
    pub fn color(&self) -> &str {
        match self {
            Self::CircleMarker { color, .. } | Self::Path { color, .. } => color,
        }
    }

    /// Fill color of this style.
    #[must_use]
    pub fn fill_color(&self) -> &str {
        match self {
            Self::CircleMarker { fill_color, .. } | Self::Path { fill_color, .. } => fill_color,
        }
    }
}

/// Computes the style of `feature`.
///
/// Points honor an explicit `color` property before falling back to the
/// class palette. Every other geometry is colored by class alone.
#[must_use]
pub fn style_for(feature: &Feature, palette: &ClassColorMap) -> FeatureStyle {
    let key = class_key_of(feature.class());

    if feature.geometry.is_point() {
        let color = feature
            .color()
            .unwrap_or_else(|| palette.color_for(&key))
            .to_string();
        FeatureStyle::CircleMarker {
            radius: POINT_RADIUS,
            fill_color: color.clone(),
            color,
            fill_opacity: POINT_FILL_OPACITY,
        }
    } else {
        let color = palette.color_for(&key).to_string();
        FeatureStyle::Path {
            fill_color: color.clone(),
            color,
            fill_opacity: PATH_FILL_OPACITY,
            weight: PATH_WEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::FALLBACK_COLOR;
    use damage_map_feature_models::{Geometry, Position, Properties};
    use serde_json::{Value, json};

    fn feature(geometry: Geometry, properties: Value) -> Feature {
        Feature::new(
            geometry,
            properties.as_object().cloned().unwrap_or_else(Properties::new),
        )
    }

    fn point() -> Geometry {
        Geometry::Point(Position::new(0.0, 0.0))
    }

    fn square() -> Geometry {
        Geometry::Polygon(vec![vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(0.0, 0.0),
        ]])
    }

    #[test]
    fn point_uses_explicit_color_first() {
        let palette = ClassColorMap::default();
        let style = style_for(
            &feature(point(), json!({"class": "water", "color": "#123456"})),
            &palette,
        );
        assert_eq!(
            style,
            FeatureStyle::CircleMarker {
                radius: 6.0,
                color: "#123456".to_string(),
                fill_color: "#123456".to_string(),
                fill_opacity: 0.9,
            }
        );
    }

    #[test]
    fn point_falls_back_to_class_then_magenta() {
        let palette = ClassColorMap::default();
        let style = style_for(&feature(point(), json!({"class": "Center"})), &palette);
        assert_eq!(style.color(), "#3399FF");

        let style = style_for(&feature(point(), json!({"class": "unknown"})), &palette);
        assert_eq!(style.color(), FALLBACK_COLOR);
        assert_eq!(style.fill_color(), FALLBACK_COLOR);
    }

    #[test]
    fn polygon_ignores_color_override() {
        let palette = ClassColorMap::default();
        let style = style_for(
            &feature(
                square(),
                json!({"class": " Building-Total-Destruction", "color": "#123456"}),
            ),
            &palette,
        );
        assert_eq!(
            style,
            FeatureStyle::Path {
                color: "#FF0000".to_string(),
                fill_color: "#FF0000".to_string(),
                fill_opacity: 0.5,
                weight: 2.0,
            }
        );
    }

    #[test]
    fn classless_feature_is_background() {
        let palette = ClassColorMap::default();
        let style = style_for(&feature(square(), json!({})), &palette);
        assert_eq!(style.color(), "#000000");
    }
}
