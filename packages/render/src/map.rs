//! The map widget capability set, and a recording implementation.

use std::collections::BTreeMap;

use damage_map_feature_models::{BoundingBox, Geometry};
use serde::Serialize;

use crate::style::FeatureStyle;

/// Identifier handed out by [`MapHandle::add_layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LayerId(pub u64);

/// One feature as it will be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFeature {
    /// Position of the feature in the normalized collection.
    pub index: usize,
    /// Geometry to draw.
    pub geometry: Geometry,
    /// Computed style.
    pub style: FeatureStyle,
}

/// A geometry layer built from one feature collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    /// Features in draw order.
    pub features: Vec<RenderedFeature>,
}

impl Layer {
    /// Number of features in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// What the renderer needs from a map widget.
pub trait MapHandle {
    /// Adds a layer and returns its identifier.
    fn add_layer(&mut self, layer: Layer) -> LayerId;

    /// Removes a previously added layer. Unknown ids are ignored.
    fn remove_layer(&mut self, id: LayerId);

    /// Centers the view on a point at a zoom level.
    fn set_view(&mut self, lat: f64, lon: f64, zoom: u8);

    /// Fits the view to a bounding box.
    fn fit_bounds(&mut self, bounds: BoundingBox);

    /// Attaches popup HTML to one feature of a layer.
    fn bind_popup(&mut self, layer: LayerId, feature_index: usize, html: &str);
}

/// A call made against a [`RecordingMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum MapCall {
    /// [`MapHandle::add_layer`].
    AddLayer {
        /// Assigned id.
        id: LayerId,
        /// Number of features in the layer.
        features: usize,
    },
    /// [`MapHandle::remove_layer`].
    RemoveLayer {
        /// Removed id.
        id: LayerId,
    },
    /// [`MapHandle::set_view`].
    SetView {
        /// Latitude.
        lat: f64,
        /// Longitude.
        lon: f64,
        /// Zoom level.
        zoom: u8,
    },
    /// [`MapHandle::fit_bounds`].
    FitBounds {
        /// Requested bounds.
        bounds: BoundingBox,
    },
    /// [`MapHandle::bind_popup`].
    BindPopup {
        /// Target layer.
        layer: LayerId,
        /// Target feature index.
        feature_index: usize,
        /// Popup content.
        html: String,
    },
}

/// In-memory map that records every call and keeps the live layers.
///
/// Used in tests in place of a real map widget, and by the CLI to print
/// what would be drawn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingMap {
    /// Layers currently on the map.
    pub layers: BTreeMap<LayerId, Layer>,
    /// Popups bound per layer, keyed by feature index.
    pub popups: BTreeMap<LayerId, BTreeMap<usize, String>>,
    /// Every call, in order.
    pub calls: Vec<MapCall>,
    #[serde(skip)]
    next_id: u64,
}

impl RecordingMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent view change, if any.
    #[must_use]
    pub fn last_view_call(&self) -> Option<&MapCall> {
        self.calls
            .iter()
            .rev()
            .find(|call| matches!(call, MapCall::SetView { .. } | MapCall::FitBounds { .. }))
    }
}

impl MapHandle for RecordingMap {
    fn add_layer(&mut self, layer: Layer) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.calls.push(MapCall::AddLayer {
            id,
            features: layer.len(),
        });
        self.layers.insert(id, layer);
        id
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.calls.push(MapCall::RemoveLayer { id });
        self.layers.remove(&id);
        self.popups.remove(&id);
    }

    fn set_view(&mut self, lat: f64, lon: f64, zoom: u8) {
        self.calls.push(MapCall::SetView { lat, lon, zoom });
    }

    fn fit_bounds(&mut self, bounds: BoundingBox) {
        self.calls.push(MapCall::FitBounds { bounds });
    }

    fn bind_popup(&mut self, layer: LayerId, feature_index: usize, html: &str) {
        self.calls.push(MapCall::BindPopup {
            layer,
            feature_index,
            html: html.to_string(),
        });
        self.popups
            .entry(layer)
            .or_default()
            .insert(feature_index, html.to_string());
    }
}
