#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Renders normalized damage-assessment collections onto a map.
//!
//! The [`Renderer`] turns a [`FeatureCollection`] into a single styled
//! [`Layer`], binds a popup to every feature, picks the initial viewport,
//! and starts the processing-status countdown. The map widget and the
//! status elements are collaborators passed in through the [`MapHandle`]
//! and [`StatusHandle`] traits, so the whole pipeline runs against
//! [`RecordingMap`] and [`RecordingStatus`] in tests.

pub mod export;
pub mod map;
pub mod palette;
pub mod popup;
pub mod status;
pub mod style;
pub mod view;

use damage_map_feature_models::{FeatureCollection, ViewState};
use serde::Serialize;

pub use export::{ExportError, feature_to_geojson, to_geojson};
pub use map::{Layer, LayerId, MapCall, MapHandle, RecordingMap, RenderedFeature};
pub use palette::{ClassColorMap, PaletteError, class_key_of};
pub use popup::popup_html;
pub use status::{RecordingStatus, StatusHandle, StatusIndicator, StatusState, TickOutcome};
pub use style::{FeatureStyle, style_for};
pub use view::derive_view;

/// Summary of one [`Renderer::render`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    /// Layer added for this collection.
    pub layer: LayerId,
    /// Number of features drawn.
    pub rendered: usize,
    /// Viewport change applied.
    pub view: ViewState,
    /// Status indicator state right after the render.
    pub status: StatusState,
}

/// Builds the styled layer for `collection` without touching any map.
#[must_use]
pub fn build_layer(collection: &FeatureCollection, palette: &ClassColorMap) -> Layer {
    Layer {
        features: collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| RenderedFeature {
                index,
                geometry: feature.geometry.clone(),
                style: style_for(feature, palette),
            })
            .collect(),
    }
}

/// Draws collections onto a map, keeping at most one layer alive.
///
/// Rendering again on the same renderer removes the layer from the
/// previous call and cancels its countdown before drawing the new one.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    palette: ClassColorMap,
    layer: Option<LayerId>,
    status: StatusIndicator,
}

impl Renderer {
    /// Creates a renderer using `palette` for class colors.
    #[must_use]
    pub const fn new(palette: ClassColorMap) -> Self {
        Self {
            palette,
            layer: None,
            status: StatusIndicator::new(),
        }
    }

    /// The class palette in use.
    #[must_use]
    pub const fn palette(&self) -> &ClassColorMap {
        &self.palette
    }

    /// Layer added by the last render, if it is still on the map.
    #[must_use]
    pub const fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// The processing-status state machine.
    #[must_use]
    pub const fn status(&self) -> &StatusIndicator {
        &self.status
    }

    /// Renders `collection`.
    ///
    /// Adds exactly one layer, binds one popup per feature, applies the
    /// derived view, and starts the status indicator. Call [`Self::tick`]
    /// once per second afterwards while it returns
    /// [`TickOutcome::Continue`].
    pub fn render(
        &mut self,
        collection: &FeatureCollection,
        map: &mut impl MapHandle,
        status: &mut impl StatusHandle,
    ) -> RenderOutcome {
        self.clear(map);

        let layer = build_layer(collection, &self.palette);
        let rendered = layer.len();
        let id = map.add_layer(layer);
        self.layer = Some(id);

        for (index, feature) in collection.features.iter().enumerate() {
            map.bind_popup(id, index, &popup_html(feature));
        }

        let view = derive_view(collection);
        match view {
            ViewState::Center { lat, lon, zoom } => map.set_view(lat, lon, zoom),
            ViewState::FitBounds(bounds) => map.fit_bounds(bounds),
            ViewState::Unchanged => {}
        }

        self.status.start(collection, status);

        log::info!(
            "Rendered {rendered} features as layer {}, status {}",
            id.0,
            self.status.state()
        );

        RenderOutcome {
            layer: id,
            rendered,
            view,
            status: self.status.state(),
        }
    }

    /// Advances the status countdown by one second.
    pub fn tick(&mut self, status: &mut impl StatusHandle) -> TickOutcome {
        self.status.tick(status)
    }

    /// Removes the current layer from `map` and cancels any countdown.
    pub fn clear(&mut self, map: &mut impl MapHandle) {
        self.status.cancel();
        if let Some(previous) = self.layer.take() {
            log::debug!("Removing previous layer {}", previous.0);
            map.remove_layer(previous);
        }
    }
}
