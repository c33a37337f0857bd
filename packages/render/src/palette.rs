//! Class keys and the class -> color table.
//!
//! The built-in table covers the damage-assessment classes the analysis
//! backend emits. A TOML palette can override or extend it without any
//! change to the render pipeline:
//!
//! ```toml
//! fallback = "#FF00FF"
//!
//! [colors]
//! water = "#1E90FF"
//! "Building-Total-Destruction" = "#8B0000"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use damage_map_feature_models::{display_value, is_truthy};
use serde::Deserialize;
use serde_json::Value;

/// Key used for features without a class.
pub const BACKGROUND_CLASS: &str = "background";

/// Color for classes missing from the table. Magenta, so unmapped classes
/// stand out on the map instead of blending in.
pub const FALLBACK_COLOR: &str = "#FF00FF";

/// Built-in class colors, keyed by normalized class key.
pub const DEFAULT_COLORS: &[(&str, &str)] = &[
    ("background", "#000000"),
    ("water", "#00BFFF"),
    ("building-no-damage", "#A0522D"),
    ("building-medium-damage", "#FFFF00"),
    ("building-major-damage", "#FFA500"),
    ("building-total-destruction", "#FF0000"),
    ("vehicle", "#FF00FF"),
    ("road-clear", "#808080"),
    ("road-blocked", "#808000"),
    ("tree", "#00FF00"),
    ("pool", "#0080FF"),
    ("center", "#3399FF"),
];

/// Errors that can occur while loading a palette override.
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    /// Palette file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Palette file is not valid TOML or has the wrong shape.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A class was mapped to an empty color.
    #[error("Empty color for class '{class}'")]
    EmptyColor {
        /// The offending class key.
        class: String,
    },
}

/// Normalizes a raw `class` property into a lookup key.
///
/// Lower-cases and trims. Absent, null, and other falsy classes map to
/// [`BACKGROUND_CLASS`]. A whitespace-only class trims to an empty key,
/// which has no color of its own and gets the fallback.
#[must_use]
pub fn class_key_of(class: Option<&Value>) -> String {
    class
        .filter(|v| is_truthy(v))
        .map_or_else(
            || BACKGROUND_CLASS.to_string(),
            |class| display_value(class).trim().to_lowercase(),
        )
}

/// Shape of a palette TOML file.
#[derive(Debug, Deserialize)]
struct PaletteFile {
    fallback: Option<String>,
    #[serde(default)]
    colors: BTreeMap<String, String>,
}

/// Lookup table from class key to color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassColorMap {
    colors: BTreeMap<String, String>,
    fallback: String,
}

impl Default for ClassColorMap {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS
                .iter()
                .map(|(class, color)| ((*class).to_string(), (*color).to_string()))
                .collect(),
            fallback: FALLBACK_COLOR.to_string(),
        }
    }
}

impl ClassColorMap {
    /// Parses a TOML palette and layers it over the built-in table.
    ///
    /// Class names in the file are normalized the same way feature classes
    /// are, so `"Water"` and `" water "` both override `water`.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError`] if the TOML is malformed or maps a class to
    /// an empty color.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, PaletteError> {
        let file: PaletteFile = toml::de::from_str(toml_str)?;
        let mut palette = Self::default();

        for (class, color) in file.colors {
            let color = color.trim();
            if color.is_empty() {
                return Err(PaletteError::EmptyColor { class });
            }
            let key = class_key_of(Some(&Value::String(class)));
            palette.colors.insert(key, color.to_string());
        }

        if let Some(fallback) = file.fallback {
            let fallback = fallback.trim();
            if fallback.is_empty() {
                return Err(PaletteError::EmptyColor {
                    class: "fallback".to_string(),
                });
            }
            palette.fallback = fallback.to_string();
        }

        log::debug!("Loaded palette with {} classes", palette.colors.len());

        Ok(palette)
    }

    /// Reads a TOML palette file.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, PaletteError> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }

    /// Color mapped to `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.colors.get(key).map(String::as_str)
    }

    /// Color for `key`, or the fallback color. Never empty.
    #[must_use]
    pub fn color_for(&self, key: &str) -> &str {
        self.get(key).unwrap_or(self.fallback.as_str())
    }

    /// The color used for unmapped classes.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Number of mapped classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no classes are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
