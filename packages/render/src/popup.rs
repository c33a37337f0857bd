//! Informational popup content bound to each rendered feature.

use damage_map_feature_models::{Feature, display_value};

/// Builds the popup HTML for `feature`.
///
/// Always shows the class (`N/A` when missing). Confidence is shown whenever
/// the property is present, including a confidence of `0`. Notes and the
/// creation timestamp are shown only when non-empty.
#[must_use]
pub fn popup_html(feature: &Feature) -> String {
    let class = feature.class_label().unwrap_or_else(|| "N/A".to_string());
    let mut html = format!("<strong>Class:</strong> {}", escape_html(&class));

    if let Some(confidence) = feature.confidence() {
        html.push_str(&format!(
            "<br><strong>Confidence:</strong> {}",
            escape_html(&display_value(confidence))
        ));
    }
    if let Some(notes) = feature.notes() {
        html.push_str(&format!(
            "<br><strong>Notes:</strong> {}",
            escape_html(&notes)
        ));
    }
    if let Some(created_at) = feature.created_at() {
        html.push_str(&format!(
            "<br><small><em>{}</em></small>",
            escape_html(&created_at)
        ));
    }

    html
}

/// Escapes text for inclusion in HTML element content.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
