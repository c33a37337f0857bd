#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the damage map toolchain.
//!
//! Provides [`SpinnerStatus`], an `indicatif`-backed implementation of the
//! renderer's [`StatusHandle`], plus [`init_logger`] which sets up
//! `indicatif-log-bridge` so that `log::info!` and friends are suspended
//! while the spinner redraws.

use std::time::Duration;

use damage_map_render::StatusHandle;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Terminal status line: the message is the status text, the spinner
/// glyph is shown only while processing.
pub struct SpinnerStatus {
    bar: ProgressBar,
    spinning: ProgressStyle,
    idle: ProgressStyle,
}

impl SpinnerStatus {
    /// Adds a status line to `multi`. The spinner starts hidden.
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());

        let spinning = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let idle = ProgressStyle::with_template("  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        bar.set_style(idle.clone());

        Self {
            bar,
            spinning,
            idle,
        }
    }

    /// Leaves the last message on screen and stops redrawing.
    pub fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.set_style(self.idle.clone());
        self.bar.finish();
    }
}

impl StatusHandle for SpinnerStatus {
    fn set_text(&mut self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn set_spinner_visible(&mut self, visible: bool) {
        if visible {
            self.bar.set_style(self.spinning.clone());
            self.bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            self.bar.disable_steady_tick();
            self.bar.set_style(self.idle.clone());
            self.bar.tick();
        }
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while the status spinner redraws.
///
/// Returns the [`MultiProgress`] that status lines must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // Build the pretty-env-logger logger manually so we can wrap it.
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    #[test]
    fn status_text_becomes_bar_message() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let mut status = SpinnerStatus::new(&multi);

        status.set_text("Processing analysis ... (30s)");
        status.set_spinner_visible(true);
        assert_eq!(status.bar.message(), "Processing analysis ... (30s)");

        status.set_text("Analysis complete.");
        status.set_spinner_visible(false);
        status.finish();
        assert_eq!(status.bar.message(), "Analysis complete.");
        assert!(status.bar.is_finished());
    }
}
