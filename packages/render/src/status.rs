//! Processing-status indicator.
//!
//! While the backend is still analyzing imagery it flags at least one
//! feature with `waiting: true`. The indicator then counts down from
//! [`COUNTDOWN_SECONDS`], one [`StatusIndicator::tick`] per second, and gives
//! up with a "reload soon" message when it reaches zero. The countdown is
//! purely local feedback: it never asks the backend anything, so real
//! completion is only observed by fetching and rendering again.
//!
//! The indicator does not own a clock. Whoever drives it (a timer in the
//! client, or a test) calls `tick` and stops calling once it returns
//! [`TickOutcome::Stop`].

use damage_map_feature_models::FeatureCollection;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Seconds the countdown starts from.
pub const COUNTDOWN_SECONDS: u32 = 30;

/// Shown when no feature is waiting on the backend.
pub const COMPLETE_TEXT: &str = "Analysis complete.";

/// Shown once the countdown runs out.
pub const TIMED_OUT_TEXT: &str = "Still processing ... reload soon.";

/// Text shown while counting down.
#[must_use]
pub fn counting_text(remaining: u32) -> String {
    format!("Processing analysis ... ({remaining}s)")
}

/// The two handles the indicator writes to: a text element and a spinner.
pub trait StatusHandle {
    /// Replaces the status text.
    fn set_text(&mut self, text: &str);

    /// Shows or hides the spinner.
    fn set_spinner_visible(&mut self, visible: bool);
}

/// State of the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusState {
    /// Nothing started yet, or the countdown was cancelled.
    Idle,
    /// Waiting on the backend, `remaining` seconds left.
    Counting {
        /// Seconds left before giving up.
        remaining: u32,
    },
    /// Countdown ran out while the backend was still busy.
    TimedOut,
    /// No feature was waiting.
    Complete,
}

/// Whether the driver should keep ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Schedule another tick in one second.
    Continue,
    /// Stop the timer; the indicator reached a terminal state.
    Stop,
}

/// Countdown state machine for the processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIndicator {
    state: StatusState,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator {
    /// Creates an idle indicator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: StatusState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> StatusState {
        self.state
    }

    /// Whether a countdown is running and needs ticks.
    #[must_use]
    pub const fn is_counting(&self) -> bool {
        matches!(self.state, StatusState::Counting { .. })
    }

    /// Starts a new cycle for `collection`.
    ///
    /// Any countdown still running from a previous cycle is replaced.
    pub fn start(&mut self, collection: &FeatureCollection, handle: &mut impl StatusHandle) {
        if let Some(waiting) = collection.waiting_feature() {
            log::debug!(
                "Feature {:?} is still processing, starting {COUNTDOWN_SECONDS}s countdown",
                waiting.foreign_members.get("id")
            );
            self.state = StatusState::Counting {
                remaining: COUNTDOWN_SECONDS,
            };
            handle.set_text(&counting_text(COUNTDOWN_SECONDS));
            handle.set_spinner_visible(true);
        } else {
            self.state = StatusState::Complete;
            handle.set_text(COMPLETE_TEXT);
            handle.set_spinner_visible(false);
        }
    }

    /// Advances the countdown by one second.
    ///
    /// Outside [`StatusState::Counting`] this does nothing and returns
    /// [`TickOutcome::Stop`].
    pub fn tick(&mut self, handle: &mut impl StatusHandle) -> TickOutcome {
        let StatusState::Counting { remaining } = self.state else {
            return TickOutcome::Stop;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.state = StatusState::Counting { remaining };
            handle.set_text(&counting_text(remaining));
            TickOutcome::Continue
        } else {
            log::info!("Analysis still running after {COUNTDOWN_SECONDS}s");
            self.state = StatusState::TimedOut;
            handle.set_text(TIMED_OUT_TEXT);
            handle.set_spinner_visible(false);
            TickOutcome::Stop
        }
    }

    /// Stops a running countdown without touching the handles.
    ///
    /// Terminal states are left as they are.
    pub fn cancel(&mut self) {
        if self.is_counting() {
            log::debug!("Cancelling processing countdown");
            self.state = StatusState::Idle;
        }
    }
}

/// A [`StatusHandle`] that remembers what was written to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingStatus {
    /// Current text.
    pub text: String,
    /// Whether the spinner is shown.
    pub spinner_visible: bool,
    /// Number of text updates received.
    pub updates: usize,
}

impl StatusHandle for RecordingStatus {
    fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.text);
        self.updates += 1;
    }

    fn set_spinner_visible(&mut self, visible: bool) {
        self.spinner_visible = visible;
    }
}
