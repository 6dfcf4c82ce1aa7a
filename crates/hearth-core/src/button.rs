//! Button gesture classification.
//!
//! The detector is purely observational: the shell polls it once per loop
//! iteration with the current monotonic time and the raw (debounced-by-time)
//! input level, and it classifies edges into short and long presses. Holds
//! shorter than [`SHORT_PRESS_MIN`] are treated as contact bounce; holds
//! between [`SHORT_PRESS_MAX`] and [`LONG_PRESS`] are indeterminate and
//! silently discarded.

use embassy_time::{Duration, Instant};

/// Shortest hold that still counts as a deliberate press.
pub const SHORT_PRESS_MIN: Duration = Duration::from_millis(50);
/// Longest hold that still classifies as a short press on release.
pub const SHORT_PRESS_MAX: Duration = Duration::from_millis(500);
/// Hold duration past which a long press fires, while the button is still
/// held.
pub const LONG_PRESS: Duration = Duration::from_millis(5000);

/// A classified button interaction. Produced by [`GestureDetector::poll`],
/// consumed immediately by the orchestrator, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    ShortPress,
    LongPress,
}

/// Edge- and duration-based gesture state machine.
pub struct GestureDetector {
    last_state: bool,
    press_started_at: Instant,
    long_fired: bool,
}

impl GestureDetector {
    pub const fn new() -> Self {
        Self {
            last_state: false,
            press_started_at: Instant::from_ticks(0),
            long_fired: false,
        }
    }

    /// Classify the current input level against the press history.
    ///
    /// The long press fires exactly once mid-press, not on release; the
    /// short press fires on release only when no long press fired and the
    /// hold fell inside the short window.
    pub fn poll(&mut self, now: Instant, pressed: bool) -> Option<Gesture> {
        let mut gesture = None;

        if pressed {
            if self.last_state {
                if !self.long_fired && now - self.press_started_at > LONG_PRESS {
                    self.long_fired = true;
                    gesture = Some(Gesture::LongPress);
                }
            } else {
                self.press_started_at = now;
                self.long_fired = false;
            }
        } else if self.last_state {
            let held = now - self.press_started_at;
            if !self.long_fired && SHORT_PRESS_MIN < held && held < SHORT_PRESS_MAX {
                gesture = Some(Gesture::ShortPress);
            }
            self.long_fired = false;
        }

        self.last_state = pressed;
        gesture
    }
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new()
    }
}
