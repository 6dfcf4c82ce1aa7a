//! Status-pixel signal engine.
//!
//! The device has a single RGB pixel and no display, so device status is
//! communicated through static colors and repeating color sequences. The
//! engine owns at most one [`SignalPattern`] at a time; every signaling
//! request replaces the previous one wholesale.
//!
//! The engine never touches hardware: [`SignalEngine::tick`] returns a color
//! exactly when the physical pixel must change, and the shell pushes it out.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use rgb::RGB8;
use thiserror_no_std::Error;

/// Maximum number of steps in a color sequence.
pub const PATTERN_CAPACITY: usize = 20;

/// Pixel off.
pub const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };
pub const RED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };
pub const BLUE: RGB8 = RGB8 { r: 0, g: 0, b: 255 };

/// Configuration errors reported at the call site; the engine itself has no
/// runtime failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("signal pattern has no steps")]
    EmptyPattern,
    #[error("signal pattern exceeds {PATTERN_CAPACITY} steps")]
    PatternTooLong,
}

/// An active cyclic color sequence with a fixed step interval.
struct SignalPattern {
    colors: Vec<RGB8, PATTERN_CAPACITY>,
    interval: Duration,
    cursor: usize,
    next_step: Instant,
}

/// Drives the single status pixel through static colors or timed repeating
/// color sequences.
pub struct SignalEngine {
    pattern: Option<SignalPattern>,
    pending: Option<RGB8>,
}

impl SignalEngine {
    pub const fn new() -> Self {
        Self {
            pattern: None,
            pending: None,
        }
    }

    /// Set the pixel to a fixed color, cancelling any running pattern.
    pub fn set_static(&mut self, color: RGB8) {
        self.pattern = None;
        self.pending = Some(color);
    }

    /// Begin cycling through `colors` with period `interval`, wrapping to the
    /// first color after the last. Runs until replaced or stopped.
    ///
    /// The first color is emitted on the next [`tick`](Self::tick); each
    /// subsequent step advances one `interval` later.
    pub fn set_pattern(
        &mut self,
        colors: &[RGB8],
        interval: Duration,
        now: Instant,
    ) -> Result<(), SignalError> {
        if colors.is_empty() {
            return Err(SignalError::EmptyPattern);
        }
        let mut steps: Vec<RGB8, PATTERN_CAPACITY> = Vec::new();
        steps
            .extend_from_slice(colors)
            .map_err(|_| SignalError::PatternTooLong)?;

        self.pending = Some(steps[0]);
        self.pattern = Some(SignalPattern {
            cursor: 1 % steps.len(),
            colors: steps,
            interval,
            next_step: now + interval,
        });
        Ok(())
    }

    /// Turn the pixel off and cancel any running pattern.
    pub fn stop(&mut self) {
        self.pattern = None;
        self.pending = Some(BLACK);
    }

    /// Whether a repeating pattern is currently active.
    pub fn is_patterning(&self) -> bool {
        self.pattern.is_some()
    }

    /// Advance the engine to `now`.
    ///
    /// Returns the color to push to the pixel when it must change. A stalled
    /// loop catches up whole steps so the cycle position stays aligned, but
    /// only the most recent color is pushed.
    pub fn tick(&mut self, now: Instant) -> Option<RGB8> {
        if let Some(pattern) = &mut self.pattern {
            while now >= pattern.next_step {
                self.pending = Some(pattern.colors[pattern.cursor]);
                pattern.cursor = (pattern.cursor + 1) % pattern.colors.len();
                pattern.next_step = pattern.next_step + pattern.interval;
            }
        }
        self.pending.take()
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new()
    }
}
