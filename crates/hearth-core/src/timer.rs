//! Polled fixed-interval timers.
//!
//! The runtime has no preemptive scheduler; every periodic behavior (network
//! retry signaling, broker keepalive) is an explicit owned timer serviced by
//! the cooperative loop. Disarming is idempotent.

use embassy_time::{Duration, Instant};

/// A fixed-interval timer driven by the cooperative loop.
///
/// While armed, [`poll`](Self::poll) reports `true` once per elapsed
/// interval and re-arms itself from the observed time, so a stalled loop
/// produces one firing, not a burst.
pub struct PollTimer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl PollTimer {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Start (or restart) the timer; it first fires one interval from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Stop the timer. Idempotent.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Report whether the interval elapsed, re-arming for the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn fires_once_per_interval() {
        let mut timer = PollTimer::new(Duration::from_millis(100));
        timer.arm(at(0));
        assert!(!timer.poll(at(50)));
        assert!(timer.poll(at(100)));
        assert!(!timer.poll(at(150)));
        assert!(timer.poll(at(200)));
    }

    #[test]
    fn unarmed_timer_never_fires() {
        let mut timer = PollTimer::new(Duration::from_millis(100));
        assert!(!timer.poll(at(1000)));
    }

    #[test]
    fn disarm_is_idempotent() {
        let mut timer = PollTimer::new(Duration::from_millis(100));
        timer.arm(at(0));
        timer.disarm();
        timer.disarm();
        assert!(!timer.is_armed());
        assert!(!timer.poll(at(1000)));
    }

    #[test]
    fn stalled_loop_fires_once_and_realigns() {
        let mut timer = PollTimer::new(Duration::from_millis(100));
        timer.arm(at(0));
        assert!(timer.poll(at(950)));
        assert!(!timer.poll(at(1000)));
        assert!(timer.poll(at(1050)));
    }
}
