//! Frame timing
//!
//! [`Clock`] is the single per-process frame timer: the host loop calls
//! [`Clock::update`] exactly once at the top of every frame, and anything
//! needing per-frame deltas reads [`Clock::delta_time`]. There is no global
//! instance; construct one at startup and pass it by reference.

use std::time::Instant;

/// Per-frame wall-clock state driven by a monotonic time source.
///
/// Times are seconds since the clock was constructed. Before the first
/// [`Clock::update`] call, `delta_time` and `current_time` are both `0.0`
/// by convention.
#[derive(Debug)]
pub struct Clock {
    epoch: Instant,
    current_time: f64,
    previous_time: f64,
    delta_time: f64,
    frame_count: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create a new clock with its epoch at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            current_time: 0.0,
            previous_time: 0.0,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the clock by one frame from the monotonic system clock.
    ///
    /// Must be called exactly once per frame, before any tick or draw work.
    pub fn update(&mut self) {
        self.advance_to(self.epoch.elapsed().as_secs_f64());
    }

    /// Advance the clock by one frame to an explicit timestamp in seconds.
    ///
    /// This is the injection point for synthetic time sources (tests,
    /// deterministic replay). The delta is clamped to zero if `now` is
    /// behind the current time, so `delta_time() >= 0.0` always holds.
    pub fn advance_to(&mut self, now: f64) {
        self.previous_time = self.current_time;
        self.current_time = self.current_time.max(now);
        self.delta_time = self.current_time - self.previous_time;
        self.frame_count += 1;
    }

    /// Seconds elapsed between the two most recent `update` calls.
    #[must_use]
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Seconds between the clock epoch and the most recent `update` call.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Timestamp of the frame before the most recent `update` call.
    #[must_use]
    pub fn previous_time(&self) -> f64 {
        self.previous_time
    }

    /// Number of `update` calls since construction.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second since the clock epoch.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        if self.current_time > 0.0 {
            self.frame_count as f64 / self.current_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_before_first_update_is_zero() {
        let clock = Clock::new();
        assert_eq!(clock.delta_time(), 0.0);
        assert_eq!(clock.current_time(), 0.0);
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn test_synthetic_frame_delta() {
        let mut clock = Clock::new();
        clock.advance_to(0.0);
        clock.advance_to(0.016);
        assert_relative_eq!(clock.delta_time(), 0.016, epsilon = 1e-9);
        assert_relative_eq!(clock.current_time(), 0.016, epsilon = 1e-9);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_delta_never_negative() {
        let mut clock = Clock::new();
        clock.advance_to(1.0);
        clock.advance_to(0.5); // time source misbehaving
        assert!(clock.delta_time() >= 0.0);
        assert_relative_eq!(clock.current_time(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_update_uses_monotonic_source() {
        let mut clock = Clock::new();
        clock.update();
        let first = clock.current_time();
        clock.update();
        assert!(clock.current_time() >= first);
        assert!(clock.delta_time() >= 0.0);
    }

    #[test]
    fn test_average_fps() {
        let mut clock = Clock::new();
        for frame in 1..=60 {
            clock.advance_to(f64::from(frame) / 60.0);
        }
        assert_relative_eq!(clock.average_fps(), 60.0, epsilon = 1e-6);
    }
}
