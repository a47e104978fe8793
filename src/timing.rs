//! Microsecond time sources used to bound the length of a simulation step.

use std::cell::Cell;
use std::time::Instant;

/// A monotonic microsecond clock.
pub trait Clock: std::fmt::Debug {
    /// Microseconds since an arbitrary fixed origin. Never decreases.
    fn now_usec(&self) -> u64;
}

/// Wall-clock time measured from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_usec(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// A clock that only moves when told to. Each reading can optionally advance
/// it by a fixed step, which makes time budgets deterministic in tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    step_per_read: u64,
}

impl ManualClock {
    pub fn new(start_usec: u64) -> Self {
        Self {
            now: Cell::new(start_usec),
            step_per_read: 0,
        }
    }

    /// A clock that advances by `step_usec` after every reading.
    pub fn ticking(start_usec: u64, step_usec: u64) -> Self {
        Self {
            now: Cell::new(start_usec),
            step_per_read: step_usec,
        }
    }

    pub fn advance(&self, usec: u64) {
        self.now.set(self.now.get().saturating_add(usec));
    }
}

impl Clock for ManualClock {
    fn now_usec(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step_per_read));
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let a = clock.now_usec();
        let b = clock.now_usec();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_usec(), 100);
        clock.advance(50);
        assert_eq!(clock.now_usec(), 150);
    }

    #[test]
    fn test_manual_clock_ticking() {
        let clock = ManualClock::ticking(0, 10);
        assert_eq!(clock.now_usec(), 0);
        assert_eq!(clock.now_usec(), 10);
        assert_eq!(clock.now_usec(), 20);
    }
}
