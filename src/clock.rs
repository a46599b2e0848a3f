use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Time sources
// ---------------------------------------------------------------------------

/// Monotonic time source, in seconds since an arbitrary epoch.
///
/// Stepping operations take an explicit `dt`; a clock is only consulted by
/// callers that ask for wall-clock timing (`PidController::calculate_now`,
/// `FrameTimer`). Tests inject a [`ManualClock`] to drive synthetic time.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-advanced clock. Clones share the same time, so a test can keep one
/// handle and give another to the component under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { time: Rc::new(Cell::new(start)) }
    }

    pub fn advance(&self, dt: f64) {
        self.time.set(self.time.get() + dt);
    }

    pub fn set(&self, t: f64) {
        self.time.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_handles_share_time() {
        let clock = ManualClock::new(1.0);
        let handle = clock.clone();
        handle.advance(0.25);
        assert!((clock.now() - 1.25).abs() < 1e-12);
        clock.set(3.0);
        assert!((handle.now() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
