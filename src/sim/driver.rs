use crate::clock::Clock;

/// Turns wall-clock frames into capped simulation timesteps.
///
/// Real-time drivers (an animation callback, the viz window) call
/// [`next_dt`](Self::next_dt) once per frame and feed the result to
/// `Simulation::tick`. Capping keeps a stalled frame from becoming one huge
/// integration step.
#[derive(Debug, Clone)]
pub struct FrameTimer<C: Clock> {
    clock: C,
    last: Option<f64>,
    max_dt: f64,
}

impl<C: Clock> FrameTimer<C> {
    pub fn new(clock: C, max_dt: f64) -> Self {
        Self { clock, last: None, max_dt }
    }

    /// Elapsed time since the previous frame, at most `max_dt`.
    /// `None` on the first frame and whenever no time has passed.
    pub fn next_dt(&mut self) -> Option<f64> {
        let now = self.clock.now();
        let elapsed = self.last.map(|prev| now - prev);
        self.last = Some(now);
        elapsed
            .filter(|dt| dt.is_finite() && *dt > 0.0)
            .map(|dt| dt.min(self.max_dt))
    }

    /// Forget the previous frame, e.g. after the loop was paused.
    pub fn restart(&mut self) {
        self.last = None;
    }

    pub fn max_dt(&self) -> f64 {
        self.max_dt
    }
}
