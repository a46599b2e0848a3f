use std::collections::VecDeque;

use nalgebra::Vector2;

/// One recorded render position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Vector2<f64>, // m, [lateral, height] of the body tip
    pub time: f64,         // s, simulation time of the sample
}

/// Bounded history of recent tip positions for drawing a motion trail.
///
/// Points expire after `timeout` seconds and the oldest are dropped once
/// `max_points` is exceeded. Visualization state only; physics never reads it.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    max_points: usize,
    timeout: f64,
}

impl Trail {
    pub fn new(max_points: usize, timeout: f64) -> Self {
        Self {
            points: VecDeque::with_capacity(max_points),
            max_points,
            timeout,
        }
    }

    pub fn record(&mut self, pos: Vector2<f64>, time: f64) {
        if self.max_points == 0 {
            return;
        }
        self.points.push_back(TrailPoint { pos, time });

        while let Some(front) = self.points.front() {
            if time - front.time > self.timeout {
                self.points.pop_front();
            } else {
                break;
            }
        }
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_past_max_points() {
        let mut trail = Trail::new(3, 100.0);
        for i in 0..5 {
            trail.record(Vector2::new(i as f64, 0.0), i as f64 * 0.01);
        }
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.iter().next().unwrap().pos.x, 2.0);
    }

    #[test]
    fn evicts_expired_points() {
        let mut trail = Trail::new(100, 1.0);
        trail.record(Vector2::zeros(), 0.0);
        trail.record(Vector2::zeros(), 0.5);
        trail.record(Vector2::zeros(), 1.6);
        // t=0.0 and t=0.5 are both older than 1 s at t=1.6
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn zero_capacity_disables_recording() {
        let mut trail = Trail::new(0, 1.0);
        trail.record(Vector2::zeros(), 0.0);
        assert!(trail.is_empty());
    }
}
