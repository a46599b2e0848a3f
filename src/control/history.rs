use std::collections::VecDeque;

/// One control tick, as seen by the analytics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub error: f64,
    pub output: f64,
    pub measurement: f64,
    pub setpoint: f64,
    pub dt: f64,
}

/// Fixed-capacity ring of recent samples; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// The newest `n` samples (fewer if the history is shorter), oldest first.
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip)
    }

    pub fn errors(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.error)
    }
}
