use std::collections::VecDeque;
/// Number of samples kept per device for the rolling plot.
pub const DEFAULT_CAPACITY: usize = 300;
/// One reported value and the UNIX time (seconds) it arrived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}
/// Fixed-capacity FIFO of samples; pushing into a full buffer evicts the
/// oldest entry.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}
impl Default for SampleBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
impl SampleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn push(&mut self, timestamp: f64, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { timestamp, value });
    }
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
    /// Plot coordinates relative to `now`: x is minutes before `now` (so the
    /// newest sample sits at or just below 0), y is the value.
    pub fn relative_minutes(&self, now: f64) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .map(|s| [(s.timestamp - now) / 60.0, s.value])
            .collect()
    }
}
