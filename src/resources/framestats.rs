//! Rolling frame-timing statistics.
//!
//! [`FrameStats`] keeps the most recent [`SAMPLE_COUNT`] durations and reports
//! their average and the matching rate per second. The logic thread keeps one
//! as a resource for update timings (`record` after each schedule run); the
//! render thread owns another and calls `tick` once per presented frame.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::Resource;

/// Samples kept per window.
pub const SAMPLE_COUNT: usize = 100;

#[derive(Resource, Debug, Clone)]
pub struct FrameStats {
    samples: VecDeque<Duration>,
    capacity: usize,
    last_tick: Option<Instant>,
    total: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::with_capacity(SAMPLE_COUNT)
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window of `capacity` samples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            last_tick: None,
            total: 0,
        }
    }

    /// Add a measured duration, evicting the oldest sample when full.
    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
        self.total += 1;
    }

    /// Record the time since the previous call. The first call only starts
    /// the clock.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.record(now.duration_since(last));
        }
    }

    /// Samples currently in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples recorded since creation, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn average(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: Duration = self.samples.iter().sum();
        Some(sum / self.samples.len() as u32)
    }

    pub fn max(&self) -> Option<Duration> {
        self.samples.iter().max().copied()
    }

    /// Average rate per second, `None` without samples or for a zero average.
    pub fn per_second(&self) -> Option<f64> {
        self.average()
            .map(|avg| avg.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .map(|secs| 1.0 / secs)
    }
}
