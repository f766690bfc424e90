//! Signal smoothing.
//!
//! Raw landmark positions jitter from frame to frame. Every tracked signal
//! gets its own low-pass filter so that the motion classifiers see a stable
//! value.

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::features::Signal;
use exponential::ExponentialFilter;
use std::collections::BTreeMap;

/// Trait for all scalar signal filters
pub trait SignalFilter: Send + Sync {
    /// Apply filter to a new sample and return the filtered value
    fn apply(&mut self, sample: f64) -> f64;

    /// Last filtered value, `None` before the first sample
    fn current(&self) -> Option<f64>;

    /// Force the filter output to a sample, discarding history
    fn snap(&mut self, sample: f64);

    /// Reset filter state
    fn reset(&mut self);
}

/// One exponential filter per tracked signal
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f64,
    filters: BTreeMap<Signal, ExponentialFilter>,
}

impl Smoother {
    /// Create a smoother with the given smoothing factor
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            filters: BTreeMap::new(),
        }
    }

    /// Feed a raw sample for a signal and return the smoothed value
    pub fn update(&mut self, signal: Signal, raw: f64) -> f64 {
        let alpha = self.alpha;
        self.filters
            .entry(signal)
            .or_insert_with(|| ExponentialFilter::new(alpha))
            .apply(raw)
    }

    /// Current smoothed value for a signal
    #[must_use]
    pub fn value(&self, signal: Signal) -> Option<f64> {
        self.filters.get(&signal).and_then(SignalFilter::current)
    }

    /// Reseed one signal to a raw value
    pub fn snap(&mut self, signal: Signal, raw: f64) {
        let alpha = self.alpha;
        self.filters
            .entry(signal)
            .or_insert_with(|| ExponentialFilter::new(alpha))
            .snap(raw);
    }

    /// Forget all smoothed values
    pub fn reset(&mut self) {
        for filter in self.filters.values_mut() {
            filter.reset();
        }
    }
}
