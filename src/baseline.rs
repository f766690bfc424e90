//! Neutral baseline tracking.
//!
//! The baseline is the position treated as "looking straight at the page".
//! Offsets are measured against it, so it has to follow slow posture drift
//! without following the deliberate gestures it is supposed to detect.

use crate::config::BaselinePolicy;
use log::trace;

/// Baseline for one signal
#[derive(Debug, Clone)]
pub struct BaselineTracker {
    policy: BaselinePolicy,
    value: Option<f64>,
    frames: u32,
}

impl BaselineTracker {
    /// Create an unset baseline with the given update policy
    #[must_use]
    pub const fn new(policy: BaselinePolicy) -> Self {
        Self {
            policy,
            value: None,
            frames: 0,
        }
    }

    /// Feed the current smoothed value; returns the baseline after the update
    pub fn observe(&mut self, smoothed: f64) -> f64 {
        match self.policy {
            BaselinePolicy::Periodic { interval } => {
                if self.frames == 0 {
                    trace!("Periodic baseline update: {smoothed:.4}");
                    self.value = Some(smoothed);
                }
                self.frames = (self.frames + 1) % interval.max(1);
            }
            BaselinePolicy::EventDriven => {
                if self.value.is_none() {
                    self.value = Some(smoothed);
                }
            }
        }
        self.value.unwrap_or(smoothed)
    }

    /// Unconditionally move the baseline
    pub fn rebase(&mut self, value: f64) {
        trace!("Baseline rebased to {value:.4}");
        self.value = Some(value);
    }

    /// A gesture command fired; the event-driven policy follows the gaze
    pub fn on_command_fired(&mut self, smoothed: f64) {
        if self.policy == BaselinePolicy::EventDriven {
            self.rebase(smoothed);
        }
    }

    /// Current baseline, `None` until the first sample after presence
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// Offset of a smoothed value from the baseline
    #[must_use]
    pub fn offset(&self, smoothed: f64) -> Option<f64> {
        self.value.map(|baseline| smoothed - baseline)
    }

    /// Forget the baseline and restart the periodic counter
    pub fn reset(&mut self) {
        self.value = None;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_updates_every_interval() {
        let mut baseline = BaselineTracker::new(BaselinePolicy::Periodic { interval: 3 });
        assert_eq!(baseline.value(), None);

        assert_eq!(baseline.observe(1.0), 1.0);
        assert_eq!(baseline.observe(2.0), 1.0);
        assert_eq!(baseline.observe(3.0), 1.0);
        assert_eq!(baseline.observe(4.0), 4.0);
        assert_eq!(baseline.offset(4.5), Some(0.5));
    }

    #[test]
    fn test_event_driven_only_seeds_once() {
        let mut baseline = BaselineTracker::new(BaselinePolicy::EventDriven);
        assert_eq!(baseline.observe(0.5), 0.5);
        assert_eq!(baseline.observe(0.9), 0.5);

        baseline.on_command_fired(0.9);
        assert_eq!(baseline.value(), Some(0.9));
    }

    #[test]
    fn test_periodic_ignores_fired_commands() {
        let mut baseline = BaselineTracker::new(BaselinePolicy::Periodic { interval: 30 });
        baseline.observe(0.5);
        baseline.on_command_fired(0.7);
        assert_eq!(baseline.value(), Some(0.5));
    }

    #[test]
    fn test_reset_reseeds_on_next_sample() {
        let mut baseline = BaselineTracker::new(BaselinePolicy::Periodic { interval: 5 });
        baseline.observe(0.5);
        baseline.observe(0.6);
        baseline.reset();
        assert_eq!(baseline.offset(0.6), None);
        assert_eq!(baseline.observe(0.61), 0.61);
    }
}
