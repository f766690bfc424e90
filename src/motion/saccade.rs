//! Fast saccade detection on the raw (unsmoothed) signal.

use super::Direction;
use crate::config::SaccadeConfig;
use log::debug;
use std::time::Duration;

/// Detects large jumps between two consecutive frames
#[derive(Debug, Clone)]
pub struct SaccadeDetector {
    quick_threshold: f64,
    quick_time: Duration,
    previous: Option<(f64, Duration)>,
}

impl SaccadeDetector {
    /// Create a detector. The config must have been validated.
    #[must_use]
    pub fn new(config: &SaccadeConfig) -> Self {
        Self {
            quick_threshold: config.quick_threshold,
            quick_time: Duration::from_secs_f64(config.quick_time),
            previous: None,
        }
    }

    /// Record this frame's raw value. Returns the direction of travel when
    /// the signal moved more than the threshold in less than the quick time:
    /// increasing values (gaze moving down) map to `Down`.
    pub fn observe(&mut self, raw: f64, now: Duration) -> Option<Direction> {
        let detected = self.previous.and_then(|(last, at)| {
            let movement = raw - last;
            let elapsed = now.saturating_sub(at);
            (elapsed < self.quick_time && movement.abs() > self.quick_threshold).then(|| {
                debug!("Saccade: moved {movement:+.4} in {:.3}s", elapsed.as_secs_f64());
                if movement > 0.0 {
                    Direction::Down
                } else {
                    Direction::Up
                }
            })
        });
        self.previous = Some((raw, now));
        detected
    }

    /// Forget the previous frame
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
