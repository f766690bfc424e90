//! Sustained dwell classifier.
//!
//! ```text
//! Idle --(direction)--> Tracking(dir, t0) --(hold elapsed, cooldown clear)--> fire
//!   ^                         |                                                 |
//!   +------(neutral/change)---+                                                 v
//!   +------------------(offset back in neutral band)------------------ ResetPending
//! ```
//!
//! `ResetPending` is the reset gate: after a fire nothing is evaluated until
//! the gaze returns to the neutral band, so one long look fires once.

use super::Direction;
use crate::config::DwellConfig;
use log::debug;
use std::time::Duration;

/// Dwell state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellPhase {
    /// No direction held
    Idle,
    /// A direction has been held since `since`
    Tracking { direction: Direction, since: Duration },
    /// A command fired; waiting for the gaze to return to neutral
    ResetPending,
}

/// Offsets from the baseline fed to the dwell classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellOffsets {
    pub vertical: f64,
    pub horizontal: Option<f64>,
}

/// A held direction that is due to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellTrigger {
    pub direction: Direction,
    /// Look-down-then-up gesture with the shortened hold time
    pub compound: bool,
}

/// Dwell classifier state
#[derive(Debug, Clone)]
pub struct DwellClassifier {
    down_threshold: f64,
    up_threshold: f64,
    horizontal_threshold: f64,
    neutral_band: f64,
    look_down_threshold: f64,
    hold_time: Duration,
    compound_hold_time: Duration,
    phase: DwellPhase,
}

impl DwellClassifier {
    /// Create a classifier. The config must have been validated.
    #[must_use]
    pub fn new(config: &DwellConfig) -> Self {
        Self {
            down_threshold: config.down_threshold,
            up_threshold: config.up_threshold,
            horizontal_threshold: config.horizontal_threshold,
            neutral_band: config.neutral_band,
            look_down_threshold: config.look_down_threshold,
            hold_time: Duration::from_secs_f64(config.hold_time),
            compound_hold_time: Duration::from_secs_f64(config.hold_time * config.compound_hold_factor),
            phase: DwellPhase::Idle,
        }
    }

    /// Direction of the offsets. Vertical wins over horizontal.
    ///
    /// Horizontal offsets are measured in the mirrored camera frame, so a
    /// positive offset is a turn to the `Left`.
    #[must_use]
    pub fn classify(&self, offsets: DwellOffsets) -> Option<Direction> {
        if offsets.vertical > self.down_threshold {
            return Some(Direction::Down);
        }
        if offsets.vertical < -self.up_threshold {
            return Some(Direction::Up);
        }
        match offsets.horizontal {
            Some(dx) if dx > self.horizontal_threshold => Some(Direction::Left),
            Some(dx) if dx < -self.horizontal_threshold => Some(Direction::Right),
            _ => None,
        }
    }

    /// Whether the offsets are inside the band that releases the reset gate
    #[must_use]
    pub fn in_neutral_band(&self, offsets: DwellOffsets) -> bool {
        offsets.vertical.abs() < self.neutral_band
            && offsets.horizontal.map_or(true, |dx| dx.abs() < self.neutral_band)
    }

    /// Whether the gaze is far enough down to count as reading the bottom of the page
    #[must_use]
    pub fn is_looking_down(&self, offsets: DwellOffsets) -> bool {
        offsets.vertical > self.look_down_threshold
    }

    /// Advance the state machine by one frame. Returns a trigger when a held
    /// direction is due; the phase stays `Tracking` until [`Self::on_fired`].
    pub fn evaluate(&mut self, offsets: DwellOffsets, now: Duration, read_to_bottom: bool) -> Option<DwellTrigger> {
        if self.phase == DwellPhase::ResetPending {
            if self.in_neutral_band(offsets) {
                debug!("Gaze back in neutral band, dwell re-armed");
                self.phase = DwellPhase::Idle;
            }
            return None;
        }

        let Some(direction) = self.classify(offsets) else {
            self.phase = DwellPhase::Idle;
            return None;
        };

        match self.phase {
            DwellPhase::Tracking { direction: held, since } if held == direction => {
                let elapsed = now.saturating_sub(since);
                let compound = read_to_bottom && direction == Direction::Up;
                let required = if compound { self.compound_hold_time } else { self.hold_time };
                (elapsed >= required).then_some(DwellTrigger { direction, compound })
            }
            _ => {
                debug!("Started tracking direction: {direction}");
                self.phase = DwellPhase::Tracking { direction, since: now };
                None
            }
        }
    }

    /// The trigger was dispatched: close the reset gate
    pub fn on_fired(&mut self) {
        self.phase = DwellPhase::ResetPending;
    }

    /// Drop an in-progress dwell without touching the reset gate
    pub fn cancel(&mut self) {
        if matches!(self.phase, DwellPhase::Tracking { .. }) {
            self.phase = DwellPhase::Idle;
        }
    }

    #[must_use]
    pub const fn phase(&self) -> DwellPhase {
        self.phase
    }

    #[must_use]
    pub fn reset_pending(&self) -> bool {
        self.phase == DwellPhase::ResetPending
    }

    pub fn reset(&mut self) {
        self.phase = DwellPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DwellClassifier {
        DwellClassifier::new(&DwellConfig {
            down_threshold: 0.05,
            up_threshold: 0.08,
            horizontal_threshold: 0.1,
            neutral_band: 0.025,
            look_down_threshold: 0.12,
            hold_time: 0.5,
            compound_hold_factor: 0.6,
            ..DwellConfig::default()
        })
    }

    fn vertical(dy: f64) -> DwellOffsets {
        DwellOffsets {
            vertical: dy,
            horizontal: None,
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_classify_2d() {
        let c = classifier();
        assert_eq!(c.classify(vertical(0.06)), Some(Direction::Down));
        assert_eq!(c.classify(vertical(-0.06)), None);
        assert_eq!(c.classify(vertical(-0.09)), Some(Direction::Up));
        let left = DwellOffsets {
            vertical: 0.0,
            horizontal: Some(0.2),
        };
        assert_eq!(c.classify(left), Some(Direction::Left));
        let right = DwellOffsets {
            vertical: 0.0,
            horizontal: Some(-0.2),
        };
        assert_eq!(c.classify(right), Some(Direction::Right));
        let both = DwellOffsets {
            vertical: 0.1,
            horizontal: Some(-0.2),
        };
        assert_eq!(c.classify(both), Some(Direction::Down));
    }

    #[test]
    fn test_fires_after_hold_time() {
        let mut c = classifier();
        assert_eq!(c.evaluate(vertical(0.1), secs(0.0), false), None);
        assert_eq!(c.evaluate(vertical(0.1), secs(0.3), false), None);
        let trigger = c.evaluate(vertical(0.1), secs(0.5), false).unwrap();
        assert_eq!(trigger.direction, Direction::Down);
        assert!(!trigger.compound);

        c.on_fired();
        assert!(c.reset_pending());
        assert_eq!(c.evaluate(vertical(0.1), secs(2.0), false), None);
        assert!(c.reset_pending());

        assert_eq!(c.evaluate(vertical(0.0), secs(2.1), false), None);
        assert_eq!(c.phase(), DwellPhase::Idle);
    }

    #[test]
    fn test_direction_change_restarts_hold() {
        let mut c = classifier();
        c.evaluate(vertical(0.1), secs(0.0), false);
        c.evaluate(vertical(-0.1), secs(0.4), false);
        assert_eq!(c.evaluate(vertical(-0.1), secs(0.6), false), None);
        assert!(c.evaluate(vertical(-0.1), secs(1.0), false).is_some());
    }

    #[test]
    fn test_neutral_returns_to_idle() {
        let mut c = classifier();
        c.evaluate(vertical(0.1), secs(0.0), false);
        c.evaluate(vertical(0.0), secs(0.2), false);
        assert_eq!(c.phase(), DwellPhase::Idle);
        assert_eq!(c.evaluate(vertical(0.1), secs(0.6), false), None);
    }

    #[test]
    fn test_compound_hold_is_shorter() {
        let mut c = classifier();
        c.evaluate(vertical(-0.1), secs(0.0), true);
        let trigger = c.evaluate(vertical(-0.1), secs(0.31), true).unwrap();
        assert!(trigger.compound);
        assert_eq!(trigger.direction, Direction::Up);

        let mut plain = classifier();
        plain.evaluate(vertical(-0.1), secs(0.0), false);
        assert_eq!(plain.evaluate(vertical(-0.1), secs(0.31), false), None);
    }

    #[test]
    fn test_cancel_keeps_reset_gate() {
        let mut c = classifier();
        c.on_fired();
        c.cancel();
        assert!(c.reset_pending());

        c.reset();
        c.evaluate(vertical(0.1), secs(0.0), false);
        c.cancel();
        assert_eq!(c.phase(), DwellPhase::Idle);
    }
}
