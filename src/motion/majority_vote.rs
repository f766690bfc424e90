//! Majority-vote classifier.
//!
//! Every frame is classified as UP, DOWN or NEUTRAL and pushed into a ring
//! buffer. A direction is confirmed once it holds a configured share of the
//! buffer capacity.

use crate::config::MajorityVoteConfig;
use std::collections::VecDeque;
use std::fmt;

/// Per-frame vertical classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Up,
    Down,
    Neutral,
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Neutral => "NEUTRAL",
        };
        f.write_str(name)
    }
}

/// Fixed-capacity history of the most recent classifications
#[derive(Debug, Clone)]
pub struct MotionBuffer {
    capacity: usize,
    items: VecDeque<Motion>,
}

impl MotionBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a classification, evicting the oldest when full
    pub fn push(&mut self, motion: Motion) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(motion);
    }

    /// Occurrences of a classification
    #[must_use]
    pub fn count(&self, motion: Motion) -> usize {
        self.items.iter().filter(|&&m| m == motion).count()
    }

    /// Occurrences relative to the buffer capacity (not its current length)
    #[must_use]
    pub fn ratio(&self, motion: Motion) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.count(motion) as f64 / self.capacity as f64
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Contents, oldest first
    #[must_use]
    pub fn to_vec(&self) -> Vec<Motion> {
        self.items.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// What a confirmed majority means for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// No direction confirmed
    Undecided,
    /// DOWN confirmed: the reader reached the bottom of the page. Latch and rebase.
    ReadToBottom,
    /// UP confirmed after reading to the bottom: turn the page
    PageTurn,
    /// UP confirmed without the latch: posture drift. Rebase only.
    Drift,
}

/// Majority-vote classifier state
#[derive(Debug, Clone)]
pub struct MajorityVoteClassifier {
    threshold: f64,
    confirm_ratio: f64,
    buffer: MotionBuffer,
}

impl MajorityVoteClassifier {
    #[must_use]
    pub fn new(config: &MajorityVoteConfig) -> Self {
        Self {
            threshold: config.threshold,
            confirm_ratio: config.confirm_ratio,
            buffer: MotionBuffer::new(config.capacity),
        }
    }

    /// Classify a single offset
    #[must_use]
    pub fn classify(&self, offset: f64) -> Motion {
        if offset > self.threshold {
            Motion::Down
        } else if offset < -self.threshold {
            Motion::Up
        } else {
            Motion::Neutral
        }
    }

    /// Push this frame's classification and evaluate the buffer.
    /// DOWN is checked before UP.
    pub fn evaluate(&mut self, offset: f64, read_to_bottom: bool) -> VoteOutcome {
        let motion = self.classify(offset);
        self.buffer.push(motion);

        if self.buffer.ratio(Motion::Down) >= self.confirm_ratio {
            VoteOutcome::ReadToBottom
        } else if self.buffer.ratio(Motion::Up) >= self.confirm_ratio {
            if read_to_bottom {
                VoteOutcome::PageTurn
            } else {
                VoteOutcome::Drift
            }
        } else {
            VoteOutcome::Undecided
        }
    }

    /// The page turn was dispatched
    pub fn on_fired(&mut self) {
        self.buffer.clear();
    }

    #[must_use]
    pub const fn buffer(&self) -> &MotionBuffer {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> MajorityVoteClassifier {
        MajorityVoteClassifier::new(&MajorityVoteConfig {
            threshold: 0.01,
            capacity: 5,
            confirm_ratio: 0.7,
            ..MajorityVoteConfig::default()
        })
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let mut buffer = MotionBuffer::new(3);
        for m in [Motion::Up, Motion::Down, Motion::Down, Motion::Neutral] {
            buffer.push(m);
            assert!(buffer.len() <= 3);
        }
        assert_eq!(buffer.to_vec(), vec![Motion::Down, Motion::Down, Motion::Neutral]);
        assert!((buffer.ratio(Motion::Down) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_uses_capacity() {
        let mut buffer = MotionBuffer::new(5);
        buffer.push(Motion::Down);
        buffer.push(Motion::Down);
        buffer.push(Motion::Down);
        // 3 of 5 slots, even though only 3 are filled
        assert!((buffer.ratio(Motion::Down) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_classify() {
        let c = classifier();
        assert_eq!(c.classify(0.02), Motion::Down);
        assert_eq!(c.classify(-0.02), Motion::Up);
        assert_eq!(c.classify(0.01), Motion::Neutral);
        assert_eq!(c.classify(-0.005), Motion::Neutral);
    }

    #[test]
    fn test_read_to_bottom_then_page_turn() {
        let mut c = classifier();
        let outcomes: Vec<_> = (0..4).map(|_| c.evaluate(0.05, false)).collect();
        assert_eq!(outcomes[2], VoteOutcome::Undecided);
        assert_eq!(outcomes[3], VoteOutcome::ReadToBottom);

        let mut last = VoteOutcome::Undecided;
        for _ in 0..5 {
            last = c.evaluate(-0.05, true);
        }
        assert_eq!(last, VoteOutcome::PageTurn);

        c.on_fired();
        assert!(c.buffer().is_empty());
    }

    #[test]
    fn test_up_without_latch_is_drift() {
        let mut c = classifier();
        let mut last = VoteOutcome::Undecided;
        for _ in 0..4 {
            last = c.evaluate(-0.05, false);
        }
        assert_eq!(last, VoteOutcome::Drift);
    }
}
