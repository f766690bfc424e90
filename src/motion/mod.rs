//! Motion classification against the neutral baseline.
//!
//! Three strategies can run side by side:
//! - [`majority_vote`]: votes over the last K frames, models "read to the
//!   bottom, then look back up"
//! - [`dwell`]: a direction held for a minimum time
//! - [`saccade`]: a large jump between two consecutive frames

/// Majority vote over a ring buffer of per-frame classifications
pub mod majority_vote;

/// Sustained dwell with a post-fire reset gate
pub mod dwell;

/// Fast frame-to-frame movement detection
pub mod saccade;

use std::fmt;

/// Gaze or head direction relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        };
        f.write_str(name)
    }
}
