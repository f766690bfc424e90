//! Trigger arbitration and the global command cooldown.
//!
//! Every command, gesture or power, passes through one [`TriggerArbiter`].
//! A command is dispatched only when the cooldown since the previous command
//! has elapsed; otherwise it is dropped, never queued.

use crate::command_sink::Command;
use log::{debug, info};
use std::fmt;
use std::time::Duration;

/// What produced a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// Fast frame-to-frame movement
    Saccade,
    /// A direction held for the hold time
    Dwell,
    /// Look down, then up (dwell with the shortened hold time)
    CompoundDwell,
    /// Majority vote over the motion buffer
    MajorityVote,
    /// Presence-driven screen off / screen on
    Power,
    /// Automatic page turn after waking
    WakeUp,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Saccade => "saccade",
            Self::Dwell => "dwell",
            Self::CompoundDwell => "compound dwell",
            Self::MajorityVote => "majority vote",
            Self::Power => "power",
            Self::WakeUp => "wake-up",
        };
        f.write_str(name)
    }
}

/// Time of the last dispatched command
#[derive(Debug, Clone)]
pub struct CooldownClock {
    period: Duration,
    last_action_at: Option<Duration>,
}

impl CooldownClock {
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            last_action_at: None,
        }
    }

    /// Whether a command may be dispatched at `now`
    #[must_use]
    pub fn permits(&self, now: Duration) -> bool {
        self.last_action_at
            .map_or(true, |last| now.saturating_sub(last) >= self.period)
    }

    /// Time left until the next command is allowed
    #[must_use]
    pub fn remaining(&self, now: Duration) -> Duration {
        self.last_action_at.map_or(Duration::ZERO, |last| {
            self.period.saturating_sub(now.saturating_sub(last))
        })
    }

    pub fn record(&mut self, now: Duration) {
        self.last_action_at = Some(now);
    }

    #[must_use]
    pub const fn last_action_at(&self) -> Option<Duration> {
        self.last_action_at
    }
}

/// Single gate in front of the command sink
#[derive(Debug, Clone)]
pub struct TriggerArbiter {
    clock: CooldownClock,
}

impl TriggerArbiter {
    #[must_use]
    pub const fn new(cooldown: Duration) -> Self {
        Self {
            clock: CooldownClock::new(cooldown),
        }
    }

    /// Whether a command may be dispatched at `now`
    #[must_use]
    pub fn permits(&self, now: Duration) -> bool {
        self.clock.permits(now)
    }

    /// Dispatch `command` if the cooldown allows it. Returns whether it fired.
    pub fn try_fire(&mut self, command: Command, source: TriggerSource, now: Duration) -> bool {
        if !self.clock.permits(now) {
            debug!(
                "{command} from {source} dropped, cooldown {:.2}s remaining",
                self.clock.remaining(now).as_secs_f64()
            );
            return false;
        }
        info!("[ACTION] {command} ({source})");
        self.clock.record(now);
        true
    }

    #[must_use]
    pub const fn clock(&self) -> &CooldownClock {
        &self.clock
    }
}
