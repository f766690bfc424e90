//! Presence tracking and the screen power state machine.
//!
//! | state        | face present                                  | no face                             |
//! |--------------|-----------------------------------------------|-------------------------------------|
//! | Awake        | Awake                                         | SleepPending                        |
//! | SleepPending | Awake                                         | ScreenOff → Asleep after the timeout |
//! | Asleep       | ScreenOn + drain → WakingUp                   | Asleep                              |
//! | WakingUp     | NextPage → Awake after the wake page delay    | SleepPending                        |
//!
//! Commands go through the shared [`TriggerArbiter`]; a transition whose
//! command is blocked by the cooldown is retried on the next frame.

use crate::{
    arbiter::{TriggerArbiter, TriggerSource},
    command_sink::Command,
    config::TimingConfig,
};
use log::{debug, info};
use std::fmt;
use std::time::Duration;

/// Whether a face is currently detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Present,
    Absent { since: Duration },
}

/// Screen power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Normal operation
    Awake,
    /// Face lost, screen-off timer running
    SleepPending,
    /// Screen turned off
    Asleep,
    /// Screen turned back on at `woke_at`, automatic page turn pending
    WakingUp { woke_at: Duration },
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Awake => f.write_str("AWAKE"),
            Self::SleepPending => f.write_str("SLEEP PENDING"),
            Self::Asleep => f.write_str("ASLEEP"),
            Self::WakingUp { woke_at } => write!(f, "WAKING UP ({:.2}s)", woke_at.as_secs_f64()),
        }
    }
}

/// Presence change observed on this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    Unchanged,
    Lost,
    Reacquired,
}

/// Why gesture evaluation is currently suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// The engine has just started
    Startup,
    /// No face or the screen is off
    PowerSaving,
    /// The screen is waking up
    WakingUp,
    /// Inside the safety window after waking
    WakeSafety,
    /// A face was just re-acquired
    FaceReacquired,
}

/// A power command that was dispatched on this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerAction {
    pub command: Command,
    pub source: TriggerSource,
    /// The sink must discard events queued while asleep
    pub drain_pending: bool,
}

/// Result of one presence/power step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerStep {
    pub event: PresenceEvent,
    pub action: Option<PowerAction>,
}

#[derive(Debug, Clone)]
struct Timers {
    screen_off_timeout: Duration,
    wake_safety_delay: Duration,
    wake_page_delay: Duration,
    face_detection_cooldown: Duration,
    startup_delay: Duration,
}

/// Presence tracker and power state machine
#[derive(Debug, Clone)]
pub struct PowerStateMachine {
    timers: Timers,
    presence: PresenceState,
    power: PowerState,
    started_at: Option<Duration>,
    reacquired_at: Option<Duration>,
    woke_at: Option<Duration>,
}

impl PowerStateMachine {
    /// Create the state machine. The timing config must have been validated.
    #[must_use]
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            timers: Timers {
                screen_off_timeout: Duration::from_secs_f64(timing.screen_off_timeout),
                wake_safety_delay: Duration::from_secs_f64(timing.wake_safety_delay),
                wake_page_delay: Duration::from_secs_f64(timing.wake_page_delay),
                face_detection_cooldown: Duration::from_secs_f64(timing.face_detection_cooldown),
                startup_delay: Duration::from_secs_f64(timing.startup_delay),
            },
            presence: PresenceState::Present,
            power: PowerState::Awake,
            started_at: None,
            reacquired_at: None,
            woke_at: None,
        }
    }

    /// Advance by one frame
    pub fn step(&mut self, present: bool, now: Duration, arbiter: &mut TriggerArbiter) -> PowerStep {
        self.started_at.get_or_insert(now);

        let event = match (self.presence, present) {
            (PresenceState::Present, false) => {
                debug!("Face lost");
                self.presence = PresenceState::Absent { since: now };
                PresenceEvent::Lost
            }
            (PresenceState::Absent { since }, true) => {
                debug!("Face re-acquired after {:.2}s", now.saturating_sub(since).as_secs_f64());
                self.presence = PresenceState::Present;
                self.reacquired_at = Some(now);
                PresenceEvent::Reacquired
            }
            _ => PresenceEvent::Unchanged,
        };

        let action = match (self.power, present) {
            (PowerState::Awake, true) | (PowerState::Asleep, false) => None,
            (PowerState::Awake, false) | (PowerState::WakingUp { .. }, false) => {
                self.power = PowerState::SleepPending;
                None
            }
            (PowerState::SleepPending, true) => {
                self.power = PowerState::Awake;
                None
            }
            (PowerState::SleepPending, false) => {
                let absent_for = match self.presence {
                    PresenceState::Absent { since } => now.saturating_sub(since),
                    PresenceState::Present => Duration::ZERO,
                };
                if absent_for >= self.timers.screen_off_timeout
                    && arbiter.try_fire(Command::ScreenOff, TriggerSource::Power, now)
                {
                    info!("No face for {:.1}s, screen off", absent_for.as_secs_f64());
                    self.power = PowerState::Asleep;
                    Some(PowerAction {
                        command: Command::ScreenOff,
                        source: TriggerSource::Power,
                        drain_pending: false,
                    })
                } else {
                    None
                }
            }
            (PowerState::Asleep, true) => {
                if arbiter.try_fire(Command::ScreenOn, TriggerSource::Power, now) {
                    info!("Face detected, screen on");
                    self.power = PowerState::WakingUp { woke_at: now };
                    self.woke_at = Some(now);
                    Some(PowerAction {
                        command: Command::ScreenOn,
                        source: TriggerSource::Power,
                        drain_pending: true,
                    })
                } else {
                    None
                }
            }
            (PowerState::WakingUp { woke_at }, true) => {
                if now.saturating_sub(woke_at) >= self.timers.wake_page_delay
                    && arbiter.try_fire(Command::NextPage, TriggerSource::WakeUp, now)
                {
                    self.power = PowerState::Awake;
                    Some(PowerAction {
                        command: Command::NextPage,
                        source: TriggerSource::WakeUp,
                        drain_pending: false,
                    })
                } else {
                    None
                }
            }
        };

        PowerStep { event, action }
    }

    /// Why gestures must not be evaluated at `now`, if they must not
    #[must_use]
    pub fn suppression(&self, now: Duration) -> Option<Suppression> {
        let within = |since: Option<Duration>, window: Duration| {
            since.is_some_and(|t| now.saturating_sub(t) < window)
        };

        if within(self.started_at, self.timers.startup_delay) {
            return Some(Suppression::Startup);
        }
        match self.power {
            PowerState::SleepPending | PowerState::Asleep => return Some(Suppression::PowerSaving),
            PowerState::WakingUp { .. } => return Some(Suppression::WakingUp),
            PowerState::Awake => {}
        }
        if within(self.woke_at, self.timers.wake_safety_delay) {
            return Some(Suppression::WakeSafety);
        }
        if within(self.reacquired_at, self.timers.face_detection_cooldown) {
            return Some(Suppression::FaceReacquired);
        }
        None
    }

    #[must_use]
    pub const fn presence(&self) -> PresenceState {
        self.presence
    }

    #[must_use]
    pub const fn power(&self) -> PowerState {
        self.power
    }
}
