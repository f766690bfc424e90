//! The command-trigger engine.
//!
//! One [`TriggerEngine::tick`] per camera frame:
//!
//! 1. extract features (missing face or landmark means absence)
//! 2. step the presence/power state machine, which may emit a power command
//! 3. smooth every tracked signal and update its baseline
//! 4. unless gestures are suppressed, evaluate in priority order:
//!    saccade, then dwell, then majority vote
//!
//! Every command goes through the same [`TriggerArbiter`], so at most one
//! command is dispatched per cooldown window whichever path produced it.

use crate::{
    arbiter::{TriggerArbiter, TriggerSource},
    baseline::BaselineTracker,
    command_sink::Command,
    config::{BaselinePolicy, CommandMap, Config},
    features::{Axis, FeatureExtractor, Features, LandmarkSet, Signal},
    filters::Smoother,
    motion::{
        dwell::{DwellClassifier, DwellOffsets, DwellPhase},
        majority_vote::{MajorityVoteClassifier, Motion, VoteOutcome},
        saccade::SaccadeDetector,
        Direction,
    },
    presence::{PowerState, PowerStateMachine, PresenceEvent, PresenceState, Suppression},
    Result,
};
use log::{debug, info};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-signal values observed on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalReading {
    pub signal: Signal,
    pub raw: f64,
    pub smoothed: f64,
    pub baseline: Option<f64>,
    pub offset: Option<f64>,
    /// Offset in pixels of the configured frame
    pub offset_px: Option<f64>,
}

/// Debug-observable engine state after a tick
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub timestamp: Duration,
    pub presence: PresenceState,
    pub power: PowerState,
    /// Empty while no face is present
    pub signals: Vec<SignalReading>,
    pub dwell: Option<DwellPhase>,
    pub motion_buffer: Vec<Motion>,
    pub read_to_bottom: bool,
    pub cooldown_remaining: Duration,
    pub suppression: Option<Suppression>,
}

impl EngineSnapshot {
    /// Reading for one signal, if it is tracked and a face is present
    #[must_use]
    pub fn reading(&self, signal: Signal) -> Option<&SignalReading> {
        self.signals.iter().find(|r| r.signal == signal)
    }
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Command to dispatch this frame
    pub command: Option<Command>,
    /// What produced `command`
    pub trigger: Option<TriggerSource>,
    /// The sink must drain queued input (after dispatching `command`)
    pub drain_pending: bool,
    pub snapshot: EngineSnapshot,
}

/// Stateful gaze/head command-trigger engine
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    commands: CommandMap,
    frame_size: (u32, u32),
    baseline_policy: BaselinePolicy,
    extractor: FeatureExtractor,
    smoother: Smoother,
    baselines: BTreeMap<Signal, BaselineTracker>,
    majority_vote: Option<(Signal, MajorityVoteClassifier)>,
    dwell: Option<DwellTracker>,
    saccade: Option<(Signal, SaccadeDetector)>,
    arbiter: TriggerArbiter,
    power: PowerStateMachine,
    read_to_bottom: bool,
}

#[derive(Debug, Clone)]
struct DwellTracker {
    vertical: Signal,
    horizontal: Option<Signal>,
    classifier: DwellClassifier,
}

struct Fired {
    command: Command,
    source: TriggerSource,
}

impl TriggerEngine {
    /// Build an engine, rejecting invalid configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let policy = config.baseline.policy;
        let mut baselines = BTreeMap::new();
        let mut track = |signal: Signal| {
            baselines
                .entry(signal)
                .or_insert_with(|| BaselineTracker::new(policy));
        };

        let majority_vote = config.majority_vote.enabled.then(|| {
            track(config.majority_vote.signal);
            (
                config.majority_vote.signal,
                MajorityVoteClassifier::new(&config.majority_vote),
            )
        });

        let dwell = config.dwell.enabled.then(|| {
            track(config.dwell.vertical_signal);
            if let Some(horizontal) = config.dwell.horizontal_signal {
                track(horizontal);
            }
            DwellTracker {
                vertical: config.dwell.vertical_signal,
                horizontal: config.dwell.horizontal_signal,
                classifier: DwellClassifier::new(&config.dwell),
            }
        });

        let saccade = config.saccade.enabled.then(|| {
            track(config.saccade.signal);
            (config.saccade.signal, SaccadeDetector::new(&config.saccade))
        });

        info!(
            "Trigger engine: signals [{}], baseline {:?}, cooldown {:.2}s",
            baselines
                .keys()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            policy,
            config.timing.cooldown
        );

        Ok(Self {
            commands: config.commands.clone(),
            frame_size: (config.frame.width, config.frame.height),
            baseline_policy: policy,
            extractor: FeatureExtractor::new(config.features.clone()),
            smoother: Smoother::new(config.smoothing.alpha),
            baselines,
            majority_vote,
            dwell,
            saccade,
            arbiter: TriggerArbiter::new(config.timing.cooldown()),
            power: PowerStateMachine::new(&config.timing),
            read_to_bottom: false,
        })
    }

    /// Process one frame. `now` is monotonic time since the start of the run.
    pub fn tick(&mut self, landmarks: Option<&LandmarkSet>, now: Duration) -> TickOutput {
        let features = self.extractor.extract(landmarks);

        let step = self.power.step(features.is_some(), now, &mut self.arbiter);
        if step.event == PresenceEvent::Lost {
            self.clear_tracking();
        }

        let mut fired = step.action.map(|action| Fired {
            command: action.command,
            source: action.source,
        });
        let drain_pending = step.action.is_some_and(|action| action.drain_pending);

        let mut signals = Vec::new();
        let mut suppression = None;

        if let Some(features) = features {
            signals = self.update_signals(&features);
            suppression = self.power.suppression(now);

            let saccade = self
                .saccade
                .as_mut()
                .and_then(|(signal, detector)| detector.observe(features.signal(*signal), now));

            match suppression {
                Some(reason) => {
                    if let Some(dwell) = self.dwell.as_mut() {
                        dwell.classifier.cancel();
                    }
                    debug!("Gestures suppressed: {reason:?}");
                }
                None if fired.is_none() => {
                    fired = self.evaluate_gestures(&features, saccade, now);
                }
                None => {}
            }
        }

        if let Some(f) = &fired {
            if !f.command.is_power() && f.source != TriggerSource::WakeUp {
                self.rebase_after_gesture();
            }
        }

        let snapshot = self.snapshot(now, signals, suppression);
        TickOutput {
            command: fired.as_ref().map(|f| f.command),
            trigger: fired.map(|f| f.source),
            drain_pending,
            snapshot,
        }
    }

    /// Clear all tracking state and the reading latch. Power state and the
    /// cooldown clock are kept.
    pub fn reset(&mut self) {
        info!("Engine state reset");
        self.clear_tracking();
        self.read_to_bottom = false;
    }

    /// Current power state
    #[must_use]
    pub const fn power_state(&self) -> PowerState {
        self.power.power()
    }

    /// Current presence state
    #[must_use]
    pub const fn presence(&self) -> PresenceState {
        self.power.presence()
    }

    /// Whether the reader has reached the bottom of the page
    #[must_use]
    pub const fn read_to_bottom(&self) -> bool {
        self.read_to_bottom
    }

    /// Baseline of a tracked signal
    #[must_use]
    pub fn baseline(&self, signal: Signal) -> Option<f64> {
        self.baselines.get(&signal).and_then(BaselineTracker::value)
    }

    /// Dwell classifier phase, if the dwell classifier is enabled
    #[must_use]
    pub fn dwell_phase(&self) -> Option<DwellPhase> {
        self.dwell.as_ref().map(|d| d.classifier.phase())
    }

    /// Time of the last dispatched command
    #[must_use]
    pub const fn last_action_at(&self) -> Option<Duration> {
        self.arbiter.clock().last_action_at()
    }

    fn clear_tracking(&mut self) {
        self.smoother.reset();
        for baseline in self.baselines.values_mut() {
            baseline.reset();
        }
        if let Some((_, mv)) = self.majority_vote.as_mut() {
            mv.reset();
        }
        if let Some(dwell) = self.dwell.as_mut() {
            dwell.classifier.reset();
        }
        if let Some((_, saccade)) = self.saccade.as_mut() {
            saccade.reset();
        }
    }

    fn update_signals(&mut self, features: &Features) -> Vec<SignalReading> {
        let (width, height) = self.frame_size;
        self.baselines
            .iter_mut()
            .map(|(&signal, tracker)| {
                let raw = features.signal(signal);
                let smoothed = self.smoother.update(signal, raw);
                let baseline = tracker.observe(smoothed);
                let offset = smoothed - baseline;
                let scale = match signal.axis {
                    Axis::X => f64::from(width),
                    Axis::Y => f64::from(height),
                };
                SignalReading {
                    signal,
                    raw,
                    smoothed,
                    baseline: Some(baseline),
                    offset: Some(offset),
                    offset_px: Some(offset * scale),
                }
            })
            .collect()
    }

    fn offset(&self, signal: Signal) -> f64 {
        self.smoother
            .value(signal)
            .and_then(|smoothed| self.baselines.get(&signal)?.offset(smoothed))
            .unwrap_or(0.0)
    }

    fn rebase_to_smoothed(&mut self, signal: Signal) {
        if let (Some(value), Some(baseline)) =
            (self.smoother.value(signal), self.baselines.get_mut(&signal))
        {
            baseline.rebase(value);
        }
    }

    fn rebase_after_gesture(&mut self) {
        if self.baseline_policy != BaselinePolicy::EventDriven {
            return;
        }
        for (signal, baseline) in &mut self.baselines {
            if let Some(value) = self.smoother.value(*signal) {
                baseline.on_command_fired(value);
            }
        }
    }

    fn evaluate_gestures(
        &mut self,
        features: &Features,
        saccade: Option<Direction>,
        now: Duration,
    ) -> Option<Fired> {
        let fired = match saccade {
            Some(direction) => self.handle_saccade(features, direction, now),
            None => self.evaluate_dwell(now),
        };

        let vote = self.evaluate_majority_vote(now, fired.is_none());
        fired.or(vote)
    }

    fn handle_saccade(&mut self, features: &Features, direction: Direction, now: Duration) -> Option<Fired> {
        let (signal, _) = self.saccade.as_ref()?;
        let signal = *signal;
        let raw = features.signal(signal);

        let command = self.commands.for_direction(direction);
        let fired = self
            .arbiter
            .try_fire(command, TriggerSource::Saccade, now)
            .then_some(Fired {
                command,
                source: TriggerSource::Saccade,
            });

        // The gaze has moved to a new position; measure from there.
        self.smoother.snap(signal, raw);
        if let Some(baseline) = self.baselines.get_mut(&signal) {
            baseline.rebase(raw);
        }
        if let Some(dwell) = self.dwell.as_mut() {
            dwell.classifier.reset();
        }
        fired
    }

    fn evaluate_dwell(&mut self, now: Duration) -> Option<Fired> {
        let (vertical, horizontal) = {
            let dwell = self.dwell.as_ref()?;
            (dwell.vertical, dwell.horizontal)
        };
        let offsets = DwellOffsets {
            vertical: self.offset(vertical),
            horizontal: horizontal.map(|signal| self.offset(signal)),
        };

        let dwell = self.dwell.as_mut()?;
        if dwell.classifier.is_looking_down(offsets) && !self.read_to_bottom {
            debug!("Looking down, reading latch set");
            self.read_to_bottom = true;
        }

        let trigger = dwell.classifier.evaluate(offsets, now, self.read_to_bottom)?;
        let (command, source) = if trigger.compound {
            (self.commands.compound, TriggerSource::CompoundDwell)
        } else {
            (self.commands.for_direction(trigger.direction), TriggerSource::Dwell)
        };

        if !self.arbiter.try_fire(command, source, now) {
            return None;
        }
        dwell.classifier.on_fired();
        if trigger.compound {
            self.read_to_bottom = false;
        }
        Some(Fired { command, source })
    }

    fn evaluate_majority_vote(&mut self, now: Duration, may_fire: bool) -> Option<Fired> {
        let signal = self.majority_vote.as_ref()?.0;
        let offset = self.offset(signal);
        let reset_pending = self
            .dwell
            .as_ref()
            .is_some_and(|d| d.classifier.reset_pending());

        let (_, mv) = self.majority_vote.as_mut()?;
        match mv.evaluate(offset, self.read_to_bottom) {
            VoteOutcome::Undecided => None,
            VoteOutcome::ReadToBottom => {
                if !self.read_to_bottom {
                    info!("Read to bottom of page");
                }
                self.read_to_bottom = true;
                self.rebase_to_smoothed(signal);
                None
            }
            VoteOutcome::Drift => {
                debug!("Upward drift, rebasing {signal}");
                self.rebase_to_smoothed(signal);
                None
            }
            VoteOutcome::PageTurn => {
                if !may_fire || reset_pending {
                    return None;
                }
                let command = self.commands.compound;
                if !self.arbiter.try_fire(command, TriggerSource::MajorityVote, now) {
                    return None;
                }
                mv.on_fired();
                self.read_to_bottom = false;
                self.rebase_to_smoothed(signal);
                Some(Fired {
                    command,
                    source: TriggerSource::MajorityVote,
                })
            }
        }
    }

    fn snapshot(
        &self,
        now: Duration,
        signals: Vec<SignalReading>,
        suppression: Option<Suppression>,
    ) -> EngineSnapshot {
        EngineSnapshot {
            timestamp: now,
            presence: self.power.presence(),
            power: self.power.power(),
            signals,
            dwell: self.dwell_phase(),
            motion_buffer: self
                .majority_vote
                .as_ref()
                .map(|(_, mv)| mv.buffer().to_vec())
                .unwrap_or_default(),
            read_to_bottom: self.read_to_bottom,
            cooldown_remaining: self.arbiter.clock().remaining(now),
            suppression,
        }
    }
}
