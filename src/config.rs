//! Configuration management for the eye page turner

use crate::{
    command_sink::Command,
    constants::*,
    features::Signal,
    motion::Direction,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera frame geometry
    pub frame: FrameConfig,

    /// Landmark index groups used by the feature extractor
    pub features: FeatureConfig,

    /// Signal smoothing
    pub smoothing: SmoothingConfig,

    /// Neutral baseline update policy
    pub baseline: BaselineConfig,

    /// Majority-vote classifier
    pub majority_vote: MajorityVoteConfig,

    /// Sustained dwell classifier
    pub dwell: DwellConfig,

    /// Fast saccade detector
    pub saccade: SaccadeConfig,

    /// Cooldown and presence timers
    pub timing: TimingConfig,

    /// Direction to command mapping
    pub commands: CommandMap,
}

/// Camera frame geometry, used to express offsets in pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,
}

/// Landmark index groups (MediaPipe face mesh numbering by default)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub left_eye: Vec<u32>,
    pub right_eye: Vec<u32>,
    pub left_iris: Vec<u32>,
    pub right_iris: Vec<u32>,
    pub nose_tip: Vec<u32>,
}

/// Exponential smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Weight of the newest sample (0 < alpha <= 1, smaller is smoother)
    pub alpha: f64,
}

/// How the neutral baseline follows the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Reassign the baseline to the smoothed value every `interval` frames
    Periodic { interval: u32 },
    /// Reassign the baseline after fired commands and confirmed drifts
    EventDriven,
}

/// Baseline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub policy: BaselinePolicy,
}

/// Majority-vote buffer classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MajorityVoteConfig {
    /// Run this classifier
    pub enabled: bool,

    /// Tracked signal
    pub signal: Signal,

    /// Offset beyond which a frame counts as UP or DOWN
    pub threshold: f64,

    /// Number of recent frames kept in the buffer (K)
    pub capacity: usize,

    /// Fraction of K that confirms a direction
    pub confirm_ratio: f64,
}

/// Dwell classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// Run this classifier
    pub enabled: bool,

    /// Vertical tracked signal
    pub vertical_signal: Signal,

    /// Optional horizontal tracked signal for 2D (left/right) dwell
    pub horizontal_signal: Option<Signal>,

    /// Offset beyond which the gaze points down
    pub down_threshold: f64,

    /// Negative offset beyond which the gaze points up
    pub up_threshold: f64,

    /// Horizontal offset beyond which the head points left or right
    pub horizontal_threshold: f64,

    /// Offset magnitude under which the reset gate releases
    pub neutral_band: f64,

    /// Offset beyond which the reader is considered at the bottom of the page
    pub look_down_threshold: f64,

    /// Seconds a direction must be held before firing
    pub hold_time: f64,

    /// Fraction of the hold time needed for the look-down-then-up gesture
    pub compound_hold_factor: f64,
}

/// Saccade detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaccadeConfig {
    /// Run this detector
    pub enabled: bool,

    /// Tracked signal (raw, unsmoothed)
    pub signal: Signal,

    /// Minimum frame-to-frame movement that counts as a saccade
    pub quick_threshold: f64,

    /// Maximum seconds between the two frames of a saccade
    pub quick_time: f64,
}

/// Cooldown and presence timers, all in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum time between two dispatched commands
    pub cooldown: f64,

    /// Absence after which the screen is turned off
    pub screen_off_timeout: f64,

    /// Gesture suppression after the screen is woken
    pub wake_safety_delay: f64,

    /// Delay after waking before the automatic next-page
    pub wake_page_delay: f64,

    /// Gesture suppression after a face is re-acquired
    pub face_detection_cooldown: f64,

    /// Gesture suppression after the engine starts
    pub startup_delay: f64,
}

/// Maps gestures to commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandMap {
    pub down: Command,
    pub up: Command,
    pub left: Command,
    pub right: Command,

    /// Fired by the look-down-then-up gesture
    pub compound: Command,
}

impl CommandMap {
    /// Command mapped to a gaze direction
    #[must_use]
    pub fn for_direction(&self, direction: Direction) -> Command {
        match direction {
            Direction::Down => self.down,
            Direction::Up => self.up,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            left_eye: LEFT_EYE.to_vec(),
            right_eye: RIGHT_EYE.to_vec(),
            left_iris: LEFT_IRIS.to_vec(),
            right_iris: RIGHT_IRIS.to_vec(),
            nose_tip: NOSE_TIP.to_vec(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            policy: BaselinePolicy::Periodic {
                interval: DEFAULT_BASELINE_INTERVAL,
            },
        }
    }
}

impl Default for MajorityVoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            signal: Signal::IRIS_CENTER_Y,
            threshold: DEFAULT_IRIS_CHANGE_THRESHOLD,
            capacity: DEFAULT_MOTION_BUFFER_SIZE,
            confirm_ratio: DEFAULT_CONFIRM_RATIO,
        }
    }
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vertical_signal: Signal::EYE_CENTER_Y,
            horizontal_signal: None,
            down_threshold: DEFAULT_DWELL_DOWN_THRESHOLD,
            up_threshold: DEFAULT_DWELL_UP_THRESHOLD,
            horizontal_threshold: DEFAULT_DWELL_HORIZONTAL_THRESHOLD,
            neutral_band: DEFAULT_DWELL_DOWN_THRESHOLD / 2.0,
            look_down_threshold: DEFAULT_LOOK_DOWN_THRESHOLD,
            hold_time: DEFAULT_HOLD_TIME_SECS,
            compound_hold_factor: DEFAULT_COMPOUND_HOLD_FACTOR,
        }
    }
}

impl Default for SaccadeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            signal: Signal::EYE_CENTER_Y,
            quick_threshold: DEFAULT_QUICK_THRESHOLD,
            quick_time: DEFAULT_QUICK_TIME_SECS,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN_SECS,
            screen_off_timeout: DEFAULT_SCREEN_OFF_TIMEOUT_SECS,
            wake_safety_delay: DEFAULT_WAKE_SAFETY_DELAY_SECS,
            wake_page_delay: DEFAULT_WAKE_PAGE_DELAY_SECS,
            face_detection_cooldown: DEFAULT_FACE_DETECTION_COOLDOWN_SECS,
            startup_delay: DEFAULT_STARTUP_DELAY_SECS,
        }
    }
}

impl Default for CommandMap {
    fn default() -> Self {
        Self {
            down: Command::NextPage,
            up: Command::PrevPage,
            left: Command::PrevItem,
            right: Command::NextItem,
            compound: Command::NextPage,
        }
    }
}

impl TimingConfig {
    /// Cooldown as a duration. Call after [`Config::validate`].
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(Error::ConfigError("Frame dimensions must be greater than 0".to_string()));
        }

        let groups = [
            ("left_eye", &self.features.left_eye),
            ("right_eye", &self.features.right_eye),
            ("left_iris", &self.features.left_iris),
            ("right_iris", &self.features.right_iris),
            ("nose_tip", &self.features.nose_tip),
        ];
        for (name, group) in groups {
            if group.is_empty() {
                return Err(Error::ConfigError(format!("Landmark group {name} must not be empty")));
            }
        }

        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err(Error::ConfigError("Smoothing alpha must be in (0, 1]".to_string()));
        }

        if let BaselinePolicy::Periodic { interval: 0 } = self.baseline.policy {
            return Err(Error::ConfigError(
                "Baseline update interval must be greater than 0".to_string(),
            ));
        }

        if !(self.majority_vote.enabled || self.dwell.enabled || self.saccade.enabled) {
            return Err(Error::ConfigError("At least one classifier must be enabled".to_string()));
        }

        if self.majority_vote.enabled {
            let mv = &self.majority_vote;
            positive("majority_vote.threshold", mv.threshold)?;
            if mv.capacity == 0 {
                return Err(Error::ConfigError(
                    "Motion buffer capacity must be greater than 0".to_string(),
                ));
            }
            if !(mv.confirm_ratio > 0.0 && mv.confirm_ratio <= 1.0) {
                return Err(Error::ConfigError("Confirm ratio must be in (0, 1]".to_string()));
            }
        }

        if self.dwell.enabled {
            let d = &self.dwell;
            positive("dwell.down_threshold", d.down_threshold)?;
            positive("dwell.up_threshold", d.up_threshold)?;
            positive("dwell.horizontal_threshold", d.horizontal_threshold)?;
            positive("dwell.neutral_band", d.neutral_band)?;
            positive("dwell.look_down_threshold", d.look_down_threshold)?;
            positive_secs("dwell.hold_time", d.hold_time)?;
            if !(d.compound_hold_factor > 0.0 && d.compound_hold_factor <= 1.0) {
                return Err(Error::ConfigError("Compound hold factor must be in (0, 1]".to_string()));
            }
            positive_secs("dwell.compound_hold_time", d.hold_time * d.compound_hold_factor)?;
        }

        if self.saccade.enabled {
            positive("saccade.quick_threshold", self.saccade.quick_threshold)?;
            positive_secs("saccade.quick_time", self.saccade.quick_time)?;
        }

        let t = &self.timing;
        positive_secs("timing.cooldown", t.cooldown)?;
        positive_secs("timing.screen_off_timeout", t.screen_off_timeout)?;
        non_negative_secs("timing.wake_safety_delay", t.wake_safety_delay)?;
        non_negative_secs("timing.wake_page_delay", t.wake_page_delay)?;
        non_negative_secs("timing.face_detection_cooldown", t.face_detection_cooldown)?;
        non_negative_secs("timing.startup_delay", t.startup_delay)?;

        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{name} must be a positive number, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{name} must not be negative, got {value}")))
    }
}

/// Seconds that are later turned into a [`Duration`]
fn positive_secs(name: &str, value: f64) -> Result<()> {
    positive(name, value)?;
    representable(name, value)
}

fn non_negative_secs(name: &str, value: f64) -> Result<()> {
    non_negative(name, value)?;
    representable(name, value)
}

fn representable(name: &str, value: f64) -> Result<()> {
    Duration::try_from_secs_f64(value)
        .map(|_| ())
        .map_err(|_| Error::ConfigError(format!("{name} is too large to be a duration, got {value}")))
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Eye Page Turner Configuration

# Camera frame geometry (offsets are reported in pixels of this frame)
frame:
  width: 640
  height: 480

# MediaPipe face mesh landmark groups
features:
  left_eye: [33, 133, 160, 159, 158, 144, 145, 153]
  right_eye: [362, 263, 387, 386, 385, 373, 374, 380]
  left_iris: [474, 475, 476, 477]
  right_iris: [469, 470, 471, 472]
  nose_tip: [1]

# Exponential smoothing (0 < alpha <= 1, smaller is smoother)
smoothing:
  alpha: 0.3

# Baseline policy: periodic (with interval in frames) or event_driven
baseline:
  policy:
    mode: periodic
    interval: 20

# Look down for a while, then up: turns the page
majority_vote:
  enabled: true
  signal: { feature: iris_center, axis: y }
  threshold: 0.002
  capacity: 5
  confirm_ratio: 0.7

# Hold the gaze in one direction
dwell:
  enabled: true
  vertical_signal: { feature: eye_center, axis: y }
  horizontal_signal: null      # e.g. { feature: nose_tip, axis: x }
  down_threshold: 0.05
  up_threshold: 0.08
  horizontal_threshold: 0.10
  neutral_band: 0.025
  look_down_threshold: 0.12
  hold_time: 0.3
  compound_hold_factor: 0.6

# Quick eye jumps
saccade:
  enabled: true
  signal: { feature: eye_center, axis: y }
  quick_threshold: 0.08
  quick_time: 0.3

# Timers (seconds)
timing:
  cooldown: 1.0
  screen_off_timeout: 3.0
  wake_safety_delay: 3.0
  wake_page_delay: 2.0
  face_detection_cooldown: 2.0
  startup_delay: 4.0

# Commands: next_page, prev_page, next_item, prev_item, screen_off, screen_on
commands:
  down: next_page
  up: prev_page
  left: prev_item
  right: next_item
  compound: next_page
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        let defaults = Config::default();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.features, defaults.features);
        assert_eq!(parsed.baseline.policy, defaults.baseline.policy);
        assert_eq!(parsed.majority_vote.capacity, defaults.majority_vote.capacity);
        assert_eq!(parsed.dwell.horizontal_signal, None);
        assert_eq!(parsed.commands.compound, Command::NextPage);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("timing:\n  cooldown: 2.5\n").unwrap();
        assert_eq!(config.timing.cooldown, 2.5);
        assert_eq!(config.timing.screen_off_timeout, DEFAULT_SCREEN_OFF_TIMEOUT_SECS);
        assert_eq!(config.smoothing.alpha, DEFAULT_SMOOTHING_ALPHA);
    }

    #[test]
    fn test_event_driven_policy_parses() {
        let config = Config::from_yaml("baseline:\n  policy:\n    mode: event_driven\n").unwrap();
        assert_eq!(config.baseline.policy, BaselinePolicy::EventDriven);
    }

    #[test]
    fn test_command_map() {
        let map = CommandMap::default();
        assert_eq!(map.for_direction(Direction::Down), Command::NextPage);
        assert_eq!(map.for_direction(Direction::Up), Command::PrevPage);
        assert_eq!(map.for_direction(Direction::Right), Command::NextItem);
    }
}
