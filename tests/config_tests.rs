//! Configuration loading and validation tests

use eye_page_turner::{
    command_sink::Command,
    config::{BaselinePolicy, Config, EXAMPLE_CONFIG},
    engine::TriggerEngine,
    features::Signal,
    Error,
};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("eye_page_turner_{}_{name}", std::process::id()))
}

fn assert_rejected(config: Config, needle: &str) {
    match config.validate() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains(needle), "unexpected message: {msg}"),
        other => panic!("expected config error mentioning {needle}, got {other:?}"),
    }
}

#[test]
fn test_file_round_trip() {
    let path = temp_path("round_trip.yaml");
    let mut config = Config::default();
    config.timing.cooldown = 1.5;
    config.baseline.policy = BaselinePolicy::EventDriven;
    config.dwell.horizontal_signal = Some(Signal::NOSE_TIP_X);
    config.commands.down = Command::NextItem;

    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.timing.cooldown, 1.5);
    assert_eq!(loaded.baseline.policy, BaselinePolicy::EventDriven);
    assert_eq!(loaded.dwell.horizontal_signal, Some(Signal::NOSE_TIP_X));
    assert_eq!(loaded.commands.down, Command::NextItem);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = Config::from_file(temp_path("does_not_exist.yaml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let result = Config::from_yaml("timing: [1, 2");
    assert!(matches!(result, Err(Error::ConfigError(_))));

    let unknown_command = Config::from_yaml("commands:\n  down: scroll_down\n");
    assert!(matches!(unknown_command, Err(Error::ConfigError(_))));
}

#[test]
fn test_example_config_builds_engine() {
    let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
    assert!(TriggerEngine::new(config).is_ok());
}

#[test]
fn test_non_positive_thresholds_rejected() {
    let mut config = Config::default();
    config.majority_vote.threshold = 0.0;
    assert_rejected(config, "majority_vote.threshold");

    let mut config = Config::default();
    config.dwell.down_threshold = -0.05;
    assert_rejected(config, "dwell.down_threshold");

    let mut config = Config::default();
    config.saccade.quick_time = f64::NAN;
    assert_rejected(config, "saccade.quick_time");

    let mut config = Config::default();
    config.timing.cooldown = 0.0;
    assert_rejected(config, "timing.cooldown");
}

#[test]
fn test_disabled_classifier_is_not_validated() {
    let mut config = Config::default();
    config.saccade.enabled = false;
    config.saccade.quick_threshold = -1.0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_structural_errors_rejected() {
    let mut config = Config::default();
    config.majority_vote.capacity = 0;
    assert_rejected(config, "capacity");

    let mut config = Config::default();
    config.baseline.policy = BaselinePolicy::Periodic { interval: 0 };
    assert_rejected(config, "interval");

    let mut config = Config::default();
    config.smoothing.alpha = 0.0;
    assert_rejected(config, "alpha");

    let mut config = Config::default();
    config.features.left_iris.clear();
    assert_rejected(config, "left_iris");

    let mut config = Config::default();
    config.majority_vote.enabled = false;
    config.dwell.enabled = false;
    config.saccade.enabled = false;
    assert_rejected(config, "classifier");
}

#[test]
fn test_engine_construction_validates() {
    let mut config = Config::default();
    config.frame.height = 0;
    assert!(matches!(TriggerEngine::new(config), Err(Error::ConfigError(_))));
}

#[test]
fn test_unrepresentable_durations_rejected() {
    for yaml in [
        "timing:\n  cooldown: 1.0e300\n",
        "timing:\n  startup_delay: 1.0e300\n",
        "dwell:\n  hold_time: 1.0e300\n",
        "saccade:\n  quick_time: 1.0e300\n",
    ] {
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))), "accepted {yaml}");
        assert!(matches!(TriggerEngine::new(config), Err(Error::ConfigError(_))), "built {yaml}");
    }
}
