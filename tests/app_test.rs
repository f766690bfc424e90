//! Tests for the main loop: dispatch, draining and error handling


use eye_page_turner::{
    app::App,
    command_sink::{Command, RecordingSink},
    landmark_source::{Frame, ScriptedSource},
    Error,
};
use test_helpers::*;

fn frames(from_ms: u64, to_ms: u64, step_ms: u64, y: Option<f64>) -> Vec<Frame> {
    (from_ms..=to_ms)
        .step_by(step_ms as usize)
        .map(|t| match y {
            Some(y) => Frame::present(ms(t), gaze(y)),
            None => Frame::absent(ms(t)),
        })
        .collect()
}

#[test]
fn test_sleep_wake_cycle_drains_once() {
    let mut script = frames(0, 0, 100, Some(0.40));
    script.extend(frames(100, 5000, 100, None));
    script.extend(frames(6000, 9000, FRAME_MS, Some(0.40)));

    let mut sink = RecordingSink::new();
    sink.queue_pending(12);

    let mut app = App::new(engine(test_config()), ScriptedSource::new(script), sink);
    let summary = app.run().unwrap();

    assert_eq!(
        app.sink().sent(),
        &[Command::ScreenOff, Command::ScreenOn, Command::NextPage]
    );
    assert_eq!(app.sink().drains(), 1);
    assert_eq!(app.sink().pending(), 0);
    assert_eq!(summary.drained_events, 12);
    assert_eq!(summary.sink_failures, 0);
    assert_eq!(summary.commands[1].0, ms(6000));
    assert!(summary.commands[2].0 >= ms(8000));
}

#[test]
fn test_sink_failure_is_not_fatal() {
    let mut script = frames(0, 0, FRAME_MS, Some(0.40));
    script.extend(frames(33, 400, FRAME_MS, Some(0.50)));
    script.extend(frames(433, 500, FRAME_MS, Some(0.40)));
    script.extend(frames(533, 1000, FRAME_MS, Some(0.50)));

    let mut sink = RecordingSink::new();
    sink.set_failing(true);

    let mut app = App::new(engine(dwell_only_config()), ScriptedSource::new(script), sink);
    let summary = app.run().unwrap();

    // The failed command still started the cooldown, so the second dwell
    // (due well inside the cooldown window) never fires.
    assert_eq!(summary.commands.len(), 1);
    assert_eq!(summary.sink_failures, 1);
    assert!(app.sink().sent().is_empty());
    assert_eq!(app.engine().last_action_at(), Some(summary.commands[0].0));
}

#[test]
fn test_source_error_terminates_run() {
    let source = ScriptedSource::new(frames(0, 330, FRAME_MS, Some(0.40))).failing_when_exhausted();
    let mut app = App::new(engine(test_config()), source, RecordingSink::new());

    assert!(matches!(app.run(), Err(Error::Source(_))));
    assert_eq!(app.summary().frames, 11);
}

#[test]
fn test_summary_counts_face_frames() {
    let mut script = frames(0, 330, FRAME_MS, Some(0.40));
    script.extend(frames(363, 660, FRAME_MS, None));

    let mut app = App::new(engine(test_config()), ScriptedSource::new(script), RecordingSink::new());
    let summary = app.run().unwrap();

    assert_eq!(summary.frames, 21);
    assert_eq!(summary.face_frames, 11);
    assert!(summary.commands.is_empty());
}

#[test]
fn test_backwards_timestamps_are_clamped() {
    let mut app = App::new(
        engine(test_config()),
        ScriptedSource::default(),
        RecordingSink::new(),
    );

    let out = app.step(Frame::present(ms(500), gaze(0.40)));
    assert_eq!(out.snapshot.timestamp, ms(500));
    let out = app.step(Frame::present(ms(400), gaze(0.40)));
    assert_eq!(out.snapshot.timestamp, ms(500));
    let out = app.step(Frame::present(ms(533), gaze(0.40)));
    assert_eq!(out.snapshot.timestamp, ms(533));
}

#[test]
fn test_manual_reset_through_app() {
    let mut app = App::new(engine(dwell_only_config()), ScriptedSource::default(), RecordingSink::new());
    app.step(Frame::present(ms(0), gaze(0.40)));
    app.step(Frame::present(ms(33), gaze(0.55)));
    assert!(app.engine().read_to_bottom());

    app.engine_mut().reset();
    assert!(!app.engine().read_to_bottom());
}
