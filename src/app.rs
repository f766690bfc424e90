//! Main application loop: landmark source → engine → command sink.

use crate::{
    command_sink::{Command, CommandSink},
    engine::{TickOutput, TriggerEngine},
    error::Result,
    landmark_source::{Frame, LandmarkSource},
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Frames between periodic status lines
const STATUS_INTERVAL: usize = 100;

/// What happened during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Frames processed
    pub frames: usize,
    /// Frames in which a face was detected
    pub face_frames: usize,
    /// Commands produced by the engine, with the frame time
    pub commands: Vec<(Duration, Command)>,
    /// Commands the sink failed to deliver
    pub sink_failures: usize,
    /// Events discarded by wake-up drains
    pub drained_events: usize,
}

/// Drives a [`TriggerEngine`] from a landmark source into a command sink
pub struct App<S, K> {
    engine: TriggerEngine,
    source: S,
    sink: K,
    started: Instant,
    last_timestamp: Duration,
    summary: RunSummary,
}

impl<S: LandmarkSource, K: CommandSink> App<S, K> {
    pub fn new(engine: TriggerEngine, source: S, sink: K) -> Self {
        Self {
            engine,
            source,
            sink,
            started: Instant::now(),
            last_timestamp: Duration::ZERO,
            summary: RunSummary::default(),
        }
    }

    /// Run until the source ends. A source error terminates the run.
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Starting main loop, sending commands to {} sink", self.sink.name());
        self.started = Instant::now();

        while let Some(frame) = self.source.next_frame()? {
            self.step(frame);

            if self.summary.frames % STATUS_INTERVAL == 0 {
                let elapsed = self.started.elapsed().as_secs_f64();
                debug!(
                    "{} frames ({:.1} fps), {} commands, power {}",
                    self.summary.frames,
                    self.summary.frames as f64 / elapsed.max(f64::EPSILON),
                    self.summary.commands.len(),
                    self.engine.power_state()
                );
            }
        }

        info!(
            "Source ended after {} frames: {} commands, {} sink failures",
            self.summary.frames,
            self.summary.commands.len(),
            self.summary.sink_failures
        );
        Ok(self.summary.clone())
    }

    /// Process one frame and dispatch its command. Sink failures are logged
    /// and counted; they never stop the loop.
    pub fn step(&mut self, frame: Frame) -> TickOutput {
        let now = self.frame_time(frame.timestamp);
        let output = self.engine.tick(frame.landmarks.as_ref(), now);

        self.summary.frames += 1;
        if !output.snapshot.signals.is_empty() {
            self.summary.face_frames += 1;
        }

        if let Some(command) = output.command {
            self.summary.commands.push((now, command));
            if let Err(e) = self.sink.send(command) {
                warn!("Failed to send {command}: {e}");
                self.summary.sink_failures += 1;
            }
        }

        if output.drain_pending {
            match self.sink.drain_pending() {
                Ok(count) => {
                    debug!("Drained {count} pending events");
                    self.summary.drained_events += count;
                }
                Err(e) => warn!("Failed to drain pending input: {e}"),
            }
        }

        output
    }

    /// Frame time, kept monotonic. Frames without a timestamp use wall time
    /// since the start of the run.
    fn frame_time(&mut self, timestamp: Option<Duration>) -> Duration {
        let t = timestamp.unwrap_or_else(|| self.started.elapsed());
        if t < self.last_timestamp {
            warn!(
                "Frame time went backwards ({:.3}s < {:.3}s), clamping",
                t.as_secs_f64(),
                self.last_timestamp.as_secs_f64()
            );
            return self.last_timestamp;
        }
        self.last_timestamp = t;
        t
    }

    #[must_use]
    pub const fn engine(&self) -> &TriggerEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TriggerEngine {
        &mut self.engine
    }

    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }
}
