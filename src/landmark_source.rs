//! Landmark frame sources.
//!
//! A source yields one [`Frame`] per camera frame: a landmark set, or no
//! landmarks when no face was detected. `Ok(None)` from
//! [`LandmarkSource::next_frame`] means the stream ended; an `Err` is a read
//! failure and terminates the run.
//!
//! [`JsonLinesSource`] reads traces produced by an external landmark
//! detector, one JSON object per line:
//!
//! ```text
//! {"t": 0.033, "landmarks": [[0.41, 0.52], [0.43, 0.51], ...]}
//! {"t": 0.066, "landmarks": {"1": [0.5, 0.6], "474": [0.42, 0.48]}}
//! {"t": 0.100, "landmarks": null}
//! ```

use crate::{
    error::{AppError, Result},
    features::{LandmarkSet, Point},
};
use log::{debug, trace};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::io::BufRead;
use std::time::Duration;

/// One camera frame worth of detector output
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Capture time since the start of the stream, if the source knows it
    pub timestamp: Option<Duration>,
    /// Detected landmarks, `None` when no face was found
    pub landmarks: Option<LandmarkSet>,
}

impl Frame {
    #[must_use]
    pub const fn present(timestamp: Duration, landmarks: LandmarkSet) -> Self {
        Self {
            timestamp: Some(timestamp),
            landmarks: Some(landmarks),
        }
    }

    #[must_use]
    pub const fn absent(timestamp: Duration) -> Self {
        Self {
            timestamp: Some(timestamp),
            landmarks: None,
        }
    }
}

/// Producer of landmark frames
pub trait LandmarkSource {
    /// Block until the next frame. `Ok(None)` ends the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraceLandmarks {
    Dense(Vec<[f64; 2]>),
    Sparse(HashMap<String, [f64; 2]>),
}

#[derive(Deserialize)]
struct TraceLine {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    landmarks: Option<TraceLandmarks>,
}

/// Reads newline-delimited JSON landmark traces
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line: String,
    line_number: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }

    /// Lines consumed so far, blank lines included
    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    fn parse_line(&self, text: &str) -> Result<Frame> {
        let parsed: TraceLine = serde_json::from_str(text)?;

        let timestamp = parsed
            .t
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    AppError::Source(format!(
                        "line {}: invalid timestamp {secs}",
                        self.line_number
                    ))
                })
            })
            .transpose()?;

        let landmarks = match parsed.landmarks {
            None => None,
            Some(TraceLandmarks::Dense(points)) => Some(LandmarkSet::from_dense(
                points.into_iter().map(|[x, y]| Point::new(x, y)).collect(),
            )),
            Some(TraceLandmarks::Sparse(points)) => Some(
                points
                    .into_iter()
                    .map(|(key, [x, y])| {
                        key.parse::<u32>()
                            .map(|index| (index, Point::new(x, y)))
                            .map_err(|_| {
                                AppError::Source(format!(
                                    "line {}: invalid landmark index {key:?}",
                                    self.line_number
                                ))
                            })
                    })
                    .collect::<Result<LandmarkSet>>()?,
            ),
        };

        Ok(Frame {
            timestamp,
            landmarks,
        })
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                debug!("Trace ended after {} lines", self.line_number);
                return Ok(None);
            }
            self.line_number += 1;

            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }

            let frame = self.parse_line(text).map_err(|e| match e {
                AppError::Trace(inner) => {
                    AppError::Source(format!("line {}: {inner}", self.line_number))
                }
                other => other,
            })?;
            trace!(
                "Frame {}: {} landmarks",
                self.line_number,
                frame.landmarks.as_ref().map_or(0, LandmarkSet::len)
            );
            return Ok(Some(frame));
        }
    }
}

/// Replays frames from memory
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
    fail_when_exhausted: bool,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            fail_when_exhausted: false,
        }
    }

    /// Report a read failure instead of end-of-stream once the frames run out
    #[must_use]
    pub const fn failing_when_exhausted(mut self) -> Self {
        self.fail_when_exhausted = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None if self.fail_when_exhausted => {
                Err(AppError::Source("Camera disconnected".to_string()))
            }
            None => Ok(None),
        }
    }
}
