//! Gaze and head command-trigger engine for hands-free reading.
//!
//! This library turns a noisy stream of facial landmarks (one set per camera
//! frame, or nothing when no face is detected) into discrete, rate-limited
//! reader commands: next/previous page, next/previous item, screen off and
//! screen on.
//!
//! The pipeline for each frame:
//! 1. Feature extraction: landmark centroids to scalar signals
//! 2. Exponential smoothing per signal
//! 3. Baseline tracking (periodic or event-driven)
//! 4. Motion classification: saccade, dwell and majority vote
//! 5. Arbitration through a single cooldown clock
//!
//! A presence/power state machine runs alongside and turns the screen off
//! when the reader walks away.
//!
//! # Examples
//!
//! ## Driving the engine directly
//!
//! ```no_run
//! use eye_page_turner::{config::Config, engine::TriggerEngine, features::{LandmarkSet, Point}};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = TriggerEngine::new(Config::default())?;
//!
//! let landmarks = LandmarkSet::from_dense(vec![Point::new(0.5, 0.5); 478]);
//! let output = engine.tick(Some(&landmarks), Duration::from_millis(33));
//! if let Some(command) = output.command {
//!     println!("{command}");
//! }
//!
//! // No face in this frame
//! let output = engine.tick(None, Duration::from_millis(66));
//! println!("power: {}", output.snapshot.power);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a trace through a sink
//!
//! ```no_run
//! use eye_page_turner::{
//!     app::App, command_sink::LogSink, config::Config, engine::TriggerEngine,
//!     landmark_source::JsonLinesSource,
//! };
//! use std::{fs::File, io::BufReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file("page_turner.yaml")?;
//! let engine = TriggerEngine::new(config)?;
//! let source = JsonLinesSource::new(BufReader::new(File::open("trace.jsonl")?));
//!
//! let mut app = App::new(engine, source, LogSink::new());
//! let summary = app.run()?;
//! println!("{} commands in {} frames", summary.commands.len(), summary.frames);
//! # Ok(())
//! # }
//! ```

/// Main application loop
pub mod app;

/// Trigger arbitration and cooldown
pub mod arbiter;

/// Neutral baseline tracking
pub mod baseline;

/// Command sinks (X11, log, recording)
pub mod command_sink;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// The per-frame trigger engine
pub mod engine;

/// Error types and result handling
pub mod error;

/// Landmark sets and feature extraction
pub mod features;

/// Signal smoothing
pub mod filters;

/// Landmark frame sources
pub mod landmark_source;

/// Motion classifiers
pub mod motion;

/// Presence tracking and screen power state machine
pub mod presence;

pub use error::{Error, Result};
