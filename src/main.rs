//! Hands-free page turner driven by facial-landmark traces.

use anyhow::{Context, Result};
use clap::Parser;
use eye_page_turner::{
    app::App,
    command_sink::create_sink,
    config::{Config, EXAMPLE_CONFIG},
    engine::TriggerEngine,
    landmark_source::JsonLinesSource,
};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Landmark trace to read, one JSON object per line ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Command sink (x11, log)
    #[arg(short, long, default_value = "log")]
    sink: String,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Eye page turner");

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {path}");
            Config::from_file(path).with_context(|| format!("Failed to load config file {path}"))?
        }
        None => {
            warn!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let engine = TriggerEngine::new(config).context("Invalid configuration")?;

    let reader: Box<dyn BufRead> = if args.input == "-" {
        info!("Reading landmarks from stdin");
        Box::new(io::stdin().lock())
    } else {
        info!("Reading landmarks from {}", args.input);
        let file = File::open(&args.input).with_context(|| format!("Failed to open {}", args.input))?;
        Box::new(BufReader::new(file))
    };

    let sink = create_sink(&args.sink).with_context(|| format!("Failed to create {} sink", args.sink))?;

    let mut app = App::new(engine, JsonLinesSource::new(reader), sink);
    let summary = app.run()?;

    info!(
        "{} frames ({} with a face), {} commands, {} events drained",
        summary.frames,
        summary.face_frames,
        summary.commands.len(),
        summary.drained_events
    );

    Ok(())
}
