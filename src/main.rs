//! Saccade detection over recorded heading traces.

use anyhow::{Context, Result};
use clap::Parser;
use heading_saccades::bout::{BoutStats, Measurement, Trace};
use heading_saccades::config::{Config, DetectionMethod};
use heading_saccades::saccade::Saccade;
use heading_saccades::segmenter::BoutSegmenter;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with `time` and `heading` columns
    input: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Detection method (threshold_run, peak_finder)
    #[arg(short, long)]
    method: Option<DetectionMethod>,

    /// Saccade speed threshold in degrees per second
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Sampling rate in Hz (derived from the timestamps when omitted)
    #[arg(short, long)]
    framerate: Option<f64>,

    /// Headings are in degrees rather than radians
    #[arg(long)]
    degrees: bool,

    /// Smooth the heading with the Kalman estimator before segmentation
    #[arg(short, long)]
    kalman: bool,

    /// Write the effective configuration to this YAML file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Deserialize)]
struct Row {
    time: f64,
    #[serde(deserialize_with = "csv::invalid_option")]
    heading: Option<f64>,
}

#[derive(Serialize)]
struct Report<'a> {
    source: String,
    framerate: f64,
    method: String,
    saccades: &'a [Saccade],
    stats: &'a BoutStats,
}

fn read_measurements(path: &Path, degrees: bool) -> Result<Vec<Measurement>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut measurements = Vec::new();
    for (line, row) in reader.deserialize::<Row>().enumerate() {
        let row = row.with_context(|| format!("Malformed row {} in {}", line + 1, path.display()))?;
        let value = row.heading.map(|h| if degrees { h.to_radians() } else { h });
        measurements.push(Measurement::new(row.time, value));
    }
    Ok(measurements)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {config_path}"))?
    } else {
        Config::default()
    };
    if let Some(method) = args.method {
        config.segmenter.method = method;
    }
    if let Some(threshold) = args.threshold {
        config.segmenter.threshold_speed = threshold;
    }
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.to_file(path)?;
        info!("Configuration written to {}", path.display());
    }

    let measurements = read_measurements(&args.input, args.degrees)?;
    let mut trace = Trace::from_measurements(&measurements, args.framerate)?;
    info!(
        "Loaded {} samples at {:.2} Hz from {}",
        trace.len(),
        trace.framerate(),
        args.input.display()
    );
    if args.kalman {
        trace = trace.kalman_smoothed(&config.estimator)?;
    }

    let segmenter = BoutSegmenter::new(config.segmenter.clone())?;
    let bout = segmenter.segment(&trace)?;
    let stats = bout.stats();
    info!(
        "{} saccades over {:.2} s ({:.3} Hz)",
        stats.saccade_count, stats.duration, stats.saccade_frequency
    );

    let report = Report {
        source: args.input.display().to_string(),
        framerate: trace.framerate(),
        method: config.segmenter.method.to_string(),
        saccades: bout.saccades(),
        stats,
    };
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("Failed to create {}", path.display()))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
