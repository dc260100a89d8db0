//! Trial-level containers: the input heading trace and the segmented bout.

use crate::config::EstimatorConfig;
use crate::filters::kalman::KalmanSmoother;
use crate::filters::SeriesFilter;
use crate::saccade::{Saccade, SaccadeQuery, SaccadeWindow, TurnDirection};
use crate::segmenter::resolve_overlaps;
use crate::utils::angles::{fill_missing, unwrap};
use crate::utils::{argmax_abs, gradient, Statistics};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One time-stamped heading reading; `None` marks a dropped sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Seconds
    pub timestamp: f64,
    /// Heading in radians, wrapped or continuous
    pub value: Option<f64>,
}

impl Measurement {
    #[must_use]
    pub fn new(timestamp: f64, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// A complete, gap-free heading series with its timing.
///
/// The heading is stored unwrapped, so it is continuous across the -π/π seam.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    timestamps: Vec<f64>,
    heading: Vec<f64>,
    framerate: f64,
}

impl Trace {
    /// Trace sampled at `framerate` starting at time zero
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty series, non-finite samples or a
    /// non-positive framerate
    pub fn new(heading: Vec<f64>, framerate: f64) -> Result<Self> {
        validate_framerate(framerate)?;
        #[allow(clippy::cast_precision_loss)]
        let timestamps = (0..heading.len()).map(|i| i as f64 / framerate).collect();
        Self::with_timestamps(timestamps, heading, framerate)
    }

    /// Trace with explicit timestamps
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when lengths differ, the series is empty, any
    /// value is not finite, timestamps are not strictly increasing or the
    /// framerate is not positive
    pub fn with_timestamps(timestamps: Vec<f64>, heading: Vec<f64>, framerate: f64) -> Result<Self> {
        validate_framerate(framerate)?;
        if heading.is_empty() {
            return Err(Error::InvalidInput("Heading series is empty".to_string()));
        }
        if timestamps.len() != heading.len() {
            return Err(Error::InvalidInput(format!(
                "Got {} timestamps for {} heading samples",
                timestamps.len(),
                heading.len()
            )));
        }
        if let Some(i) = heading.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!("Heading sample {i} is not finite")));
        }
        if timestamps.iter().any(|t| !t.is_finite()) || timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidInput(
                "Timestamps must be finite and strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            timestamps,
            heading: unwrap(&heading),
            framerate,
        })
    }

    /// Build a trace from raw measurements, filling dropped samples.
    ///
    /// Missing or non-finite values repeat the last known value; leading gaps
    /// take the first known value. Without an explicit framerate it is taken
    /// from the first timestamp interval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no value is known or the framerate cannot be
    /// determined, plus the checks of [`Trace::with_timestamps`]
    pub fn from_measurements(measurements: &[Measurement], framerate: Option<f64>) -> Result<Self> {
        let framerate = match framerate {
            Some(f) => f,
            None => match measurements {
                [first, second, ..] => 1.0 / (second.timestamp - first.timestamp),
                _ => {
                    return Err(Error::InvalidInput(
                        "Need two measurements to derive the framerate".to_string(),
                    ))
                }
            },
        };
        let values: Vec<Option<f64>> = measurements.iter().map(|m| m.value).collect();
        let heading = fill_missing(&values)
            .ok_or_else(|| Error::InvalidInput("No known heading value in measurements".to_string()))?;
        let timestamps = measurements.iter().map(|m| m.timestamp).collect();
        Self::with_timestamps(timestamps, heading, framerate)
    }

    /// Copy of this trace smoothed by the constant-acceleration estimator.
    ///
    /// The estimator's sampling interval follows the trace framerate.
    ///
    /// # Errors
    ///
    /// Propagates estimator configuration errors
    pub fn kalman_smoothed(&self, config: &EstimatorConfig) -> Result<Self> {
        let config = EstimatorConfig {
            sampling_interval: 1.0 / self.framerate,
            ..*config
        };
        let heading = KalmanSmoother::new(config).filter(&self.heading)?;
        Self::with_timestamps(self.timestamps.clone(), heading, self.framerate)
    }

    /// Unwrapped heading (rad)
    #[must_use]
    pub fn heading(&self) -> &[f64] {
        &self.heading
    }

    #[must_use]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    #[must_use]
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heading.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heading.is_empty()
    }

    /// Time between the first and last sample (s)
    #[must_use]
    pub fn duration(&self) -> f64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Angular velocity (rad/s): central-difference gradient times framerate
    #[must_use]
    pub fn velocity(&self) -> Vec<f64> {
        gradient(&self.heading).into_iter().map(|v| v * self.framerate).collect()
    }
}

fn validate_framerate(framerate: f64) -> Result<()> {
    if framerate.is_finite() && framerate > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Framerate must be positive, got {framerate}")))
    }
}

/// Aggregate statistics of one bout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoutStats {
    /// Trial duration (s)
    pub duration: f64,
    pub saccade_count: usize,
    /// Heading at the largest excursion from the first sample, minus that sample (rad)
    pub total_angle: f64,
    /// Mean angular velocity over the trial (rad/s)
    pub mean_velocity: f64,
    /// Population standard deviation of angular velocity (rad/s)
    pub velocity_std: f64,
    /// Gaps from each saccade's stop to the next one's start (s)
    pub inter_saccade_intervals: Vec<f64>,
    pub inter_saccade_interval: Option<Statistics>,
    /// Saccades per second; zero without saccades
    pub saccade_frequency: f64,
    pub saccade_duration: Option<Statistics>,
    pub saccade_amplitude: Option<Statistics>,
    pub saccade_peak_velocity: Option<Statistics>,
}

impl BoutStats {
    #[allow(clippy::cast_precision_loss)]
    fn compute(trace: &Trace, saccades: &[Saccade]) -> Self {
        let heading = trace.heading();
        let origin = heading[0];
        let deviations: Vec<f64> = heading.iter().map(|h| h - origin).collect();
        let total_angle = argmax_abs(&deviations).map_or(0.0, |i| deviations[i]);

        let velocity = Statistics::from_slice(&trace.velocity());
        let intervals: Vec<f64> = saccades
            .windows(2)
            .map(|pair| (pair[1].start_index as f64 - pair[0].stop_index as f64) / trace.framerate())
            .collect();

        let duration = trace.duration();
        let saccade_frequency = if saccades.is_empty() || duration <= 0.0 {
            0.0
        } else {
            saccades.len() as f64 / duration
        };

        let summarise = |f: fn(&Saccade) -> f64| {
            let values: Vec<f64> = saccades.iter().map(f).collect();
            Statistics::from_slice(&values)
        };

        Self {
            duration,
            saccade_count: saccades.len(),
            total_angle,
            mean_velocity: velocity.map_or(0.0, |s| s.mean),
            velocity_std: velocity.map_or(0.0, |s| s.std_dev),
            inter_saccade_interval: Statistics::from_slice(&intervals),
            inter_saccade_intervals: intervals,
            saccade_frequency,
            saccade_duration: summarise(|s| s.duration),
            saccade_amplitude: summarise(|s| s.amplitude),
            saccade_peak_velocity: summarise(|s| s.peak_velocity),
        }
    }
}

/// One trial's trace with its resolved saccades and statistics
#[derive(Debug, Clone)]
pub struct Bout {
    trace: Trace,
    saccades: Vec<Saccade>,
    stats: BoutStats,
}

impl Bout {
    /// Keep valid saccades inside the trace, resolve overlaps and compute statistics
    #[must_use]
    pub fn new(trace: Trace, saccades: Vec<Saccade>) -> Self {
        let candidates = saccades
            .into_iter()
            .filter(|s| s.valid && s.stop_index < trace.len())
            .collect();
        let saccades = resolve_overlaps(candidates);
        let stats = BoutStats::compute(&trace, &saccades);
        Self { trace, saccades, stats }
    }

    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Saccades ordered by start index, pairwise non-overlapping
    #[must_use]
    pub fn saccades(&self) -> &[Saccade] {
        &self.saccades
    }

    #[must_use]
    pub fn stats(&self) -> &BoutStats {
        &self.stats
    }

    /// Per-frame flag: a leftward saccade is in progress
    #[must_use]
    pub fn leftward(&self) -> Vec<bool> {
        self.indicator(TurnDirection::Left)
    }

    /// Per-frame flag: a rightward saccade is in progress
    #[must_use]
    pub fn rightward(&self) -> Vec<bool> {
        self.indicator(TurnDirection::Right)
    }

    fn indicator(&self, direction: TurnDirection) -> Vec<bool> {
        let mut flags = vec![false; self.trace.len()];
        for saccade in self.saccades.iter().filter(|s| s.direction() == direction) {
            flags[saccade.start_index..saccade.stop_index].fill(true);
        }
        flags
    }

    /// Query every saccade whose peak speed (deg/s) lies strictly between the bounds
    #[must_use]
    pub fn query_saccades(&self, min_speed: f64, max_speed: f64, query: &SaccadeQuery) -> Vec<SaccadeWindow> {
        self.saccades
            .iter()
            .filter(|s| {
                let speed = s.peak_speed_deg();
                speed > min_speed && speed < max_speed
            })
            .map(|s| s.query(&self.trace, query))
            .collect()
    }
}
