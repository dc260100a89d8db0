//! Saccade value object: kinematics, peak refinement and noise validation.
//!
//! A saccade is built from a `[start, stop]` window of the original
//! (unfiltered) heading. Its peak velocity must lie outside the noise band
//! measured just before onset for the saccade to count as valid.

use crate::bout::Trace;
use crate::config::SegmenterConfig;
use crate::constants::MIN_SACCADE_FRAMES;
use crate::interpolate::{linspace, MonotoneCubic};
use crate::utils::{argmax_abs, mean_std};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Turn direction; positive angular velocity is counter-clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

/// Noise band of the pre-onset velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityBaseline {
    /// Mean velocity before onset (rad/s)
    pub mean: f64,
    /// Population standard deviation (rad/s)
    pub std_dev: f64,
    /// `mean - k * std_dev`
    pub floor: f64,
    /// `mean + k * std_dev`
    pub ceiling: f64,
    /// Frames the band was measured on
    pub frames: usize,
}

impl VelocityBaseline {
    /// Whether `velocity` lies strictly outside `[floor, ceiling]`
    #[must_use]
    pub fn exceeded_by(&self, velocity: f64) -> bool {
        velocity > self.ceiling || velocity < self.floor
    }
}

/// A rapid turn detected within a heading trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Saccade {
    /// First frame of the saccade
    pub start_index: usize,
    /// Last frame of the saccade (inclusive)
    pub stop_index: usize,
    /// Timestamp of `start_index` (s)
    pub start_time: f64,
    /// Timestamp of `stop_index` (s)
    pub stop_time: f64,
    /// Unwrapped heading at onset (rad)
    pub start_angle: f64,
    /// Unwrapped heading at offset (rad)
    pub stop_angle: f64,
    /// Signed displacement `stop_angle - start_angle` (rad)
    pub amplitude: f64,
    /// `(stop_index - start_index) / framerate` (s)
    pub duration: f64,
    /// Peak angular velocity (rad/s), interpolated when enabled
    pub peak_velocity: f64,
    /// Timestamp of the peak velocity (s)
    pub peak_time: f64,
    /// Pre-onset noise band, absent when too little history precedes onset
    pub baseline: Option<VelocityBaseline>,
    /// Peak lies outside the pre-onset noise band and the window spans at least two frames
    pub valid: bool,
}

impl Saccade {
    /// Build a saccade over `[start, stop]` of `trace`.
    ///
    /// `velocity` is the trace's angular velocity in rad/s. Missing baseline
    /// history makes the saccade invalid rather than failing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the window is inverted or out of range, or
    /// `velocity` does not match the trace length
    pub fn new(trace: &Trace, velocity: &[f64], start: usize, stop: usize, config: &SegmenterConfig) -> Result<Self> {
        let n = trace.len();
        if velocity.len() != n {
            return Err(Error::InvalidInput(format!(
                "Velocity has {} samples but the trace has {n}",
                velocity.len()
            )));
        }
        if start > stop || stop >= n {
            return Err(Error::InvalidInput(format!(
                "Saccade window [{start}, {stop}] is not within a trace of {n} samples"
            )));
        }

        let heading = trace.heading();
        let times = trace.timestamps();
        let start_angle = heading[start];
        let stop_angle = heading[stop];

        let pre_onset = &velocity[start.saturating_sub(config.baseline_frames)..start];
        let baseline = if pre_onset.len() >= config.min_baseline_frames {
            mean_std(pre_onset).map(|(mean, std_dev)| VelocityBaseline {
                mean,
                std_dev,
                floor: mean - config.noise_sigma * std_dev,
                ceiling: mean + config.noise_sigma * std_dev,
                frames: pre_onset.len(),
            })
        } else {
            None
        };

        let (peak_velocity, peak_time) = if config.interpolate_velocity {
            interpolated_peak(times, velocity, start, stop, config)?
        } else {
            discrete_peak(times, velocity, start, stop)
        };

        #[allow(clippy::cast_precision_loss)]
        let duration = (stop - start) as f64 / trace.framerate();
        let valid = stop - start >= MIN_SACCADE_FRAMES
            && baseline.is_some_and(|b| b.exceeded_by(peak_velocity));

        Ok(Self {
            start_index: start,
            stop_index: stop,
            start_time: times[start],
            stop_time: times[stop],
            start_angle,
            stop_angle,
            amplitude: stop_angle - start_angle,
            duration,
            peak_velocity,
            peak_time,
            baseline,
            valid,
        })
    }

    /// Number of frame steps spanned
    #[must_use]
    pub fn frames(&self) -> usize {
        self.stop_index - self.start_index
    }

    /// Whether the inclusive frame ranges share at least one frame
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_index <= other.stop_index && other.start_index <= self.stop_index
    }

    #[must_use]
    pub fn direction(&self) -> TurnDirection {
        if self.peak_velocity > 0.0 {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        }
    }

    /// Absolute peak velocity in degrees per second
    #[must_use]
    pub fn peak_speed_deg(&self) -> f64 {
        self.peak_velocity.abs().to_degrees()
    }

    /// Slice heading or velocity around the saccade.
    ///
    /// Each sample time is measured from the query's time base; samples with
    /// `from <= t < to` are returned. Headings are relative to `start_angle`.
    #[must_use]
    pub fn query(&self, trace: &Trace, query: &SaccadeQuery) -> SaccadeWindow {
        let origin = match query.base {
            TimeBase::Onset => self.start_time,
            TimeBase::Peak => self.peak_time,
        };
        let from = self.resolve(query.from, origin);
        let to = self.resolve(query.to, origin);

        let values = match query.output {
            QueryOutput::Heading => trace.heading().iter().map(|h| h - self.start_angle).collect(),
            QueryOutput::Velocity => trace.velocity(),
        };

        let mut window = SaccadeWindow::default();
        for (t, v) in trace.timestamps().iter().zip(values) {
            let relative = t - origin;
            if relative >= from && relative < to {
                window.times.push(relative);
                window.values.push(v);
            }
        }
        window
    }

    fn resolve(&self, time: TimeRef, origin: f64) -> f64 {
        match time {
            TimeRef::Start(delta) => self.start_time - origin + delta,
            TimeRef::Stop(delta) => self.stop_time - origin + delta,
            TimeRef::Offset(t) => t,
        }
    }
}

fn discrete_peak(times: &[f64], velocity: &[f64], start: usize, stop: usize) -> (f64, f64) {
    let offset = argmax_abs(&velocity[start..=stop]).unwrap_or(0);
    (velocity[start + offset], times[start + offset])
}

fn interpolated_peak(
    times: &[f64],
    velocity: &[f64],
    start: usize,
    stop: usize,
    config: &SegmenterConfig,
) -> Result<(f64, f64)> {
    let lo = start.saturating_sub(config.interpolation_padding);
    let hi = (stop + config.interpolation_padding + 1).min(times.len());
    if hi - lo < 2 {
        return Ok(discrete_peak(times, velocity, start, stop));
    }

    let curve = MonotoneCubic::new(&times[lo..hi], &velocity[lo..hi])?;
    let grid = linspace(times[start], times[stop], config.interpolation_points);
    let dense = curve.eval_many(&grid);
    Ok(match argmax_abs(&dense) {
        Some(i) => (dense[i], grid[i]),
        None => discrete_peak(times, velocity, start, stop),
    })
}

/// Instant referenced by a saccade query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeRef {
    /// Seconds after the saccade onset
    Start(f64),
    /// Seconds after the saccade offset
    Stop(f64),
    /// Seconds from the query's time base
    Offset(f64),
}

impl FromStr for TimeRef {
    type Err = Error;

    /// Parses `start`, `stop`, `start+0.2`, `stop-0.1` or a plain number
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let delta = |rest: &str| -> Result<f64> {
            let rest = rest.trim();
            if rest.is_empty() {
                return Ok(0.0);
            }
            rest.parse::<f64>()
                .map_err(|_| Error::InvalidInput(format!("Invalid time offset in '{s}'")))
        };
        if let Some(rest) = s.strip_prefix("start") {
            Ok(Self::Start(delta(rest)?))
        } else if let Some(rest) = s.strip_prefix("stop") {
            Ok(Self::Stop(delta(rest)?))
        } else {
            s.parse::<f64>()
                .map(Self::Offset)
                .map_err(|_| Error::InvalidInput(format!("Invalid time reference: '{s}'")))
        }
    }
}

impl fmt::Display for TimeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(d) => write!(f, "start{d:+}"),
            Self::Stop(d) => write!(f, "stop{d:+}"),
            Self::Offset(t) => write!(f, "{t}"),
        }
    }
}

/// Origin of the query time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBase {
    #[default]
    Onset,
    Peak,
}

/// Series returned by a saccade query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryOutput {
    /// Heading relative to the saccade's start angle (rad)
    #[default]
    Heading,
    /// Angular velocity (rad/s)
    Velocity,
}

/// Window selection for [`Saccade::query`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaccadeQuery {
    pub output: QueryOutput,
    pub base: TimeBase,
    pub from: TimeRef,
    pub to: TimeRef,
}

impl Default for SaccadeQuery {
    fn default() -> Self {
        Self {
            output: QueryOutput::Heading,
            base: TimeBase::Onset,
            from: TimeRef::Start(0.0),
            to: TimeRef::Stop(0.0),
        }
    }
}

/// Samples selected by a query, times relative to the time base
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaccadeWindow {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_trace() -> (Trace, Vec<f64>) {
        // still for 20 frames, turn at 6 rad/s for 6 frames, still again
        let fs = 60.0;
        let mut heading = vec![0.0; 20];
        for i in 1..=6 {
            heading.push(f64::from(i) * 0.1);
        }
        heading.extend(std::iter::repeat(0.6).take(20));
        let trace = Trace::new(heading, fs).unwrap();
        let velocity = trace.velocity();
        (trace, velocity)
    }

    fn config() -> SegmenterConfig {
        SegmenterConfig::default()
    }

    #[test]
    fn test_kinematics() {
        let (trace, velocity) = ramp_trace();
        let saccade = Saccade::new(&trace, &velocity, 19, 25, &config()).unwrap();
        assert_eq!(saccade.frames(), 6);
        assert!((saccade.amplitude - 0.6).abs() < 1e-12);
        assert!((saccade.duration - 0.1).abs() < 1e-12);
        assert!((saccade.start_time - 19.0 / 60.0).abs() < 1e-12);
        assert_eq!(saccade.direction(), TurnDirection::Left);
        assert!(saccade.valid);
        assert!(saccade.peak_time >= saccade.start_time && saccade.peak_time <= saccade.stop_time);
    }

    #[test]
    fn test_discrete_peak() {
        let (trace, velocity) = ramp_trace();
        let cfg = SegmenterConfig {
            interpolate_velocity: false,
            ..config()
        };
        let saccade = Saccade::new(&trace, &velocity, 19, 25, &cfg).unwrap();
        assert!((saccade.peak_velocity - 6.0).abs() < 1e-9);
        assert!((saccade.peak_speed_deg() - 6.0_f64.to_degrees()).abs() < 1e-6);
    }

    #[test]
    fn test_short_history_is_invalid() {
        let (trace, velocity) = ramp_trace();
        let saccade = Saccade::new(&trace, &velocity, 1, 25, &config()).unwrap();
        assert!(saccade.baseline.is_none());
        assert!(!saccade.valid);
    }

    #[test]
    fn test_window_out_of_range() {
        let (trace, velocity) = ramp_trace();
        assert!(Saccade::new(&trace, &velocity, 10, 5, &config()).is_err());
        assert!(Saccade::new(&trace, &velocity, 10, 46, &config()).is_err());
        assert!(Saccade::new(&trace, &velocity[1..], 10, 20, &config()).is_err());
    }

    #[test]
    fn test_overlaps() {
        let (trace, velocity) = ramp_trace();
        let a = Saccade::new(&trace, &velocity, 10, 20, &config()).unwrap();
        let b = Saccade::new(&trace, &velocity, 20, 30, &config()).unwrap();
        let c = Saccade::new(&trace, &velocity, 21, 30, &config()).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_time_ref_parsing() {
        assert_eq!("start".parse::<TimeRef>().unwrap(), TimeRef::Start(0.0));
        assert_eq!("start+0.2".parse::<TimeRef>().unwrap(), TimeRef::Start(0.2));
        assert_eq!("stop-0.1".parse::<TimeRef>().unwrap(), TimeRef::Stop(-0.1));
        assert_eq!(" 0.3 ".parse::<TimeRef>().unwrap(), TimeRef::Offset(0.3));
        assert!("later".parse::<TimeRef>().is_err());
        assert!("start+x".parse::<TimeRef>().is_err());
    }

    #[test]
    fn test_query_window() {
        let (trace, velocity) = ramp_trace();
        let saccade = Saccade::new(&trace, &velocity, 19, 25, &config()).unwrap();

        let window = saccade.query(&trace, &SaccadeQuery::default());
        // [start, stop) covers the six frames before the offset
        assert_eq!(window.values.len(), 6);
        assert_eq!(window.values[0], 0.0);
        assert!(window.times[0].abs() < 1e-12);

        let extended = SaccadeQuery {
            output: QueryOutput::Velocity,
            to: "stop+0.09".parse().unwrap(),
            ..SaccadeQuery::default()
        };
        assert_eq!(saccade.query(&trace, &extended).values.len(), 12);
    }
}
