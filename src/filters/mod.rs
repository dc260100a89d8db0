//! Signal conditioning for heading series.
//!
//! Conditioners take a whole series and return a series of the same length.
//! Frequency-domain filters, median smoothing and the constant-acceleration
//! estimator all share the [`SeriesFilter`] interface.

/// Butterworth design and causal / zero-phase filtering
pub mod butterworth;

/// Constant-acceleration Kalman estimator
pub mod kalman;

/// Offline search for the estimator's jerk noise
pub mod kalman_fit;

/// Median filter for outlier rejection
pub mod median;

use crate::config::EstimatorConfig;
use crate::constants::{DEFAULT_BUTTERWORTH_ORDER, DEFAULT_MEDIAN_WINDOW};
use crate::{Error, Result};

/// Trait for all series conditioners
pub trait SeriesFilter: Send + Sync {
    /// Filter a whole series; the output has the same length as the input
    ///
    /// # Errors
    ///
    /// Returns an error when the series cannot be filtered
    fn filter(&self, series: &[f64]) -> Result<Vec<f64>>;

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl SeriesFilter for NoFilter {
    fn filter(&self, series: &[f64]) -> Result<Vec<f64>> {
        Ok(series.to_vec())
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_arg(spec: &str, arg: Option<&str>) -> Result<f64> {
    let arg = arg.ok_or_else(|| Error::FilterError(format!("Missing parameter in filter spec: {spec}")))?;
    arg.trim()
        .parse::<f64>()
        .map_err(|_| Error::FilterError(format!("Invalid parameter '{arg}' in filter spec: {spec}")))
}

/// Create a conditioner from a spec string such as `median:5`, `lowpass:10`,
/// `highpass:1`, `bandpass:1:6`, `zerophase:0:10`, `kalman` or `none`.
///
/// Butterworth conditioners use order 5; all but `zerophase` are causal.
///
/// # Errors
///
/// Returns `FilterError` for unknown names or bad parameters
pub fn create_filter(spec: &str, sample_rate: f64) -> Result<Box<dyn SeriesFilter>> {
    let lowered = spec.trim().to_lowercase();
    let mut parts = lowered.split(':');
    let kind = parts.next().unwrap_or_default();

    let filter: Box<dyn SeriesFilter> = match kind {
        "none" | "nofilter" => Box::new(NoFilter),
        "median" => {
            let window = match parts.next() {
                Some(arg) => arg
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| Error::FilterError(format!("Invalid median window in filter spec: {spec}")))?,
                None => DEFAULT_MEDIAN_WINDOW,
            };
            if window == 0 || window % 2 == 0 {
                return Err(Error::FilterError(format!(
                    "Median filter window size must be odd, got {window}"
                )));
            }
            Box::new(median::MedianFilter::new(window))
        }
        "lowpass" | "low_pass" => {
            let high = parse_arg(spec, parts.next())?;
            Box::new(butterworth::ButterworthFilter::new(
                DEFAULT_BUTTERWORTH_ORDER, 0.0, high, sample_rate, false,
            )?)
        }
        "highpass" | "high_pass" => {
            let low = parse_arg(spec, parts.next())?;
            Box::new(butterworth::ButterworthFilter::new(
                DEFAULT_BUTTERWORTH_ORDER, low, f64::INFINITY, sample_rate, false,
            )?)
        }
        "bandpass" | "band_pass" | "zerophase" | "zero_phase" => {
            let low = parse_arg(spec, parts.next())?;
            let high = parse_arg(spec, parts.next())?;
            let zero_phase = kind.starts_with("zero");
            Box::new(butterworth::ButterworthFilter::new(
                DEFAULT_BUTTERWORTH_ORDER, low, high, sample_rate, zero_phase,
            )?)
        }
        "kalman" => {
            if !(sample_rate.is_finite() && sample_rate > 0.0) {
                return Err(Error::FilterError(format!("Invalid sample rate: {sample_rate}")));
            }
            Box::new(kalman::KalmanSmoother::new(EstimatorConfig::with_framerate(sample_rate)))
        }
        _ => return Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    };

    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters in filter spec: {spec}")));
    }
    Ok(filter)
}
