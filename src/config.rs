//! Configuration for the estimator, the conditioner and the saccade segmenter.
//!
//! Every entry point takes one of these values by reference and keeps its own
//! validated copy; nothing in the crate reads mutable global defaults.

use crate::constants::{
    DEFAULT_BASELINE_FRAMES, DEFAULT_BUTTERWORTH_ORDER, DEFAULT_FPS, DEFAULT_INTERPOLATION_PADDING,
    DEFAULT_INTERPOLATION_POINTS, DEFAULT_JERK_MEAN, DEFAULT_JERK_STD, DEFAULT_LOWPASS_CUTOFF,
    DEFAULT_MAX_SACCADE_DURATION, DEFAULT_MEASUREMENT_NOISE, DEFAULT_MEDIAN_WINDOW, DEFAULT_NOISE_SIGMA,
    DEFAULT_PEAK_DISTANCE, DEFAULT_PEAK_FRACTION, DEFAULT_PEAK_PROMINENCE, DEFAULT_PEAK_WIDTH,
    DEFAULT_PEAK_WINDOW, DEFAULT_THRESHOLD_SPEED, MIN_BASELINE_FRAMES,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Saccade segmentation parameters
    pub segmenter: SegmenterConfig,

    /// State estimator noise model
    pub estimator: EstimatorConfig,
}

/// Candidate detection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Median smoothing, fixed speed threshold, peak-anchored expansion
    #[default]
    ThresholdRun,
    /// Zero-phase low-pass smoothing and prominence-based peak finding
    PeakFinder,
}

impl FromStr for DetectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "threshold_run" | "threshold" => Ok(Self::ThresholdRun),
            "peak_finder" | "peaks" => Ok(Self::PeakFinder),
            _ => Err(Error::ConfigError(format!("Unknown detection method: {s}"))),
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThresholdRun => write!(f, "threshold_run"),
            Self::PeakFinder => write!(f, "peak_finder"),
        }
    }
}

/// Saccade segmentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Candidate detection strategy
    pub method: DetectionMethod,

    /// Minimum angular speed of a saccade (degrees per second)
    pub threshold_speed: f64,

    /// Median window for the threshold-run path (odd, samples)
    pub median_window: usize,

    /// Re-baseline velocity on the frames before onset
    pub relative_start_velocity: bool,

    /// Fraction of the peak velocity that bounds the expansion
    pub peak_fraction: f64,

    /// Half-width of the noise band in standard deviations
    pub noise_sigma: f64,

    /// Frames before onset used for the noise baseline
    pub baseline_frames: usize,

    /// Fewest baseline frames needed to validate a saccade
    pub min_baseline_frames: usize,

    /// Longest plausible saccade (seconds)
    pub max_duration: f64,

    /// Refine the peak velocity by monotone cubic interpolation
    pub interpolate_velocity: bool,

    /// Frames of padding on each side of the interpolation window
    pub interpolation_padding: usize,

    /// Number of instants on the dense interpolation grid
    pub interpolation_points: usize,

    /// Conditioner for the peak-finder path
    pub conditioner: ConditionerConfig,

    /// Peak-finder constraints
    pub peak_finder: PeakFinderConfig,
}

/// Butterworth conditioner bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionerConfig {
    /// Lower band edge in Hz (0 for low-pass)
    pub low: f64,

    /// Upper band edge in Hz (`.inf` in YAML for high-pass)
    pub high: f64,

    /// Butterworth order
    pub order: usize,

    /// Average forward and reversed passes
    pub zero_phase: bool,
}

/// Peak-finder constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakFinderConfig {
    /// Minimum distance between peaks (seconds)
    pub distance: f64,

    /// Minimum peak width at half prominence (samples)
    pub width: f64,

    /// Accepted prominence range (radians per second)
    pub prominence: (f64, f64),

    /// Window for the prominence search (seconds)
    pub window: f64,
}

/// Constant-acceleration estimator noise model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Sampling interval in seconds
    pub sampling_interval: f64,

    /// Mean of the jerk process noise
    pub jerk_mean: f64,

    /// Standard deviation of the jerk process noise
    pub jerk_std: f64,

    /// Measurement noise variance along x
    pub measurement_noise_x: f64,

    /// Measurement noise variance along y
    pub measurement_noise_y: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            method: DetectionMethod::default(),
            threshold_speed: DEFAULT_THRESHOLD_SPEED,
            median_window: DEFAULT_MEDIAN_WINDOW,
            relative_start_velocity: true,
            peak_fraction: DEFAULT_PEAK_FRACTION,
            noise_sigma: DEFAULT_NOISE_SIGMA,
            baseline_frames: DEFAULT_BASELINE_FRAMES,
            min_baseline_frames: MIN_BASELINE_FRAMES,
            max_duration: DEFAULT_MAX_SACCADE_DURATION,
            interpolate_velocity: true,
            interpolation_padding: DEFAULT_INTERPOLATION_PADDING,
            interpolation_points: DEFAULT_INTERPOLATION_POINTS,
            conditioner: ConditionerConfig::default(),
            peak_finder: PeakFinderConfig::default(),
        }
    }
}

impl Default for ConditionerConfig {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: DEFAULT_LOWPASS_CUTOFF,
            order: DEFAULT_BUTTERWORTH_ORDER,
            zero_phase: true,
        }
    }
}

impl Default for PeakFinderConfig {
    fn default() -> Self {
        Self {
            distance: DEFAULT_PEAK_DISTANCE,
            width: DEFAULT_PEAK_WIDTH,
            prominence: DEFAULT_PEAK_PROMINENCE,
            window: DEFAULT_PEAK_WINDOW,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sampling_interval: 1.0 / DEFAULT_FPS,
            jerk_mean: DEFAULT_JERK_MEAN,
            jerk_std: DEFAULT_JERK_STD,
            measurement_noise_x: DEFAULT_MEASUREMENT_NOISE,
            measurement_noise_y: DEFAULT_MEASUREMENT_NOISE,
        }
    }
}

impl SegmenterConfig {
    /// Threshold speed in radians per second
    #[must_use]
    pub fn threshold_speed_rad(&self) -> f64 {
        self.threshold_speed.to_radians()
    }

    /// Validate segmentation parameters
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first offending field
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_speed.is_finite() && self.threshold_speed > 0.0) {
            return Err(Error::ConfigError("Threshold speed must be positive".to_string()));
        }
        if self.median_window == 0 || self.median_window % 2 == 0 {
            return Err(Error::ConfigError(
                "Median window size must be odd and greater than 0".to_string(),
            ));
        }
        if !(self.peak_fraction > 0.0 && self.peak_fraction < 1.0) {
            return Err(Error::ConfigError("Peak fraction must be between 0.0 and 1.0".to_string()));
        }
        if !(self.noise_sigma.is_finite() && self.noise_sigma > 0.0) {
            return Err(Error::ConfigError("Noise sigma multiplier must be positive".to_string()));
        }
        if self.min_baseline_frames < 2 || self.baseline_frames < self.min_baseline_frames {
            return Err(Error::ConfigError(
                "Baseline needs at least 2 frames and baseline_frames >= min_baseline_frames".to_string(),
            ));
        }
        if !(self.max_duration.is_finite() && self.max_duration > 0.0) {
            return Err(Error::ConfigError("Maximum saccade duration must be positive".to_string()));
        }
        if self.interpolate_velocity && self.interpolation_points < 2 {
            return Err(Error::ConfigError(
                "Interpolation grid needs at least 2 points".to_string(),
            ));
        }
        self.conditioner.validate()?;
        self.peak_finder.validate()
    }
}

impl ConditionerConfig {
    /// Validate frequency bounds; Nyquist checks happen once the framerate is known
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a negative low bound, `high <= 0`, `low >= high`
    /// or a zero order
    pub fn validate(&self) -> Result<()> {
        if self.low.is_nan() || self.low < 0.0 {
            return Err(Error::ConfigError("Low frequency bound must be non-negative".to_string()));
        }
        if self.high.is_nan() || self.high <= 0.0 {
            return Err(Error::ConfigError("High frequency bound must be positive".to_string()));
        }
        if self.low >= self.high {
            return Err(Error::ConfigError("Low frequency bound must be below the high bound".to_string()));
        }
        if self.order == 0 {
            return Err(Error::ConfigError("Filter order must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl PeakFinderConfig {
    /// Validate peak-finder constraints
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for non-positive sizes or an inverted prominence range
    pub fn validate(&self) -> Result<()> {
        if !(self.distance > 0.0 && self.width > 0.0 && self.window > 0.0) {
            return Err(Error::ConfigError(
                "Peak distance, width and window must be positive".to_string(),
            ));
        }
        let (lo, hi) = self.prominence;
        if lo.is_nan() || hi.is_nan() || lo < 0.0 || lo > hi {
            return Err(Error::ConfigError(format!("Invalid prominence range ({lo}, {hi})")));
        }
        Ok(())
    }
}

impl EstimatorConfig {
    /// Estimator sampled at `framerate` with otherwise default noise
    #[must_use]
    pub fn with_framerate(framerate: f64) -> Self {
        Self {
            sampling_interval: framerate.recip(),
            ..Self::default()
        }
    }

    /// Validate the noise model
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a non-positive interval or negative noise terms
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_interval.is_finite() && self.sampling_interval > 0.0) {
            return Err(Error::ConfigError("Sampling interval must be positive".to_string()));
        }
        if !self.jerk_mean.is_finite() {
            return Err(Error::ConfigError("Jerk mean must be finite".to_string()));
        }
        for (name, value) in [
            ("Jerk standard deviation", self.jerk_std),
            ("Measurement noise x", self.measurement_noise_x),
            ("Measurement noise y", self.measurement_noise_y),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::ConfigError(format!("{name} must be non-negative")));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of any section
    pub fn validate(&self) -> Result<()> {
        self.segmenter.validate()?;
        self.estimator.validate()
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Saccade segmentation configuration

segmenter:
  method: threshold_run        # or peak_finder
  threshold_speed: 350.0       # deg/s
  median_window: 5
  relative_start_velocity: true
  peak_fraction: 0.25
  noise_sigma: 2.0
  baseline_frames: 10
  min_baseline_frames: 2
  max_duration: 1.5            # s
  interpolate_velocity: true
  interpolation_padding: 10
  interpolation_points: 1000
  conditioner:
    low: 0.0
    high: 10.0
    order: 5
    zero_phase: true
  peak_finder:
    distance: 0.125            # s
    width: 3.0                 # samples
    prominence: [1.0, 30.0]    # rad/s
    window: 0.5                # s

# Constant-acceleration estimator
estimator:
  sampling_interval: 0.03333333333333333
  jerk_mean: 0.0
  jerk_std: 125.0
  measurement_noise_x: 5.0
  measurement_noise_y: 5.0
"#;
