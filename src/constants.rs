//! Constants used throughout the library

/// Default frames per second assumption for the estimator
pub const DEFAULT_FPS: f64 = 30.0;

/// Minimum angular speed for a threshold-run candidate (degrees per second)
pub const DEFAULT_THRESHOLD_SPEED: f64 = 350.0;

/// Noise band half-width in standard deviations
pub const DEFAULT_NOISE_SIGMA: f64 = 2.0;

/// Longest plausible saccade (seconds)
pub const DEFAULT_MAX_SACCADE_DURATION: f64 = 1.5;

/// Shortest retained saccade window (frames)
pub const MIN_SACCADE_FRAMES: usize = 2;

/// Median smoothing window for the threshold-run path
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;

/// Fraction of the peak velocity that bounds a saccade
pub const DEFAULT_PEAK_FRACTION: f64 = 0.25;

/// Frames of history required before a threshold-run onset
pub const REBASELINE_FAR: usize = 10;

/// Re-baselining window ends this many frames before onset
pub const REBASELINE_NEAR: usize = 5;

/// Frames before onset used for the noise baseline
pub const DEFAULT_BASELINE_FRAMES: usize = 10;

/// Fewest baseline frames that still give a usable spread estimate
pub const MIN_BASELINE_FRAMES: usize = 2;

/// Frames of padding on each side of the interpolation window
pub const DEFAULT_INTERPOLATION_PADDING: usize = 10;

/// Dense grid resolution for the interpolated peak
pub const DEFAULT_INTERPOLATION_POINTS: usize = 1000;

/// Default Butterworth order
pub const DEFAULT_BUTTERWORTH_ORDER: usize = 5;

/// Default low-pass cutoff for the peak-finder path (Hz)
pub const DEFAULT_LOWPASS_CUTOFF: f64 = 10.0;

/// Peak-finder minimum inter-peak distance (seconds)
pub const DEFAULT_PEAK_DISTANCE: f64 = 0.125;

/// Peak-finder minimum width (samples)
pub const DEFAULT_PEAK_WIDTH: f64 = 3.0;

/// Peak-finder prominence bounds (radians per second)
pub const DEFAULT_PEAK_PROMINENCE: (f64, f64) = (1.0, 30.0);

/// Peak-finder prominence window (seconds)
pub const DEFAULT_PEAK_WINDOW: f64 = 0.5;

/// Default mean of the jerk process noise
pub const DEFAULT_JERK_MEAN: f64 = 0.0;

/// Default standard deviation of the jerk process noise
pub const DEFAULT_JERK_STD: f64 = 125.0;

/// Default per-axis measurement noise variance
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 5.0;
