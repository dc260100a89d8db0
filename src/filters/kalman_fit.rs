//! Offline search for the jerk noise that best explains a heading series.

use super::kalman::AngleTracker;
use crate::config::EstimatorConfig;
use crate::utils::angles::unwrap;
use crate::{Error, Result};
use log::debug;

/// Inverse golden ratio
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Search bounds and stopping rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Smallest jerk standard deviation considered
    pub lower: f64,
    /// Largest jerk standard deviation considered
    pub upper: f64,
    /// Measurement noise variance held fixed during the search
    pub measurement_noise: f64,
    /// Stop once the bracket is narrower than this in log space
    pub tolerance: f64,
    /// Upper bound on golden-section iterations
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            lower: 0.1,
            upper: 10_000.0,
            measurement_noise: 1.0,
            tolerance: 1e-3,
            max_iterations: 100,
        }
    }
}

/// Outcome of a parameter search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Best jerk standard deviation found
    pub jerk_std: f64,
    /// Sum of squared one-step prediction errors at `jerk_std`
    pub error: f64,
    /// Number of filter runs performed
    pub evaluations: usize,
}

/// Fits the estimator's jerk noise to a recorded heading series
pub struct KalmanFitter {
    series: Vec<f64>,
    tracker: AngleTracker,
    base: EstimatorConfig,
    evaluations: usize,
}

impl KalmanFitter {
    /// Prepare a fit over `series` sampled as described by `base`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for fewer than three samples and propagates
    /// invalid noise models
    pub fn new(series: &[f64], base: EstimatorConfig) -> Result<Self> {
        if series.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "Need at least 3 samples to fit the estimator, got {}",
                series.len()
            )));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput("Series contains non-finite values".to_string()));
        }
        Ok(Self {
            series: unwrap(series),
            tracker: AngleTracker::new(base)?,
            base,
            evaluations: 0,
        })
    }

    /// Sum of squared differences between each sample and the prediction made
    /// one step earlier; undefined predictions contribute nothing.
    ///
    /// # Errors
    ///
    /// Propagates tracker failures
    pub fn error(&mut self, jerk_std: f64, measurement_noise: f64) -> Result<f64> {
        self.tracker.reconfigure(EstimatorConfig {
            jerk_std,
            measurement_noise_x: measurement_noise,
            ..self.base
        })?;
        let predictions = self.tracker.smooth_unwrapped(&self.series)?;
        self.evaluations += 1;
        Ok(predictions
            .iter()
            .zip(&self.series[1..])
            .filter_map(|(p, actual)| p.map(|p| (actual - p).powi(2)))
            .sum())
    }

    /// Golden-section search on `ln(jerk_std)` between the option bounds
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for invalid bounds and propagates tracker failures
    pub fn fit(&mut self, options: &FitOptions) -> Result<FitResult> {
        if !(options.lower > 0.0 && options.upper > options.lower && options.upper.is_finite()) {
            return Err(Error::ConfigError(format!(
                "Fit bounds must satisfy 0 < lower < upper, got {} and {}",
                options.lower, options.upper
            )));
        }
        if !(options.tolerance > 0.0) {
            return Err(Error::ConfigError("Fit tolerance must be positive".to_string()));
        }
        self.evaluations = 0;
        let noise = options.measurement_noise;

        let mut best = (options.lower, self.error(options.lower, noise)?);
        let upper_error = self.error(options.upper, noise)?;
        if upper_error < best.1 {
            best = (options.upper, upper_error);
        }

        let (mut a, mut b) = (options.lower.ln(), options.upper.ln());
        let mut c = b - INV_PHI * (b - a);
        let mut d = a + INV_PHI * (b - a);
        let mut fc = self.error(c.exp(), noise)?;
        let mut fd = self.error(d.exp(), noise)?;

        for _ in 0..options.max_iterations {
            for (x, f) in [(c, fc), (d, fd)] {
                if f < best.1 {
                    best = (x.exp(), f);
                }
            }
            if (b - a).abs() < options.tolerance {
                break;
            }
            if fc < fd {
                b = d;
                d = c;
                fd = fc;
                c = b - INV_PHI * (b - a);
                fc = self.error(c.exp(), noise)?;
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + INV_PHI * (b - a);
                fd = self.error(d.exp(), noise)?;
            }
        }
        for (x, f) in [(c, fc), (d, fd)] {
            if f < best.1 {
                best = (x.exp(), f);
            }
        }

        debug!(
            "Estimator fit: jerk_std={:.3} error={:.6} after {} runs",
            best.0, best.1, self.evaluations
        );
        Ok(FitResult {
            jerk_std: best.0,
            error: best.1,
            evaluations: self.evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(n: usize, fs: f64) -> Vec<f64> {
        (0..n).map(|i| (i as f64 / fs * 2.0).sin()).collect()
    }

    #[test]
    fn test_rejects_short_series() {
        assert!(KalmanFitter::new(&[0.0, 1.0], EstimatorConfig::default()).is_err());
        assert!(KalmanFitter::new(&[0.0, f64::NAN, 1.0], EstimatorConfig::default()).is_err());
    }

    #[test]
    fn test_fit_within_bounds_and_not_worse_than_edges() {
        let series = sine(120, 30.0);
        let mut fitter = KalmanFitter::new(&series, EstimatorConfig::with_framerate(30.0)).unwrap();
        let options = FitOptions {
            lower: 1.0,
            upper: 1000.0,
            tolerance: 1e-2,
            ..FitOptions::default()
        };
        let result = fitter.fit(&options).unwrap();
        assert!(result.jerk_std >= 1.0 && result.jerk_std <= 1000.0);
        assert!(result.evaluations > 4);

        let at_lower = fitter.error(1.0, options.measurement_noise).unwrap();
        let at_upper = fitter.error(1000.0, options.measurement_noise).unwrap();
        assert!(result.error <= at_lower);
        assert!(result.error <= at_upper);
    }

    #[test]
    fn test_invalid_bounds() {
        let series = sine(30, 30.0);
        let mut fitter = KalmanFitter::new(&series, EstimatorConfig::default()).unwrap();
        let options = FitOptions {
            lower: 10.0,
            upper: 1.0,
            ..FitOptions::default()
        };
        assert!(matches!(fitter.fit(&options), Err(Error::ConfigError(_))));
    }
}
