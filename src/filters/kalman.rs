//! Constant-acceleration Kalman filtering for tracked points and headings.
//!
//! Each tracked object carries a six-component state
//! `[x, y, vx, vy, ax, ay]`. All objects share one error covariance because
//! they share the motion and measurement models. Process noise comes from a
//! Gaussian jerk integrated over the sampling interval.

use super::SeriesFilter;
use crate::config::EstimatorConfig;
use crate::utils::angles::{wrap_angle, Unwrapper};
use crate::{Error, Result};
use log::{debug, warn};
use nalgebra::{Matrix2, Matrix2x6, Matrix6, Matrix6x2, Point2, Vector2, Vector6};

/// Kalman filter tracking a fixed number of 2-D points
#[derive(Debug, Clone)]
pub struct PointTracker {
    num_objects: usize,
    config: EstimatorConfig,
    // State transition
    transition: Matrix6<f64>,
    // Jerk input
    control: Vector6<f64>,
    // Jerk-driven process covariance
    process_noise: Matrix6<f64>,
    // Measurement covariance
    measurement_noise: Matrix2<f64>,
    // Position readout
    observation: Matrix2x6<f64>,
    states: Vec<Vector6<f64>>,
    covariance: Matrix6<f64>,
    gain: Option<Matrix6x2<f64>>,
    history: Vec<Vec<Point2<f64>>>,
    initialized: bool,
}

impl PointTracker {
    /// Create a tracker for `num_objects` points
    ///
    /// # Errors
    ///
    /// Returns an error if `num_objects` is zero or the noise model is invalid
    pub fn new(num_objects: usize, config: EstimatorConfig) -> Result<Self> {
        if num_objects == 0 {
            return Err(Error::InvalidInput("Tracker needs at least one object".to_string()));
        }
        config.validate()?;

        let mut tracker = Self {
            num_objects,
            config,
            transition: Matrix6::identity(),
            control: Vector6::zeros(),
            process_noise: Matrix6::zeros(),
            measurement_noise: Matrix2::zeros(),
            observation: Matrix2x6::new(
                1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
            ),
            states: vec![Vector6::zeros(); num_objects],
            covariance: Matrix6::zeros(),
            gain: None,
            history: Vec::new(),
            initialized: false,
        };
        tracker.build_model();
        tracker.covariance = tracker.process_noise;
        Ok(tracker)
    }

    fn build_model(&mut self) {
        let dt = self.config.sampling_interval;

        let mut transition = Matrix6::identity();
        // position, velocity and acceleration response to one interval of unit jerk
        let response = [dt.powi(3) / 6.0, dt.powi(2) / 2.0, dt];

        let mut process_noise = Matrix6::zeros();
        let mut control = Vector6::zeros();
        for axis in 0..2 {
            let pos = axis;
            let vel = 2 + axis;
            let acc = 4 + axis;
            transition[(pos, vel)] = dt;
            transition[(pos, acc)] = dt * dt / 2.0;
            transition[(vel, acc)] = dt;
            for d1 in 0..3 {
                for d2 in 0..3 {
                    process_noise[(2 * d1 + axis, 2 * d2 + axis)] = response[d1] * response[d2];
                }
                control[2 * d1 + axis] = response[d1];
            }
        }

        self.transition = transition;
        self.control = control;
        self.process_noise = process_noise * self.config.jerk_std.powi(2);
        self.measurement_noise = Matrix2::new(
            self.config.measurement_noise_x, 0.0,
            0.0, self.config.measurement_noise_y,
        );
    }

    /// Number of tracked objects
    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    /// Active noise model
    #[must_use]
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Current state vector of every object
    #[must_use]
    pub fn states(&self) -> &[Vector6<f64>] {
        &self.states
    }

    /// Shared error covariance
    #[must_use]
    pub fn covariance(&self) -> &Matrix6<f64> {
        &self.covariance
    }

    /// Position estimates recorded after every seed/update, oldest first
    #[must_use]
    pub fn history(&self) -> &[Vec<Point2<f64>>] {
        &self.history
    }

    /// Whether the tracker has been seeded
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn check_shape(&self, actual: usize) -> Result<()> {
        if actual == self.num_objects {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                expected: self.num_objects,
                actual,
            })
        }
    }

    fn positions(&self) -> Vec<Point2<f64>> {
        self.states.iter().map(|s| Point2::new(s[0], s[1])).collect()
    }

    /// Place every object at a known position with zero velocity and acceleration
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the number of points differs from the object count
    pub fn seed(&mut self, points: &[Point2<f64>]) -> Result<()> {
        self.check_shape(points.len())?;
        for (state, p) in self.states.iter_mut().zip(points) {
            *state = Vector6::new(p.x, p.y, 0.0, 0.0, 0.0, 0.0);
        }
        self.history.push(self.positions());
        self.initialized = true;
        Ok(())
    }

    /// Advance one step and return the predicted position of every object.
    ///
    /// Returns `None` before the tracker is seeded, and when the innovation
    /// covariance cannot be inverted; the next `update` then keeps the
    /// prediction and ignores its measurement.
    pub fn predict(&mut self) -> Option<Vec<Point2<f64>>> {
        if !self.initialized {
            return None;
        }
        let input = self.control * self.config.jerk_mean;
        for state in &mut self.states {
            *state = self.transition * *state + input;
        }
        self.covariance =
            self.transition * self.covariance * self.transition.transpose() + self.process_noise;

        let innovation_cov =
            self.observation * self.covariance * self.observation.transpose() + self.measurement_noise;
        let inverse = innovation_cov
            .try_inverse()
            .filter(|inv| self.covariance.iter().all(|v| v.is_finite()) && inv.iter().all(|v| v.is_finite()));

        match inverse {
            Some(inv) => {
                self.gain = Some(self.covariance * self.observation.transpose() * inv);
                Some(self.positions())
            }
            None => {
                warn!("Innovation covariance is singular; estimate undefined for this step");
                self.gain = None;
                None
            }
        }
    }

    /// Fuse one measurement per object into the state.
    ///
    /// The first call seeds the tracker. A measurement following an undefined
    /// prediction is dropped and the prediction is kept.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the number of points differs from the object count
    pub fn update(&mut self, points: &[Point2<f64>]) -> Result<()> {
        self.check_shape(points.len())?;
        if !self.initialized {
            return self.seed(points);
        }

        match self.gain.take() {
            Some(gain) => {
                for (state, p) in self.states.iter_mut().zip(points) {
                    let innovation = Vector2::new(p.x, p.y) - self.observation * *state;
                    *state += gain * innovation;
                }
                let covariance = (Matrix6::identity() - gain * self.observation) * self.covariance;
                self.covariance = (covariance + covariance.transpose()) * 0.5;
            }
            None => debug!("No gain available; holding the predicted state"),
        }
        self.history.push(self.positions());
        Ok(())
    }

    /// Fuse a flat `[x0, y0, x1, y1, ...]` measurement
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` unless exactly two values per object are supplied
    pub fn update_flat(&mut self, coords: &[f64]) -> Result<()> {
        if coords.len() != 2 * self.num_objects {
            return Err(Error::ShapeMismatch {
                expected: 2 * self.num_objects,
                actual: coords.len(),
            });
        }
        let points: Vec<Point2<f64>> = coords.chunks_exact(2).map(|c| Point2::new(c[0], c[1])).collect();
        self.update(&points)
    }

    /// Replace the noise model for subsequent steps; recorded history is kept
    ///
    /// # Errors
    ///
    /// Returns an error if the new noise model is invalid
    pub fn reconfigure(&mut self, config: EstimatorConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.build_model();
        Ok(())
    }

    /// Forget state, covariance and history
    pub fn reset(&mut self) {
        self.states.iter_mut().for_each(|s| *s = Vector6::zeros());
        self.covariance = self.process_noise;
        self.gain = None;
        self.history.clear();
        self.initialized = false;
    }
}

/// Kalman filter for a single heading angle.
///
/// Readings are unwrapped before they reach the position component of a 2-D
/// filter whose second axis is pinned at zero with no measurement noise.
#[derive(Debug, Clone)]
pub struct AngleTracker {
    tracker: PointTracker,
    unwrapper: Unwrapper,
    last_value: Option<f64>,
    record: Vec<f64>,
}

impl AngleTracker {
    /// Create an angle tracker; the y measurement noise is forced to zero
    ///
    /// # Errors
    ///
    /// Returns an error if the noise model is invalid
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        let config = EstimatorConfig {
            measurement_noise_y: 0.0,
            ..config
        };
        Ok(Self {
            tracker: PointTracker::new(1, config)?,
            unwrapper: Unwrapper::new(),
            last_value: None,
            record: Vec::new(),
        })
    }

    /// Store one reading; `None` or a non-finite value repeats the last known value.
    ///
    /// A missing reading before anything is known is skipped.
    ///
    /// # Errors
    ///
    /// Propagates tracker failures
    pub fn store(&mut self, reading: Option<f64>) -> Result<()> {
        let value = match reading.filter(|r| r.is_finite()) {
            Some(r) => self.unwrapper.push(r),
            None => match self.last_value {
                Some(v) => v,
                None => return Ok(()),
            },
        };
        self.last_value = Some(value);
        self.record.push(value);
        self.tracker.update(&[Point2::new(value, 0.0)])
    }

    /// Predict the next heading, wrapped into (-π, π]
    pub fn predict(&mut self) -> Option<f64> {
        self.predict_unwrapped().map(wrap_angle)
    }

    /// Predict the next heading on the continuous (unwrapped) scale
    pub fn predict_unwrapped(&mut self) -> Option<f64> {
        self.tracker.predict().map(|points| points[0].x)
    }

    /// Current posterior heading on the continuous scale
    #[must_use]
    pub fn estimate_unwrapped(&self) -> Option<f64> {
        self.tracker.is_initialized().then(|| self.tracker.states()[0][0])
    }

    /// Feed a series through store then predict and return the prediction per sample.
    ///
    /// Values are on the continuous scale; `None` marks a step whose prediction
    /// was undefined. The tracker is reset first.
    ///
    /// # Errors
    ///
    /// Propagates tracker failures
    pub fn smooth_unwrapped(&mut self, readings: &[f64]) -> Result<Vec<Option<f64>>> {
        self.reset();
        let mut out = Vec::with_capacity(readings.len());
        for &reading in readings {
            self.store(Some(reading))?;
            out.push(self.predict_unwrapped());
        }
        Ok(out)
    }

    /// Like [`Self::smooth_unwrapped`] but wrapped into (-π, π]
    ///
    /// # Errors
    ///
    /// Propagates tracker failures
    pub fn smooth(&mut self, readings: &[f64]) -> Result<Vec<Option<f64>>> {
        Ok(self
            .smooth_unwrapped(readings)?
            .into_iter()
            .map(|v| v.map(wrap_angle))
            .collect())
    }

    /// Unwrapped values fed to the filter so far
    #[must_use]
    pub fn record(&self) -> &[f64] {
        &self.record
    }

    /// Signed revolution count
    #[must_use]
    pub fn revolutions(&self) -> i64 {
        self.unwrapper.revolutions()
    }

    /// Underlying point tracker
    #[must_use]
    pub fn tracker(&self) -> &PointTracker {
        &self.tracker
    }

    /// Replace the noise model; the y measurement noise stays at zero
    ///
    /// # Errors
    ///
    /// Returns an error if the new noise model is invalid
    pub fn reconfigure(&mut self, config: EstimatorConfig) -> Result<()> {
        self.tracker.reconfigure(EstimatorConfig {
            measurement_noise_y: 0.0,
            ..config
        })
    }

    /// Forget all state and history
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.unwrapper.reset();
        self.last_value = None;
        self.record.clear();
    }
}

/// Conditioner that smooths a continuous heading with an [`AngleTracker`].
///
/// Sample `i` takes the prediction made after sample `i - 1`; the first
/// sample passes through and undefined steps hold the previous output.
pub struct KalmanSmoother {
    config: EstimatorConfig,
}

impl KalmanSmoother {
    /// Create a Kalman conditioner from a noise model
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }
}

impl Default for KalmanSmoother {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl SeriesFilter for KalmanSmoother {
    fn filter(&self, series: &[f64]) -> Result<Vec<f64>> {
        let Some(&first) = series.first() else {
            return Ok(Vec::new());
        };
        let mut tracker = AngleTracker::new(self.config)?;
        let predictions = tracker.smooth_unwrapped(series)?;

        let mut out = Vec::with_capacity(series.len());
        out.push(first);
        for prediction in &predictions[..predictions.len() - 1] {
            let held = out.last().copied().unwrap_or(first);
            out.push(prediction.unwrap_or(held));
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "KalmanSmoother"
    }
}
