//! Shape-preserving cubic interpolation for sub-frame peak refinement.
//!
//! Piecewise cubic Hermite interpolation with Fritsch–Carlson slopes: the
//! curve never overshoots the samples on either side of an interval, so an
//! abrupt velocity onset does not ring above its plateau.

use crate::{Error, Result};

/// Monotone piecewise cubic through a set of knots
#[derive(Debug, Clone)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    /// Fit the interpolant through `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the lengths differ, fewer than two knots are
    /// given, a value is not finite, or `xs` is not strictly increasing
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::InvalidInput(format!(
                "Interpolation knots and values differ in length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(Error::InvalidInput("Interpolation needs at least two knots".to_string()));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput("Interpolation input contains non-finite values".to_string()));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidInput("Interpolation knots must be strictly increasing".to_string()));
        }

        Ok(Self {
            slopes: knot_slopes(xs, ys),
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Evaluate at `x`; outside the knots the end cubic is extended
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let last = self.xs.len() - 2;
        let i = self.xs.partition_point(|&k| k <= x).saturating_sub(1).min(last);

        let h = self.xs[i + 1] - self.xs[i];
        let s = (x - self.xs[i]) / h;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * self.ys[i] + h10 * h * self.slopes[i] + h01 * self.ys[i + 1] + h11 * h * self.slopes[i + 1]
    }

    /// Evaluate at every point of `xs`
    #[must_use]
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

fn knot_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();
    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        // local extremum or flat neighbour
        if delta[k - 1] * delta[k] <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
    }
    slopes[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    slopes[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    slopes
}

fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if slope.signum() != d0.signum() || d0 == 0.0 {
        0.0
    } else if d0.signum() != d1.signum() && slope.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        slope
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}
