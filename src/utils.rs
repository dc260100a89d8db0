//! Numeric helpers shared by the filters, the segmenter and the bout statistics.

pub mod angles;
pub mod safe_cast;

use serde::Serialize;

/// Central-difference gradient with one-sided differences at both ends.
///
/// The output has the same length as the input and is expressed per sample;
/// multiply by the framerate for a per-second rate.
#[must_use]
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let mut out = Vec::with_capacity(n);
            out.push(values[1] - values[0]);
            for i in 1..n - 1 {
                out.push((values[i + 1] - values[i - 1]) / 2.0);
            }
            out.push(values[n - 1] - values[n - 2]);
            out
        }
    }
}

/// Backward first difference with a leading zero, so index `i` holds `x[i] - x[i-1]`.
#[must_use]
pub fn first_difference(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(0.0);
    out.extend(values.windows(2).map(|w| w[1] - w[0]));
    out
}

/// Index of the element with the largest magnitude. Ties keep the first index.
#[must_use]
pub fn argmax_abs(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        let magnitude = v.abs();
        if magnitude.is_nan() {
            continue;
        }
        match best {
            Some((_, m)) if magnitude <= m => {}
            _ => best = Some((i, magnitude)),
        }
    }
    best.map(|(i, _)| i)
}

/// Mean and population standard deviation of a slice.
#[must_use]
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    Statistics::from_slice(values).map(|s| (s.mean, s.std_dev))
}

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

impl Statistics {
    /// Summarise a slice, or `None` when it is empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_slice(data: &[f64]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}
