//! Circular angle bookkeeping: seam-aware unwrapping and wrapping back into (-π, π].

use std::f64::consts::{PI, TAU};

/// Wrap an angle into the half-open interval (-π, π].
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    let r = angle.rem_euclid(TAU);
    if r > PI {
        r - TAU
    } else {
        r
    }
}

/// Unwrap a whole series so consecutive samples never differ by more than π.
///
/// Jumps larger than π are folded back by whole revolutions, so a series that
/// is already continuous comes back unchanged. Non-finite samples are copied
/// through and do not update the reference value.
#[must_use]
pub fn unwrap(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut correction = 0.0;
    let mut previous: Option<f64> = None;
    for &v in values {
        if !v.is_finite() {
            out.push(v);
            continue;
        }
        if let Some(prev) = previous {
            let delta = v - prev;
            let mut folded = (delta + PI).rem_euclid(TAU) - PI;
            if folded == -PI && delta > 0.0 {
                folded = PI;
            }
            if delta.abs() >= PI {
                correction += folded - delta;
            }
        }
        previous = Some(v);
        out.push(v + correction);
    }
    out
}

/// Replace missing samples by repeating the last known value.
///
/// Leading gaps take the first known value. Returns `None` when no sample is known.
#[must_use]
pub fn fill_missing(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().flatten().copied().find(|v| v.is_finite())?;
    let mut last = first;
    Some(
        values
            .iter()
            .map(|v| {
                if let Some(x) = v.filter(|x| x.is_finite()) {
                    last = x;
                }
                last
            })
            .collect(),
    )
}

/// Streaming unwrapper for wrapped readings in (-π, π].
///
/// Successive readings that differ by more than π are one crossing of the
/// -π/π seam; each crossing moves the revolution count by exactly one.
#[derive(Debug, Clone, Default)]
pub struct Unwrapper {
    last: Option<f64>,
    revolutions: i64,
}

impl Unwrapper {
    /// Create an unwrapper with no history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one wrapped reading and get its continuous value.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, reading: f64) -> f64 {
        let reading = wrap_angle(reading);
        if let Some(last) = self.last {
            let delta = reading - last;
            if delta > PI {
                self.revolutions -= 1;
            } else if delta < -PI {
                self.revolutions += 1;
            }
        }
        self.last = Some(reading);
        reading + TAU * self.revolutions as f64
    }

    /// Signed number of seam crossings seen so far
    #[must_use]
    pub fn revolutions(&self) -> i64 {
        self.revolutions
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.last = None;
        self.revolutions = 0;
    }
}
