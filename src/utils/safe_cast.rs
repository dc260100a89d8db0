//! Safe conversions from fractional positions and durations to sample counts

use crate::{Error, Result};

/// Round and clamp a fractional sample position into `0..len`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn position_to_index_clamp(value: f64, len: usize) -> usize {
    if len == 0 || !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = (len - 1) as f64;
    value.round().min(max) as usize
}

/// Convert a duration in seconds to a whole number of samples, rounding up
///
/// # Errors
///
/// Returns an error if either argument is not finite and positive
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn seconds_to_samples(seconds: f64, framerate: f64) -> Result<usize> {
    let samples = seconds * framerate;
    if seconds.is_finite() && framerate.is_finite() && seconds > 0.0 && framerate > 0.0 {
        Ok(samples.ceil() as usize)
    } else {
        Err(Error::InvalidInput(format!(
            "Cannot convert {seconds} s at {framerate} Hz to samples"
        )))
    }
}
