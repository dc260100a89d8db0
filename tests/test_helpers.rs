//! Helper functions and utilities for tests

#![allow(dead_code)]

use heading_saccades::bout::Trace;
use heading_saccades::utils::angles::wrap_angle;
use heading_saccades::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Framerate of the synthetic trials
pub const FPS: f64 = 60.0;

/// Frames in a synthetic trial
pub const FRAMES: usize = 240;

/// Frames `[SACCADE_START, SACCADE_END)` carry the injected turn
pub const SACCADE_START: usize = 100;
pub const SACCADE_END: usize = 112;

/// Injected turn speed in degrees per second
pub const SACCADE_SPEED: f64 = 400.0;

/// Wrapped heading built by integrating a velocity profile in degrees per second
pub fn integrate_velocity(velocity_deg: &[f64], framerate: f64, initial: f64) -> Vec<f64> {
    let mut heading = Vec::with_capacity(velocity_deg.len());
    let mut current = initial;
    for (i, v) in velocity_deg.iter().enumerate() {
        if i > 0 {
            current += v.to_radians() / framerate;
        }
        heading.push(wrap_angle(current));
    }
    heading
}

/// Gaussian velocity noise (deg/s) with an optional constant turn injected
pub fn noisy_velocity(seed: u64, frames: usize, turn: Option<(usize, usize, f64)>) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 5.0).unwrap();
    (0..frames)
        .map(|i| {
            let extra = match turn {
                Some((start, end, speed)) if (start..end).contains(&i) => speed,
                _ => 0.0,
            };
            noise.sample(&mut rng) + extra
        })
        .collect()
}

/// One 400 deg/s saccade on frames 100..112 of a 4 s trial, starting near +π
/// so the heading crosses the wrap seam during the turn.
pub fn synthetic_trace(seed: u64) -> Result<Trace> {
    let velocity = noisy_velocity(seed, FRAMES, Some((SACCADE_START, SACCADE_END, SACCADE_SPEED)));
    Trace::new(integrate_velocity(&velocity, FPS, 3.0), FPS)
}

/// Noise-only trial
pub fn quiet_trace(seed: u64) -> Result<Trace> {
    let velocity = noisy_velocity(seed, FRAMES, None);
    Trace::new(integrate_velocity(&velocity, FPS, 3.0), FPS)
}

/// Assert a value sits within a relative tolerance of the expected one
pub fn assert_close_rel(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        ((actual - expected) / expected).abs() <= tolerance,
        "{actual} is not within {:.1}% of {expected}",
        tolerance * 100.0
    );
}
