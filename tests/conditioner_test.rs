//! Conditioner behaviour on realistic heading series

use heading_saccades::filters::butterworth::{BandKind, Butterworth, ButterworthFilter};
use heading_saccades::filters::median::{median_smooth, MedianFilter};
use heading_saccades::filters::{create_filter, SeriesFilter};
use std::f64::consts::PI;

const FS: f64 = 60.0;

fn sine(freq: f64, amplitude: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| amplitude * (2.0 * PI * freq * i as f64 / FS).sin()).collect()
}

#[test]
fn test_zero_phase_lowpass_recovers_slow_turn() {
    let slow = sine(0.5, 1.0, 240);
    let jitter = sine(20.0, 0.5, 240);
    let noisy: Vec<f64> = slow.iter().zip(&jitter).map(|(s, j)| s + j).collect();

    let filter = ButterworthFilter::new(5, 0.0, 5.0, FS, true).unwrap();
    let out = filter.filter(&noisy).unwrap();
    assert_eq!(out.len(), noisy.len());

    // Edges carry the transient; the interior must follow the slow component
    for i in 60..180 {
        assert!((out[i] - slow[i]).abs() < 0.1, "sample {i}: {} vs {}", out[i], slow[i]);
    }
}

#[test]
fn test_design_attenuates_above_cutoff() {
    let design = Butterworth::new(5, 0.0, 5.0, FS).unwrap();
    assert_eq!(design.kind(), BandKind::LowPass);
    assert!((design.magnitude_response(0.5) - 1.0).abs() < 1e-6);
    assert!((design.magnitude_response(5.0) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert!(design.magnitude_response(20.0) < 1e-3);
}

#[test]
fn test_bandpass_rejects_both_sides() {
    let design = Butterworth::new(3, 2.0, 8.0, FS).unwrap();
    assert_eq!(design.kind(), BandKind::BandPass);
    assert!(design.magnitude_response(4.0) > 0.9);
    assert!(design.magnitude_response(0.2) < 0.05);
    assert!(design.magnitude_response(25.0) < 0.05);
}

#[test]
fn test_bounds_at_or_above_nyquist_are_rejected() {
    assert!(Butterworth::new(5, 0.0, 30.0, FS).is_err());
    assert!(Butterworth::new(5, 31.0, f64::INFINITY, FS).is_err());
    assert!(Butterworth::new(5, 0.0, 5.0, 0.0).is_err());
    assert!(Butterworth::new(0, 0.0, 5.0, FS).is_err());
}

#[test]
fn test_median_removes_single_frame_glitches() {
    let mut heading = vec![0.2; 40];
    heading[10] = 3.0;
    heading[25] = -3.0;
    let out = MedianFilter::new(5).filter(&heading).unwrap();
    assert!(out.iter().all(|&v| (v - 0.2).abs() < 1e-12));
}

#[test]
fn test_median_keeps_edges_of_unwrapped_heading() {
    // A heading far from zero must not be pulled toward zero at the edges
    let heading: Vec<f64> = (0..20).map(|i| 12.0 + 0.01 * f64::from(i)).collect();
    let out = median_smooth(&heading, 5);
    assert_eq!(out[0], heading[0]);
    assert_eq!(out[19], heading[19]);
    assert_eq!(out[10], heading[10]);
}

#[test]
fn test_created_filters_preserve_length() {
    let series = sine(1.0, 0.3, 90);
    for spec in ["none", "median:7", "lowpass:8", "highpass:1", "bandpass:1:6", "zerophase:0:10", "kalman"] {
        let filter = create_filter(spec, FS).unwrap();
        let out = filter.filter(&series).unwrap();
        assert_eq!(out.len(), series.len(), "{}", filter.name());
        assert!(out.iter().all(|v| v.is_finite()), "{}", filter.name());
    }
}

#[test]
fn test_empty_series_passes_through() {
    for spec in ["none", "median", "lowpass:8", "kalman"] {
        let out = create_filter(spec, FS).unwrap().filter(&[]).unwrap();
        assert!(out.is_empty(), "{spec}");
    }
}
