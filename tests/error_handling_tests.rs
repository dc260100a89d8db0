//! Error handling tests for all modules

use heading_saccades::{
    bout::{Measurement, Trace},
    config::{EstimatorConfig, SegmenterConfig},
    filters::{create_filter, kalman::AngleTracker, kalman_fit::KalmanFitter},
    interpolate::MonotoneCubic,
    saccade::{Saccade, TimeRef},
    segmenter::BoutSegmenter,
    utils::safe_cast::{position_to_index_clamp, seconds_to_samples},
    Error,
};

#[test]
fn test_filter_creation_errors() {
    // Unknown filter type
    let result = create_filter("invalid_filter", 60.0);
    assert!(matches!(result, Err(Error::FilterError(_))));

    // Even median window
    match create_filter("median:4", 60.0) {
        Err(Error::FilterError(msg)) => assert!(msg.contains("odd")),
        _ => panic!("Expected FilterError"),
    }

    // Missing and malformed parameters
    assert!(create_filter("lowpass", 60.0).is_err());
    assert!(create_filter("bandpass:1", 60.0).is_err());
    assert!(create_filter("lowpass:abc", 60.0).is_err());
    assert!(create_filter("lowpass:5:6", 60.0).is_err());

    // Cutoff at Nyquist
    assert!(create_filter("lowpass:30", 60.0).is_err());

    // Kalman needs a usable sample rate
    assert!(create_filter("kalman", 0.0).is_err());
    assert!(create_filter("kalman", 60.0).is_ok());
}

#[test]
fn test_trace_construction_errors() {
    assert!(matches!(Trace::new(Vec::new(), 60.0), Err(Error::InvalidInput(_))));
    assert!(Trace::new(vec![0.0; 10], f64::NAN).is_err());
    assert!(Trace::new(vec![0.0, f64::INFINITY], 60.0).is_err());
    assert!(Trace::with_timestamps(vec![0.0, 1.0, 0.5], vec![0.0; 3], 60.0).is_err());
    assert!(Trace::with_timestamps(vec![0.0, 1.0], vec![0.0; 3], 60.0).is_err());

    // No known value at all
    let blank = [Measurement::new(0.0, None), Measurement::new(0.1, Some(f64::NAN))];
    assert!(Trace::from_measurements(&blank, None).is_err());

    // Framerate cannot be derived from a single sample
    assert!(Trace::from_measurements(&[Measurement::new(0.0, Some(1.0))], None).is_err());
    assert!(Trace::from_measurements(&[Measurement::new(0.0, Some(1.0))], Some(60.0)).is_ok());
}

#[test]
fn test_missing_measurements_are_filled() {
    let measurements = [
        Measurement::new(0.0, None),
        Measurement::new(0.1, Some(0.5)),
        Measurement::new(0.2, None),
        Measurement::new(0.3, Some(0.7)),
    ];
    let trace = Trace::from_measurements(&measurements, None).unwrap();
    assert_eq!(trace.heading(), &[0.5, 0.5, 0.5, 0.7]);
    assert!((trace.framerate() - 10.0).abs() < 1e-9);
}

#[test]
fn test_saccade_window_errors() {
    let trace = Trace::new(vec![0.0; 20], 60.0).unwrap();
    let velocity = trace.velocity();
    let config = SegmenterConfig::default();

    assert!(Saccade::new(&trace, &velocity, 10, 5, &config).is_err());
    assert!(Saccade::new(&trace, &velocity, 5, 20, &config).is_err());
    assert!(Saccade::new(&trace, &velocity[..10], 2, 5, &config).is_err());

    // Too little history is not an error, only invalid
    let saccade = Saccade::new(&trace, &velocity, 1, 5, &config).unwrap();
    assert!(!saccade.valid);
    assert!(saccade.baseline.is_none());
}

#[test]
fn test_segmenter_configuration_errors() {
    let config = SegmenterConfig {
        threshold_speed: -1.0,
        ..SegmenterConfig::default()
    };
    assert!(matches!(BoutSegmenter::new(config), Err(Error::ConfigError(_))));

    // The conditioner is checked against the trace framerate at segmentation time
    let mut config = SegmenterConfig::default();
    config.method = heading_saccades::config::DetectionMethod::PeakFinder;
    config.conditioner.high = 40.0;
    let segmenter = BoutSegmenter::new(config).unwrap();
    let trace = Trace::new(vec![0.0; 120], 60.0).unwrap();
    assert!(segmenter.segment(&trace).is_err());
}

#[test]
fn test_estimator_errors() {
    let invalid = EstimatorConfig {
        jerk_std: -1.0,
        ..EstimatorConfig::default()
    };
    assert!(AngleTracker::new(invalid).is_err());

    assert!(KalmanFitter::new(&[0.0, 1.0], EstimatorConfig::default()).is_err());
    assert!(KalmanFitter::new(&[0.0, f64::NAN, 1.0], EstimatorConfig::default()).is_err());
}

#[test]
fn test_interpolation_errors() {
    assert!(MonotoneCubic::new(&[0.0], &[1.0]).is_err());
    assert!(MonotoneCubic::new(&[0.0, 1.0], &[1.0]).is_err());
    assert!(MonotoneCubic::new(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
}

#[test]
fn test_time_reference_parsing_errors() {
    assert!("start+0.1".parse::<TimeRef>().is_ok());
    assert!("0.25".parse::<TimeRef>().is_ok());
    assert!("middle".parse::<TimeRef>().is_err());
    assert!("stop+".parse::<TimeRef>().is_err());
}

#[test]
fn test_safe_cast_errors() {
    assert_eq!(position_to_index_clamp(-1.0, 10), 0);
    assert_eq!(position_to_index_clamp(f64::NAN, 10), 0);
    assert_eq!(position_to_index_clamp(10.0, 10), 9);
    assert_eq!(position_to_index_clamp(3.0, 10), 3);
    assert_eq!(position_to_index_clamp(3.0, 0), 0);
    assert!(seconds_to_samples(-0.5, 60.0).is_err());
    assert_eq!(seconds_to_samples(0.5, 60.0).unwrap(), 30);
}
