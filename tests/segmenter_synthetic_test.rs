//! End-to-end segmentation of synthetic trials with a known saccade

mod test_helpers;

use heading_saccades::bout::Trace;
use heading_saccades::config::{DetectionMethod, SegmenterConfig};
use heading_saccades::saccade::{SaccadeQuery, TimeRef, TurnDirection};
use heading_saccades::segmenter::BoutSegmenter;
use proptest::prelude::*;
use test_helpers::*;

fn segmenter(method: DetectionMethod) -> BoutSegmenter {
    BoutSegmenter::new(SegmenterConfig {
        method,
        ..SegmenterConfig::default()
    })
    .unwrap()
}

#[test]
fn test_threshold_run_finds_injected_saccade() {
    let segmenter = segmenter(DetectionMethod::ThresholdRun);
    for seed in [1, 7, 42, 2024] {
        let trace = synthetic_trace(seed).unwrap();
        let bout = segmenter.segment(&trace).unwrap();

        assert_eq!(bout.saccades().len(), 1, "seed {seed}");
        let saccade = &bout.saccades()[0];
        assert!(saccade.valid);
        assert!((98..=102).contains(&saccade.start_index), "seed {seed}: start {}", saccade.start_index);
        assert!((110..=114).contains(&saccade.stop_index), "seed {seed}: stop {}", saccade.stop_index);
        assert_close_rel(saccade.peak_speed_deg(), SACCADE_SPEED, 0.05);
        assert_eq!(saccade.direction(), TurnDirection::Left);

        let amplitude = saccade.amplitude.to_degrees();
        assert!(amplitude > 65.0 && amplitude < 95.0, "seed {seed}: amplitude {amplitude}");
    }
}

#[test]
fn test_peak_finder_finds_injected_saccade() {
    let segmenter = segmenter(DetectionMethod::PeakFinder);
    for seed in [1, 7, 42, 2024] {
        let trace = synthetic_trace(seed).unwrap();
        let bout = segmenter.segment(&trace).unwrap();

        assert_eq!(bout.saccades().len(), 1, "seed {seed}");
        let saccade = &bout.saccades()[0];
        assert!(saccade.start_index.abs_diff(SACCADE_START) <= 4, "seed {seed}: start {}", saccade.start_index);
        assert!(saccade.stop_index.abs_diff(SACCADE_END) <= 4, "seed {seed}: stop {}", saccade.stop_index);
        assert_close_rel(saccade.peak_speed_deg(), SACCADE_SPEED, 0.05);
        assert!(saccade.amplitude > 0.0);
    }
}

#[test]
fn test_quiet_trial_has_no_saccades() {
    for method in [DetectionMethod::ThresholdRun, DetectionMethod::PeakFinder] {
        let segmenter = segmenter(method);
        let bout = segmenter.segment(&quiet_trace(3).unwrap()).unwrap();
        assert!(bout.saccades().is_empty(), "{method}");
        assert_eq!(bout.stats().saccade_count, 0);
        assert_eq!(bout.stats().saccade_frequency, 0.0);
        assert!(bout.stats().inter_saccade_interval.is_none());
        assert!(bout.leftward().iter().all(|&m| !m));
    }
}

#[test]
fn test_rightward_turn_is_mirrored() {
    let velocity: Vec<f64> = noisy_velocity(11, FRAMES, Some((SACCADE_START, SACCADE_END, -SACCADE_SPEED)));
    let trace = Trace::new(integrate_velocity(&velocity, FPS, -3.0), FPS).unwrap();
    let bout = segmenter(DetectionMethod::ThresholdRun).segment(&trace).unwrap();

    assert_eq!(bout.saccades().len(), 1);
    let saccade = &bout.saccades()[0];
    assert_eq!(saccade.direction(), TurnDirection::Right);
    assert!(saccade.amplitude < 0.0);

    let rightward = bout.rightward();
    assert!(rightward[saccade.start_index]);
    assert!(!rightward[saccade.stop_index]);
    assert!(bout.leftward().iter().all(|&m| !m));
}

#[test]
fn test_bout_statistics_for_single_saccade() {
    let trace = synthetic_trace(5).unwrap();
    let bout = segmenter(DetectionMethod::ThresholdRun).segment(&trace).unwrap();
    let stats = bout.stats();

    assert_eq!(stats.saccade_count, 1);
    assert!((stats.duration - (FRAMES - 1) as f64 / FPS).abs() < 1e-9);
    assert!((stats.saccade_frequency - 1.0 / stats.duration).abs() < 1e-9);
    assert!(stats.inter_saccade_intervals.is_empty());
    assert!(stats.total_angle.to_degrees() > 60.0);
    assert!(stats.saccade_peak_velocity.is_some());
}

#[test]
fn test_query_saccades_by_speed() {
    let trace = synthetic_trace(9).unwrap();
    let bout = segmenter(DetectionMethod::ThresholdRun).segment(&trace).unwrap();
    let query = SaccadeQuery {
        from: TimeRef::Start(-0.1),
        to: TimeRef::Stop(0.1),
        ..SaccadeQuery::default()
    };

    let fast = bout.query_saccades(300.0, 500.0, &query);
    assert_eq!(fast.len(), 1);
    assert_eq!(fast[0].times.len(), fast[0].values.len());
    assert!(fast[0].times[0] < 0.0);

    assert!(bout.query_saccades(500.0, 1000.0, &query).is_empty());
}

#[test]
fn test_kalman_smoothing_keeps_saccade() {
    let trace = synthetic_trace(13).unwrap();
    let smoothed = trace
        .kalman_smoothed(&heading_saccades::config::EstimatorConfig::default())
        .unwrap();
    assert_eq!(smoothed.len(), trace.len());
    assert_eq!(smoothed.timestamps(), trace.timestamps());

    let velocity = smoothed.velocity();
    let peak = velocity.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).to_degrees();
    assert!(peak > 200.0, "smoothed peak {peak}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_saccades_sorted_and_disjoint(
        velocity in prop::collection::vec(-800.0..800.0f64, 40..160),
        peak_finder in any::<bool>(),
    ) {
        let method = if peak_finder { DetectionMethod::PeakFinder } else { DetectionMethod::ThresholdRun };
        let trace = Trace::new(integrate_velocity(&velocity, FPS, 0.0), FPS).unwrap();
        let bout = segmenter(method).segment(&trace).unwrap();

        for saccade in bout.saccades() {
            prop_assert!(saccade.valid);
            prop_assert!(saccade.start_index < saccade.stop_index);
            prop_assert!(saccade.stop_index < trace.len());
        }
        for pair in bout.saccades().windows(2) {
            prop_assert!(pair[0].stop_index < pair[1].start_index);
        }
    }
}
