//! Benchmarks for saccade segmentation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use heading_saccades::bout::Trace;
use heading_saccades::config::{DetectionMethod, SegmenterConfig};
use heading_saccades::peaks::{find_peaks, PeakOptions};
use heading_saccades::segmenter::BoutSegmenter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const FPS: f64 = 60.0;

/// Noisy heading with a 400 deg/s, 0.2 s turn every two seconds
fn trial(seconds: usize) -> Trace {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 5.0).unwrap();
    let frames = seconds * FPS as usize;
    let mut heading = Vec::with_capacity(frames);
    let mut current = 0.0_f64;
    for i in 0..frames {
        let turning = i % 120 >= 60 && i % 120 < 72;
        let velocity: f64 = noise.sample(&mut rng) + if turning { 400.0 } else { 0.0 };
        current += velocity.to_radians() / FPS;
        heading.push(current);
    }
    Trace::new(heading, FPS).unwrap()
}

fn benchmark_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");

    for seconds in [4, 60] {
        let trace = trial(seconds);
        for method in [DetectionMethod::ThresholdRun, DetectionMethod::PeakFinder] {
            let segmenter = BoutSegmenter::new(SegmenterConfig {
                method,
                ..SegmenterConfig::default()
            })
            .unwrap();
            group.bench_with_input(BenchmarkId::new(method.to_string(), seconds), &trace, |b, trace| {
                b.iter(|| black_box(segmenter.segment(black_box(trace)).unwrap()));
            });
        }
    }

    group.finish();
}

fn benchmark_interpolated_peak(c: &mut Criterion) {
    let mut group = c.benchmark_group("peak_refinement");
    let trace = trial(4);

    for points in [100, 1000] {
        let segmenter = BoutSegmenter::new(SegmenterConfig {
            interpolation_points: points,
            ..SegmenterConfig::default()
        })
        .unwrap();
        group.bench_with_input(BenchmarkId::new("grid_points", points), &trace, |b, trace| {
            b.iter(|| black_box(segmenter.detect(black_box(trace)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_find_peaks(c: &mut Criterion) {
    let trace = trial(60);
    let speed: Vec<f64> = trace.velocity().iter().map(|v| v.abs()).collect();
    let options = PeakOptions {
        distance: Some(0.125 * FPS),
        prominence: Some((1.0, 30.0)),
        width: Some(3.0),
        wlen: Some(0.5 * FPS),
        ..PeakOptions::default()
    };

    c.bench_function("find_peaks_3600", |b| {
        b.iter(|| black_box(find_peaks(black_box(&speed), &options)));
    });
}

criterion_group!(
    benches,
    benchmark_segmentation,
    benchmark_interpolated_peak,
    benchmark_find_peaks
);
criterion_main!(benches);
