//! Saccade segmentation of a heading trace.
//!
//! A trace is conditioned, differentiated and scanned for candidate windows
//! by one of two strategies:
//!
//! - threshold-run: median smoothing, runs of speed above the threshold, then
//!   a peak-anchored expansion on re-baselined velocity;
//! - peak-finder: zero-phase Butterworth smoothing and peaks of the speed
//!   profile bounded at half prominence.
//!
//! Every surviving window becomes a [`Saccade`] built from the original
//! trace. Invalid saccades are dropped and overlaps resolved before the
//! result is wrapped in a [`Bout`].

use crate::bout::{Bout, Trace};
use crate::config::{DetectionMethod, SegmenterConfig};
use crate::constants::{MIN_SACCADE_FRAMES, REBASELINE_FAR, REBASELINE_NEAR};
use crate::filters::butterworth::ButterworthFilter;
use crate::filters::median::median_smooth;
use crate::filters::SeriesFilter;
use crate::peaks::{find_peaks, PeakOptions};
use crate::saccade::Saccade;
use crate::utils::safe_cast::{position_to_index_clamp, seconds_to_samples};
use crate::utils::{argmax_abs, first_difference, gradient};
use crate::Result;
use log::debug;
use std::collections::VecDeque;

/// Candidate `[start, stop]` frame window
pub type Window = (usize, usize);

/// Splits a trace into saccades according to a fixed configuration
#[derive(Debug, Clone)]
pub struct BoutSegmenter {
    config: SegmenterConfig,
}

impl BoutSegmenter {
    /// Create a segmenter
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a trace into a [`Bout`]
    ///
    /// # Errors
    ///
    /// Returns an error when the conditioner cannot be designed for the
    /// trace's framerate
    pub fn segment(&self, trace: &Trace) -> Result<Bout> {
        let saccades = self.detect(trace)?;
        Ok(Bout::new(trace.clone(), saccades))
    }

    /// Valid, non-overlapping saccades ordered by start index
    ///
    /// # Errors
    ///
    /// Returns an error when the conditioner cannot be designed for the
    /// trace's framerate
    pub fn detect(&self, trace: &Trace) -> Result<Vec<Saccade>> {
        let velocity = trace.velocity();
        let mut saccades = Vec::new();
        for (start, stop) in self.candidates(trace)? {
            let saccade = Saccade::new(trace, &velocity, start, stop, &self.config)?;
            if !saccade.valid {
                debug!(
                    "Rejected [{start}, {stop}]: peak {:.1} deg/s inside the baseline noise band",
                    saccade.peak_velocity.to_degrees()
                );
                continue;
            }
            if self.config.method == DetectionMethod::PeakFinder
                && saccade.peak_speed_deg() < self.config.threshold_speed
            {
                debug!(
                    "Rejected [{start}, {stop}]: peak {:.1} deg/s below threshold",
                    saccade.peak_speed_deg()
                );
                continue;
            }
            saccades.push(saccade);
        }
        Ok(resolve_overlaps(saccades))
    }

    /// Raw candidate windows for the configured strategy, in detection order
    ///
    /// # Errors
    ///
    /// Returns an error when the conditioner cannot be designed for the
    /// trace's framerate
    pub fn candidates(&self, trace: &Trace) -> Result<Vec<Window>> {
        let windows = match self.config.method {
            DetectionMethod::ThresholdRun => {
                threshold_run_candidates(trace.heading(), trace.framerate(), &self.config)
            }
            DetectionMethod::PeakFinder => {
                peak_finder_candidates(trace.heading(), trace.framerate(), &self.config)?
            }
        };
        debug!("{} candidate windows from {}", windows.len(), self.config.method);
        Ok(windows)
    }
}

/// Contiguous runs of `true`, as inclusive index pairs
fn runs(marked: &[bool]) -> Vec<Window> {
    let mut out = Vec::new();
    let mut open: Option<usize> = None;
    for (i, &m) in marked.iter().enumerate() {
        match (m, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                out.push((start, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        out.push((start, marked.len() - 1));
    }
    out
}

fn window_fits(start: usize, stop: usize, framerate: f64, config: &SegmenterConfig) -> bool {
    if stop - start < MIN_SACCADE_FRAMES {
        debug!("Rejected [{start}, {stop}]: shorter than {MIN_SACCADE_FRAMES} frames");
        return false;
    }
    #[allow(clippy::cast_precision_loss)]
    let duration = (stop - start) as f64 / framerate;
    if duration > config.max_duration {
        debug!("Rejected [{start}, {stop}]: {duration:.3} s exceeds {:.3} s", config.max_duration);
        return false;
    }
    true
}

/// Threshold-run candidates.
///
/// Runs of median-smoothed speed above the threshold that touch either end of
/// the trial are ignored. Each remaining run is re-baselined on the frames
/// `[start-10, start-5)`, anchored at its largest re-baselined velocity and
/// expanded both ways while the same-signed velocity stays above
/// `peak_fraction` of the peak. Bounds sit one frame outside the expansion.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn threshold_run_candidates(heading: &[f64], framerate: f64, config: &SegmenterConfig) -> Vec<Window> {
    let n = heading.len();
    if n < 3 {
        return Vec::new();
    }
    let smoothed = median_smooth(heading, config.median_window);
    let velocity: Vec<f64> = first_difference(&smoothed).into_iter().map(|v| v * framerate).collect();
    let threshold = config.threshold_speed_rad();
    let marked: Vec<bool> = velocity.iter().map(|v| v.abs() > threshold).collect();

    let mut windows = Vec::new();
    for (lo, hi) in runs(&marked) {
        if lo == 0 || hi == n - 1 {
            debug!("Rejected run [{lo}, {hi}]: touches the trial boundary");
            continue;
        }

        if lo < REBASELINE_FAR {
            debug!("Rejected run [{lo}, {hi}]: fewer than {REBASELINE_FAR} frames before onset");
            continue;
        }

        let baseline = if config.relative_start_velocity {
            let window = &velocity[lo - REBASELINE_FAR..lo - REBASELINE_NEAR];
            window.iter().sum::<f64>() / window.len() as f64
        } else {
            0.0
        };
        let relative: Vec<f64> = velocity.iter().map(|v| v - baseline).collect();

        let Some(offset) = argmax_abs(&relative[lo..=hi]) else {
            continue;
        };
        let peak = lo + offset;
        let direction = relative[peak].signum();
        let cutoff = relative[peak].abs() * config.peak_fraction;

        let mut left = peak;
        while left > 0 && relative[left - 1] * direction > cutoff {
            left -= 1;
        }
        let mut right = peak;
        while right + 1 < n && relative[right + 1] * direction > cutoff {
            right += 1;
        }

        let start = left.saturating_sub(1);
        let stop = right + 1;
        if stop >= n - 1 {
            debug!("Rejected [{start}, {stop}]: ends on the last frame");
            continue;
        }
        if window_fits(start, stop, framerate, config) {
            windows.push((start, stop));
        }
    }
    windows
}

/// Peak-finder candidates.
///
/// The heading is smoothed with the configured Butterworth conditioner; the
/// speed profile's peaks are bounded by their half-prominence crossings.
///
/// # Errors
///
/// Returns `FilterError` if the conditioner band does not fit the framerate,
/// or `InvalidInput` if the peak distance or window is not a positive duration
#[allow(clippy::cast_precision_loss)]
pub fn peak_finder_candidates(heading: &[f64], framerate: f64, config: &SegmenterConfig) -> Result<Vec<Window>> {
    let conditioner = &config.conditioner;
    let filter = ButterworthFilter::new(
        conditioner.order,
        conditioner.low,
        conditioner.high,
        framerate,
        conditioner.zero_phase,
    )?;
    let smoothed = filter.filter(heading)?;
    let speed: Vec<f64> = gradient(&smoothed).into_iter().map(|v| (v * framerate).abs()).collect();

    let finder = &config.peak_finder;
    let distance = seconds_to_samples(finder.distance, framerate)?;
    let wlen = seconds_to_samples(finder.window, framerate)?;
    let options = PeakOptions {
        distance: Some(distance as f64),
        prominence: Some(finder.prominence),
        width: Some(finder.width),
        wlen: Some(wlen as f64),
        ..PeakOptions::default()
    };

    let n = heading.len();
    Ok(find_peaks(&speed, &options)
        .into_iter()
        .map(|p| (position_to_index_clamp(p.left_ips, n), position_to_index_clamp(p.right_ips, n)))
        .filter(|&(start, stop)| window_fits(start, stop, framerate, config))
        .collect())
}

/// Collapse overlapping saccades, keeping the longest of each cluster.
///
/// Saccades are taken in order; each one gathers every remaining saccade whose
/// frame range intersects its own and the cluster is replaced by its longest
/// member, the earliest on ties. Passes repeat until nothing merges. The
/// result is sorted by start index and contains no overlapping pair.
#[must_use]
pub fn resolve_overlaps(saccades: Vec<Saccade>) -> Vec<Saccade> {
    let mut current = saccades;
    loop {
        let before = current.len();
        let mut working: VecDeque<Saccade> = current.into_iter().collect();
        let mut kept = Vec::with_capacity(before);

        while let Some(head) = working.pop_front() {
            let (cluster, rest): (VecDeque<Saccade>, VecDeque<Saccade>) =
                working.into_iter().partition(|s| s.overlaps(&head));
            working = rest;

            let mut best = head;
            if !cluster.is_empty() {
                debug!(
                    "Overlap cluster of {} at [{}, {}]",
                    cluster.len() + 1,
                    best.start_index,
                    best.stop_index
                );
            }
            for candidate in cluster {
                if candidate.frames() > best.frames() {
                    best = candidate;
                }
            }
            kept.push(best);
        }

        current = kept;
        if current.len() == before {
            break;
        }
    }
    current.sort_by_key(|s| s.start_index);
    current
}
