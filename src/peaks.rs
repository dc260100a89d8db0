//! Local-maximum detection with distance, prominence and width constraints.
//!
//! Candidates are strict local maxima (flat tops report their midpoint).
//! Filters run in a fixed order: distance, then prominence, then width.
//! Widths are measured at a fraction of each peak's prominence with linear
//! interpolation between samples.

/// Constraints applied by [`find_peaks`]; `None` disables a filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakOptions {
    /// Minimum index distance between neighbouring peaks, rounded up
    pub distance: Option<f64>,
    /// Inclusive prominence range
    pub prominence: Option<(f64, f64)>,
    /// Minimum width in samples
    pub width: Option<f64>,
    /// Window, in samples, searched for each peak's bases
    pub wlen: Option<f64>,
    /// Relative height at which widths are measured
    pub rel_height: f64,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            distance: None,
            prominence: None,
            width: None,
            wlen: None,
            rel_height: 0.5,
        }
    }
}

/// One detected peak with its measured properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Sample index of the maximum
    pub index: usize,
    /// Value at the maximum
    pub height: f64,
    pub prominence: f64,
    pub left_base: usize,
    pub right_base: usize,
    /// Width at `rel_height` in samples
    pub width: f64,
    /// Level at which the width was measured
    pub width_height: f64,
    /// Interpolated left crossing position
    pub left_ips: f64,
    /// Interpolated right crossing position
    pub right_ips: f64,
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(peaks: &[usize], x: &[f64], distance: f64) -> Vec<usize> {
    let distance = distance.ceil();
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if ((peaks[j] - peaks[k]) as f64) >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if ((peaks[k] - peaks[j]) as f64) >= distance {
                break;
            }
            keep[k] = false;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Prominence and bases of one peak, searched within `wlen` samples
fn prominence(x: &[f64], peak: usize, wlen: Option<usize>) -> (f64, usize, usize) {
    let (mut lo, mut hi) = (0, x.len() - 1);
    if let Some(w) = wlen.filter(|&w| w >= 2) {
        lo = peak.saturating_sub(w / 2);
        hi = (peak + w / 2).min(hi);
    }

    let top = x[peak];
    let (mut left_base, mut left_min) = (peak, top);
    let mut i = peak;
    loop {
        if x[i] > top {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
        if i == lo {
            break;
        }
        i -= 1;
    }

    let (mut right_base, mut right_min) = (peak, top);
    for (offset, &v) in x[peak..=hi].iter().enumerate() {
        if v > top {
            break;
        }
        if v < right_min {
            right_min = v;
            right_base = peak + offset;
        }
    }

    (top - left_min.max(right_min), left_base, right_base)
}

fn measure(x: &[f64], index: usize, wlen: Option<usize>, rel_height: f64) -> Peak {
    let (prom, left_base, right_base) = prominence(x, index, wlen);
    let level = x[index] - prom * rel_height;

    let mut i = index;
    while left_base < i && level < x[i] {
        i -= 1;
    }
    let mut left_ips = i as f64;
    if x[i] < level {
        left_ips += (level - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = index;
    while i < right_base && level < x[i] {
        i += 1;
    }
    let mut right_ips = i as f64;
    if x[i] < level {
        right_ips -= (level - x[i]) / (x[i - 1] - x[i]);
    }

    Peak {
        index,
        height: x[index],
        prominence: prom,
        left_base,
        right_base,
        width: right_ips - left_ips,
        width_height: level,
        left_ips,
        right_ips,
    }
}

/// Find peaks in `x` that satisfy `options`, in ascending index order
#[must_use]
pub fn find_peaks(x: &[f64], options: &PeakOptions) -> Vec<Peak> {
    let mut indices = local_maxima(x);
    if let Some(distance) = options.distance {
        indices = select_by_distance(&indices, x, distance);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let wlen = options.wlen.filter(|w| *w > 1.0).map(|w| w.ceil() as usize);

    indices
        .into_iter()
        .map(|i| measure(x, i, wlen, options.rel_height))
        .filter(|p| {
            options
                .prominence
                .map_or(true, |(min, max)| p.prominence >= min && p.prominence <= max)
        })
        .filter(|p| options.width.map_or(true, |min| p.width >= min))
        .collect()
}
