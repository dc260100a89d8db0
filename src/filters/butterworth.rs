//! Butterworth filters in second-order sections, with a zero-phase variant.
//!
//! Design follows the classic analog-prototype route: poles of the order-N
//! Butterworth prototype are moved to the requested band (low-pass, high-pass
//! or band-pass) on pre-warped frequencies, mapped to the z-plane with the
//! bilinear transform and grouped into biquads.

use super::SeriesFilter;
use crate::{Error, Result};
use nalgebra::{Complex, ComplexField};
use std::f64::consts::PI;

type C64 = Complex<f64>;

/// Bilinear transform constant for a normalised sample rate of 2
const BILINEAR_K: f64 = 4.0;

/// Imaginary parts below this are treated as real roots
const ROOT_TOLERANCE: f64 = 1e-12;

/// Pass band selected from the frequency bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    /// `low == 0`, finite `high`
    LowPass,
    /// `low > 0`, infinite `high`
    HighPass,
    /// `0 < low < high < nyquist`
    BandPass,
}

/// One second-order section, normalised so `a[0] == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    /// Numerator coefficients
    pub b: [f64; 3],
    /// Denominator coefficients
    pub a: [f64; 3],
}

impl Biquad {
    fn from_roots(zeros: (C64, Option<C64>), poles: (C64, Option<C64>)) -> Self {
        Self {
            b: quadratic(zeros),
            a: quadratic(poles),
        }
    }

    fn response(&self, z: C64) -> C64 {
        let zi = z.inv();
        let num = C64::new(self.b[0], 0.0) + zi * self.b[1] + zi * zi * self.b[2];
        let den = C64::new(self.a[0], 0.0) + zi * self.a[1] + zi * zi * self.a[2];
        num / den
    }
}

fn quadratic((r1, r2): (C64, Option<C64>)) -> [f64; 3] {
    match r2 {
        Some(r2) => [1.0, -(r1 + r2).re, (r1 * r2).re],
        None => [1.0, -r1.re, 0.0],
    }
}

/// Butterworth filter designed for a fixed sample rate
#[derive(Debug, Clone)]
pub struct Butterworth {
    kind: BandKind,
    order: usize,
    sample_rate: f64,
    sections: Vec<Biquad>,
}

impl Butterworth {
    /// Design a filter of the given order.
    ///
    /// `low == 0` selects a low-pass at `high`, an infinite `high` selects a
    /// high-pass at `low`, and anything else a band-pass between them.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if `low < 0`, `high <= 0`, the order is zero, the
    /// sample rate is not positive, or a bound reaches the Nyquist frequency.
    pub fn new(order: usize, low: f64, high: f64, sample_rate: f64) -> Result<Self> {
        let kind = validate_band(order, low, high, sample_rate)?;

        let prototype = prototype_poles(order);
        let warp = |f: f64| BILINEAR_K * (PI * f / sample_rate).tan();
        let (zeros, poles, gain) = match kind {
            BandKind::LowPass => {
                let wo = warp(high);
                let poles: Vec<C64> = prototype.iter().map(|p| *p * wo).collect();
                (Vec::new(), poles, wo.powi(order_i32(order)))
            }
            BandKind::HighPass => {
                let wo = warp(low);
                let poles: Vec<C64> = prototype.iter().map(|p| C64::new(wo, 0.0) / *p).collect();
                let neg_product = prototype.iter().fold(C64::new(1.0, 0.0), |acc, p| acc * -*p);
                (vec![C64::new(0.0, 0.0); order], poles, neg_product.inv().re)
            }
            BandKind::BandPass => {
                let (w1, w2) = (warp(low), warp(high));
                let bw = w2 - w1;
                let wo2 = w1 * w2;
                let mut poles = Vec::with_capacity(2 * order);
                let scaled: Vec<C64> = prototype.iter().map(|p| *p * (bw / 2.0)).collect();
                for &p in &scaled {
                    poles.push(p + (p * p - wo2).sqrt());
                }
                for &p in &scaled {
                    poles.push(p - (p * p - wo2).sqrt());
                }
                (vec![C64::new(0.0, 0.0); order], poles, bw.powi(order_i32(order)))
            }
        };

        let (zeros, poles, gain) = bilinear(&zeros, &poles, gain);
        let sections = to_sections(&zeros, &poles, gain);

        Ok(Self {
            kind,
            order,
            sample_rate,
            sections,
        })
    }

    /// Band selected at design time
    #[must_use]
    pub fn kind(&self) -> BandKind {
        self.kind
    }

    /// Filter order
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Designed second-order sections
    #[must_use]
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Magnitude of the frequency response at `freq` Hz
    #[must_use]
    pub fn magnitude_response(&self, freq: f64) -> f64 {
        let theta = 2.0 * PI * freq / self.sample_rate;
        let z = C64::new(theta.cos(), theta.sin());
        self.sections
            .iter()
            .fold(C64::new(1.0, 0.0), |acc, s| acc * s.response(z))
            .modulus()
    }

    /// Causal pass. The first sample is removed before filtering and restored after.
    #[must_use]
    pub fn apply(&self, series: &[f64]) -> Vec<f64> {
        let Some(&offset) = series.first() else {
            return Vec::new();
        };
        let mut work: Vec<f64> = series.iter().map(|v| v - offset).collect();
        for section in &self.sections {
            run_section(section, &mut work);
        }
        for v in &mut work {
            *v += offset;
        }
        work
    }

    /// Average of the forward pass and the time-reversed pass, cancelling phase lag.
    #[must_use]
    pub fn apply_zero_phase(&self, series: &[f64]) -> Vec<f64> {
        let forward = self.apply(series);
        let reversed: Vec<f64> = series.iter().rev().copied().collect();
        let backward = self.apply(&reversed);
        forward
            .iter()
            .zip(backward.iter().rev())
            .map(|(f, b)| (f + b) / 2.0)
            .collect()
    }
}

/// Conditioner wrapping a designed Butterworth filter
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    design: Butterworth,
    zero_phase: bool,
}

impl ButterworthFilter {
    /// Create a conditioner; see [`Butterworth::new`] for the band rules.
    ///
    /// # Errors
    ///
    /// Propagates design validation failures
    pub fn new(order: usize, low: f64, high: f64, sample_rate: f64, zero_phase: bool) -> Result<Self> {
        Ok(Self {
            design: Butterworth::new(order, low, high, sample_rate)?,
            zero_phase,
        })
    }

    /// Underlying design
    #[must_use]
    pub fn design(&self) -> &Butterworth {
        &self.design
    }
}

impl SeriesFilter for ButterworthFilter {
    fn filter(&self, series: &[f64]) -> Result<Vec<f64>> {
        if self.zero_phase {
            Ok(self.design.apply_zero_phase(series))
        } else {
            Ok(self.design.apply(series))
        }
    }

    fn name(&self) -> &str {
        match (self.design.kind, self.zero_phase) {
            (_, true) => "ZeroPhaseButterworth",
            (BandKind::LowPass, false) => "LowPassButterworth",
            (BandKind::HighPass, false) => "HighPassButterworth",
            (BandKind::BandPass, false) => "BandPassButterworth",
        }
    }
}

/// Filter `series` between `low` and `high` Hz with an order-5 Butterworth.
///
/// # Errors
///
/// Returns `FilterError` for invalid bounds or sample rate
pub fn butterworth_filter(series: &[f64], low: f64, high: f64, sample_rate: f64) -> Result<Vec<f64>> {
    Ok(Butterworth::new(crate::constants::DEFAULT_BUTTERWORTH_ORDER, low, high, sample_rate)?.apply(series))
}

fn validate_band(order: usize, low: f64, high: f64, sample_rate: f64) -> Result<BandKind> {
    if order == 0 {
        return Err(Error::FilterError("Filter order must be at least 1".to_string()));
    }
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(Error::FilterError(format!("Sample rate must be positive, got {sample_rate}")));
    }
    if low.is_nan() || low < 0.0 {
        return Err(Error::FilterError(format!("Low frequency bound must be non-negative, got {low}")));
    }
    if high.is_nan() || high <= 0.0 {
        return Err(Error::FilterError(format!("High frequency bound must be positive, got {high}")));
    }
    let nyquist = sample_rate / 2.0;
    let kind = if low > 0.0 && high.is_finite() {
        BandKind::BandPass
    } else if high.is_infinite() {
        BandKind::HighPass
    } else {
        BandKind::LowPass
    };
    match kind {
        BandKind::LowPass if high >= nyquist => Err(Error::FilterError(format!(
            "Low-pass cutoff {high} Hz must be below Nyquist ({nyquist} Hz)"
        ))),
        BandKind::HighPass if low == 0.0 => Err(Error::FilterError(
            "No pass band selected: low is 0 and high is infinite".to_string(),
        )),
        BandKind::HighPass if low >= nyquist => Err(Error::FilterError(format!(
            "High-pass cutoff {low} Hz must be below Nyquist ({nyquist} Hz)"
        ))),
        BandKind::BandPass if low >= high || high >= nyquist => Err(Error::FilterError(format!(
            "Band {low}-{high} Hz must satisfy low < high < Nyquist ({nyquist} Hz)"
        ))),
        _ => Ok(kind),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn order_i32(order: usize) -> i32 {
    order.min(i32::MAX as usize) as i32
}

#[allow(clippy::cast_precision_loss)]
fn prototype_poles(order: usize) -> Vec<C64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0f64.mul_add(k as f64, 1.0 - n);
            let theta = PI * m / (2.0 * n);
            -C64::new(theta.cos(), theta.sin())
        })
        .collect()
}

fn bilinear(zeros: &[C64], poles: &[C64], gain: f64) -> (Vec<C64>, Vec<C64>, f64) {
    let k = C64::new(BILINEAR_K, 0.0);
    let mut z: Vec<C64> = zeros.iter().map(|&z| (k + z) / (k - z)).collect();
    let p: Vec<C64> = poles.iter().map(|&p| (k + p) / (k - p)).collect();
    z.extend(std::iter::repeat(C64::new(-1.0, 0.0)).take(poles.len().saturating_sub(zeros.len())));

    let num = zeros.iter().fold(C64::new(1.0, 0.0), |acc, &z| acc * (k - z));
    let den = poles.iter().fold(C64::new(1.0, 0.0), |acc, &p| acc * (k - p));
    (z, p, gain * (num / den).re)
}

/// Group conjugate pairs, then real roots; real roots pair first with last.
fn root_groups(roots: &[C64]) -> Vec<(C64, Option<C64>)> {
    let mut groups: Vec<(C64, Option<C64>)> = roots
        .iter()
        .filter(|r| r.im > ROOT_TOLERANCE)
        .map(|r| (*r, Some(r.conj())))
        .collect();

    let mut reals: Vec<f64> = roots.iter().filter(|r| r.im.abs() <= ROOT_TOLERANCE).map(|r| r.re).collect();
    reals.sort_by(f64::total_cmp);
    let (mut lo, mut hi) = (0usize, reals.len());
    while lo < hi {
        hi -= 1;
        if lo == hi {
            groups.push((C64::new(reals[lo], 0.0), None));
        } else {
            groups.push((C64::new(reals[lo], 0.0), Some(C64::new(reals[hi], 0.0))));
        }
        lo += 1;
    }
    groups
}

fn to_sections(zeros: &[C64], poles: &[C64], gain: f64) -> Vec<Biquad> {
    let zero_groups = root_groups(zeros);
    let mut pole_groups = root_groups(poles);
    // a lone real pole goes last so it lines up with the lone real zero
    pole_groups.sort_by_key(|(_, second)| second.is_none());

    let mut sections: Vec<Biquad> = pole_groups
        .into_iter()
        .enumerate()
        .map(|(i, poles)| {
            let zeros = zero_groups.get(i).copied().unwrap_or((C64::new(0.0, 0.0), None));
            Biquad::from_roots(zeros, poles)
        })
        .collect();

    if let Some(first) = sections.first_mut() {
        for b in &mut first.b {
            *b *= gain;
        }
    }
    sections
}

/// Transposed direct form II, zero initial state
fn run_section(section: &Biquad, data: &mut [f64]) {
    let [b0, b1, b2] = section.b;
    let [_, a1, a2] = section.a;
    let (mut z0, mut z1) = (0.0, 0.0);
    for x in data.iter_mut() {
        let input = *x;
        let y = b0.mul_add(input, z0);
        z0 = b1 * input - a1 * y + z1;
        z1 = b2 * input - a2 * y;
        *x = y;
    }
}
