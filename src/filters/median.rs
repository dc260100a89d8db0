use super::SeriesFilter;
use crate::Result;

/// Centred median filter over a whole series
///
/// The window shrinks symmetrically near both ends instead of padding, so an
/// unwrapped heading does not get pulled toward zero at the trial edges.
pub struct MedianFilter {
    window_size: usize,
}

impl MedianFilter {
    /// Create a new median filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero or even
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(
            window_size % 2 == 1,
            "Median filter window size must be odd, got {window_size}"
        );
        Self { window_size }
    }

    /// Window length in samples
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    fn calculate_median(values: &mut [f64]) -> f64 {
        values.sort_by(f64::total_cmp);

        let len = values.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (values[len / 2 - 1] + values[len / 2]) / 2.0
        } else {
            values[len / 2]
        }
    }
}

/// Median-smooth a series with a centred window of `window_size` samples
#[must_use]
pub fn median_smooth(series: &[f64], window_size: usize) -> Vec<f64> {
    let half = window_size / 2;
    let n = series.len();
    let mut scratch = Vec::with_capacity(window_size);
    (0..n)
        .map(|i| {
            let reach = half.min(i).min(n - 1 - i);
            scratch.clear();
            scratch.extend_from_slice(&series[i - reach..=i + reach]);
            MedianFilter::calculate_median(&mut scratch)
        })
        .collect()
}

impl SeriesFilter for MedianFilter {
    fn filter(&self, series: &[f64]) -> Result<Vec<f64>> {
        Ok(median_smooth(series, self.window_size))
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter() {
        let filter = MedianFilter::new(3);
        let out = filter.filter(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_eq!(out, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_median_with_outliers() {
        let out = median_smooth(&[10.0, 11.0, 100.0, 12.0, 13.0], 3);
        assert_eq!(out[2], 12.0);
        assert_eq!(out[1], 11.0);
    }

    #[test]
    fn test_edges_shrink_window() {
        let out = median_smooth(&[5.0, 1.0, 2.0, 3.0, 9.0], 5);
        assert_eq!(out[0], 5.0);
        assert_eq!(out[1], 2.0);
        assert_eq!(out[2], 3.0);
        assert_eq!(out[4], 9.0);
    }

    #[test]
    #[should_panic(expected = "Median filter window size must be odd")]
    fn test_even_window_panics() {
        let _ = MedianFilter::new(4);
    }
}
