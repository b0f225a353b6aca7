use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    #[default]
    MovingAverage,
    SavitzkyGolay,
}

/// Smoothing parameters for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSpec {
    pub method: SmoothingMethod,
    /// Window length in samples; 0 and 1 disable smoothing.
    pub window_size: usize,
    /// Only read by Savitzky–Golay. Orders 2 and 3 use the quadratic kernel,
    /// anything else degrades to a truncated-window mean.
    pub polynomial_order: usize,
}

impl Default for SmoothingSpec {
    fn default() -> Self {
        Self {
            method: SmoothingMethod::MovingAverage,
            window_size: 0,
            polynomial_order: 2,
        }
    }
}

impl SmoothingSpec {
    pub fn moving_average(window_size: usize) -> Self {
        Self {
            method: SmoothingMethod::MovingAverage,
            window_size,
            ..Self::default()
        }
    }

    pub fn savitzky_golay(window_size: usize, polynomial_order: usize) -> Self {
        Self {
            method: SmoothingMethod::SavitzkyGolay,
            window_size,
            polynomial_order,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.window_size <= 1
    }
}

/// Smooth `data` according to `spec`. The output always has the input's length.
pub fn smooth(data: &[f64], spec: &SmoothingSpec) -> Vec<f64> {
    if spec.is_identity() || data.len() < spec.window_size {
        debug!(
            "smoothing pass-through (window {}, {} samples)",
            spec.window_size,
            data.len()
        );
        return data.to_vec();
    }
    match spec.method {
        SmoothingMethod::MovingAverage => moving_average(data, spec.window_size),
        SmoothingMethod::SavitzkyGolay => {
            let window = odd_window(spec.window_size);
            if window <= spec.polynomial_order.saturating_add(2) {
                debug!(
                    "savitzky-golay window {} too small for order {}, leaving data as is",
                    window, spec.polynomial_order
                );
                return data.to_vec();
            }
            savitzky_golay(data, window, spec.polynomial_order)
        }
    }
}

/// Centered moving average with windows truncated at the edges.
///
/// Prefix sums keep this linear in `data.len()` for any window.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || data.len() < window {
        return data.to_vec();
    }
    centered_mean(data, window / 2)
}

/// Quadratic/cubic Savitzky–Golay smoothing with truncated boundary windows.
///
/// Even windows are widened by one. Orders other than 2 and 3 fall back to a
/// plain truncated-window mean over the same span.
///
/// The kernel is `3·base − 15j²`, so each output only needs the window's zeroth
/// and second moments about its centre. Those are slid along the series and
/// rebuilt from scratch once per window length; the cost is linear in
/// `data.len()` for any window. Series holding NaN or infinities
/// take the direct weighted sum instead, since a running sum cannot drop them.
pub fn savitzky_golay(data: &[f64], window: usize, order: usize) -> Vec<f64> {
    let window = odd_window(window);
    let half = (window - 1) / 2;
    if order != 2 && order != 3 {
        debug!("savitzky-golay order {order} unsupported, using window mean");
        return centered_mean(data, half);
    }
    if data.iter().all(|v| v.is_finite()) {
        sliding_quadratic(data, half)
    } else {
        direct_quadratic(data, half)
    }
}

/// `3m² + 3m − 1`; the kernel is `w_j = 3·(base − 5j²)` for `j` in `-m..=m`.
fn kernel_base(half: usize) -> f64 {
    let m = half as f64;
    3.0 * m * m + 3.0 * m - 1.0
}

fn sliding_quadratic(data: &[f64], half: usize) -> Vec<f64> {
    let n = data.len();
    let base = kernel_base(half);
    let refresh = 2 * half + 1;
    let mut out = Vec::with_capacity(n);
    // Moments of the current window about centre i: Σy, Σd·y, Σd²·y.
    let (mut s0, mut s1, mut s2) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        if i % refresh == 0 {
            (s0, s1, s2) = moments(data, start, end, i);
        } else {
            // Re-centre the previous window on i (d → d − 1) ...
            s2 += s0 - 2.0 * s1;
            s1 -= s0;
            // ... then drop the sample that fell off the left and take the new one.
            if start > 0 {
                let d = -(half as f64) - 1.0;
                let v = data[start - 1];
                s0 -= v;
                s1 -= d * v;
                s2 -= d * d * v;
            }
            if i + half < n {
                let d = half as f64;
                let v = data[i + half];
                s0 += v;
                s1 += d * v;
                s2 += d * d * v;
            }
        }
        let count = (end - start) as f64;
        let den = base * count - 5.0 * squares_between(start, end, i);
        let num = base * s0 - 5.0 * s2;
        out.push(if den == 0.0 { data[i] } else { num / den });
    }
    out
}

fn moments(data: &[f64], start: usize, end: usize, centre: usize) -> (f64, f64, f64) {
    data[start..end]
        .iter()
        .enumerate()
        .fold((0.0, 0.0, 0.0), |(s0, s1, s2), (k, &v)| {
            let d = (start + k) as f64 - centre as f64;
            (s0 + v, s1 + d * v, s2 + d * d * v)
        })
}

/// `Σ (k − centre)²` for `k` in `start..end`, with `start <= centre < end`.
fn squares_between(start: usize, end: usize, centre: usize) -> f64 {
    let tri = |m: usize| {
        let m = m as f64;
        m * (m + 1.0) * (2.0 * m + 1.0) / 6.0
    };
    tri(centre - start) + tri(end - 1 - centre)
}

fn direct_quadratic(data: &[f64], half: usize) -> Vec<f64> {
    let weights = quadratic_weights(half);
    let n = data.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let mut num = 0.0;
        let mut den = 0.0;
        for (k, &sample) in data[start..end].iter().enumerate() {
            // weights[half] is the centre tap
            let w = weights[start + k + half - i];
            num += w * sample;
            den += w;
        }
        out.push(if den == 0.0 { data[i] } else { num / den });
    }
    out
}

/// `w_j = 3·(3m² + 3m − 1 − 5j²)` for `j` in `-m..=m`.
fn quadratic_weights(half: usize) -> Vec<f64> {
    let base = kernel_base(half);
    let m = half as i64;
    (-m..=m)
        .map(|j| 3.0 * (base - 5.0 * (j * j) as f64))
        .collect()
}

fn centered_mean(data: &[f64], half: usize) -> Vec<f64> {
    let n = data.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &sample in data {
        acc += sample;
        prefix.push(acc);
    }
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            (prefix[end] - prefix[start]) / (end - start) as f64
        })
        .collect()
}

fn odd_window(window: usize) -> usize {
    if window % 2 == 0 {
        window + 1
    } else {
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_all_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() <= tol,
                "sample {} differs: {} vs {}",
                i,
                a,
                e
            );
        }
    }

    #[test]
    fn small_windows_pass_through() {
        let data = vec![3.0, -1.0, 4.0, 1.0, 5.0];
        for window in [0, 1] {
            assert_eq!(smooth(&data, &SmoothingSpec::moving_average(window)), data);
            assert_eq!(smooth(&data, &SmoothingSpec::savitzky_golay(window, 2)), data);
        }
    }

    #[test]
    fn window_longer_than_series_passes_through() {
        let data = vec![1.0, 9.0, 1.0];
        assert_eq!(smooth(&data, &SmoothingSpec::moving_average(5)), data);
        assert_eq!(smooth(&data, &SmoothingSpec::savitzky_golay(5, 2)), data);
        assert_eq!(smooth(&data, &SmoothingSpec::savitzky_golay(4, 3)), data);
    }

    #[test]
    fn huge_order_leaves_data_untouched() {
        let data = vec![1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0, 7.0, 6.0, 0.0];
        let spec = SmoothingSpec::savitzky_golay(5, usize::MAX);
        assert_eq!(smooth(&data, &spec), data);
        assert_eq!(
            smooth(&data, &SmoothingSpec::savitzky_golay(9, usize::MAX - 1)),
            data
        );
    }

    #[test]
    fn moving_average_truncates_edges() {
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_all_close(&out, &[1.5, 2.0, 3.0, 4.0, 4.5], 1e-12);
    }

    #[test]
    fn constant_series_is_preserved() {
        let data = vec![5.0; 5];
        for window in 0..=5 {
            for spec in [
                SmoothingSpec::moving_average(window),
                SmoothingSpec::savitzky_golay(window, 2),
                SmoothingSpec::savitzky_golay(window, 3),
                SmoothingSpec::savitzky_golay(window, 5),
            ] {
                assert_all_close(&smooth(&data, &spec), &data, 1e-12);
            }
        }
    }

    #[test]
    fn output_length_matches_input() {
        let data: Vec<f64> = (0..97).map(|i| (i as f64 * 0.3).sin()).collect();
        for window in [2, 3, 8, 21, 97] {
            assert_eq!(smooth(&data, &SmoothingSpec::moving_average(window)).len(), 97);
            assert_eq!(
                smooth(&data, &SmoothingSpec::savitzky_golay(window, 2)).len(),
                97
            );
        }
    }

    #[test]
    fn savitzky_golay_keeps_a_parabola() {
        // A quadratic kernel reproduces a quadratic exactly away from the edges.
        let data: Vec<f64> = (0..20).map(|i| (i as f64).powi(2)).collect();
        let out = savitzky_golay(&data, 5, 2);
        for i in 2..18 {
            assert!((out[i] - data[i]).abs() < 1e-9, "index {}", i);
        }
    }

    #[test]
    fn savitzky_golay_reweights_truncated_edges() {
        // m = 2 kernel is [-9, 36, 51, 36, -9]; at the edges only the taps
        // that land on samples count, numerator and denominator alike.
        let data = [1.0, 4.0, 2.0, 8.0, 5.0, 7.0, 3.0];
        let out = savitzky_golay(&data, 5, 2);
        let first = (51.0 * 1.0 + 36.0 * 4.0 - 9.0 * 2.0) / 78.0;
        let second = (36.0 * 1.0 + 51.0 * 4.0 + 36.0 * 2.0 - 9.0 * 8.0) / 114.0;
        let middle = (-9.0 * 1.0 + 36.0 * 4.0 + 51.0 * 2.0 + 36.0 * 8.0 - 9.0 * 5.0) / 105.0;
        let last = (-9.0 * 5.0 + 36.0 * 7.0 + 51.0 * 3.0) / 78.0;
        assert!((out[0] - first).abs() < 1e-12, "{} vs {}", out[0], first);
        assert!((out[1] - second).abs() < 1e-12, "{} vs {}", out[1], second);
        assert!((out[2] - middle).abs() < 1e-12, "{} vs {}", out[2], middle);
        assert!((out[6] - last).abs() < 1e-12, "{} vs {}", out[6], last);
    }

    #[test]
    fn sliding_moments_match_direct_weighting() {
        let data: Vec<f64> = (0..3_000)
            .map(|i| (i as f64 * 0.013).sin() * 40.0 + ((i * 7919) % 23) as f64 - 11.0 + 1e4)
            .collect();
        for half in [1, 2, 5, 25, 400, 1_499] {
            let fast = sliding_quadratic(&data, half);
            let slow = direct_quadratic(&data, half);
            for (i, (a, b)) in fast.iter().zip(&slow).enumerate() {
                assert!(
                    (a - b).abs() <= 1e-8 * b.abs().max(1.0),
                    "half {half}, sample {i}: {a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn non_finite_samples_only_touch_their_neighbourhood() {
        let mut data: Vec<f64> = (0..40).map(|i| (i % 6) as f64).collect();
        data[20] = f64::NAN;
        let out = savitzky_golay(&data, 5, 2);
        assert!(out[18..=22].iter().all(|v| v.is_nan()));
        assert!(out[..18].iter().chain(&out[23..]).all(|v| v.is_finite()));
        let clean: Vec<f64> = (0..40).map(|i| (i % 6) as f64).collect();
        assert_all_close(&out[..18], &savitzky_golay(&clean, 5, 2)[..18], 1e-12);
    }

    #[test]
    fn savitzky_golay_even_window_is_widened() {
        let data: Vec<f64> = (0..30).map(|i| ((i * 7) % 5) as f64).collect();
        assert_eq!(savitzky_golay(&data, 6, 2), savitzky_golay(&data, 7, 2));
    }

    #[test]
    fn unsupported_order_falls_back_to_mean() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let out = savitzky_golay(&data, 3, 4);
        assert_all_close(&out, &[1.5, 2.0, 3.0, 4.0, 4.5], 1e-12);
    }

    #[test]
    fn savitzky_golay_skipped_when_window_too_small_for_order() {
        let data = vec![0.0, 4.0, 0.0, 4.0, 0.0, 4.0];
        // window 3 with order 2 is not wider than order + 2
        assert_eq!(smooth(&data, &SmoothingSpec::savitzky_golay(3, 2)), data);
        assert_ne!(smooth(&data, &SmoothingSpec::savitzky_golay(5, 2)), data);
    }

    #[test]
    fn smoothing_is_repeatable() {
        let data: Vec<f64> = (0..200).map(|i| (i as f64 * 0.17).cos() * 3.0).collect();
        let spec = SmoothingSpec::savitzky_golay(11, 3);
        assert_eq!(smooth(&data, &spec), smooth(&data, &spec));
    }
}
