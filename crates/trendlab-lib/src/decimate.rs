use crate::series::Series;
use log::debug;
use serde::{Deserialize, Serialize};

/// Display-ready trace; at most two points per bucket, in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecimationResult {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl DecimationResult {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.x.iter().zip(&self.y).map(|(&x, &y)| [x, y]).collect()
    }
}

/// When to decimate a trace and how far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayBudget {
    /// Series at or below this length are drawn at full resolution.
    pub threshold: usize,
    /// Bucket count used once the threshold is exceeded.
    pub target: usize,
}

impl Default for DisplayBudget {
    fn default() -> Self {
        Self {
            threshold: 100_000,
            target: 50_000,
        }
    }
}

/// Min/max bucket decimation of `(x, y)` down to `target` buckets.
///
/// Buckets are `floor(n / target)` samples wide; the last bucket also takes the
/// remainder so there are never more than `target` of them. Inputs that already
/// fit (or `target == 0`) are returned unchanged.
pub fn decimate(x: &[f64], y: &[f64], target: usize) -> DecimationResult {
    let n = x.len().min(y.len());
    if target == 0 || n <= target {
        return DecimationResult {
            x: x[..n].to_vec(),
            y: y[..n].to_vec(),
        };
    }

    let bucket = n / target;
    let mut out = DecimationResult {
        x: Vec::with_capacity(2 * target),
        y: Vec::with_capacity(2 * target),
    };
    for k in 0..target {
        let start = k * bucket;
        let end = if k + 1 == target { n } else { start + bucket };
        let Some((min_idx, max_idx)) = extrema(y, start, end) else {
            continue;
        };
        let (first, second) = if min_idx <= max_idx {
            (min_idx, max_idx)
        } else {
            (max_idx, min_idx)
        };
        out.x.push(x[first]);
        out.y.push(y[first]);
        if second != first {
            out.x.push(x[second]);
            out.y.push(y[second]);
        }
    }
    debug!("decimated {} samples to {} points", n, out.len());
    out
}

/// Decimate `series` only when it is longer than `budget.threshold`.
pub fn decimate_for_display(series: &Series, budget: &DisplayBudget) -> DecimationResult {
    if series.len() > budget.threshold {
        decimate(series.x(), series.y(), budget.target)
    } else {
        DecimationResult {
            x: series.x().to_vec(),
            y: series.y().to_vec(),
        }
    }
}

/// Indices of the first minimum and first maximum in `y[start..end]`, ignoring NaN.
fn extrema(y: &[f64], start: usize, end: usize) -> Option<(usize, usize)> {
    let mut found: Option<(usize, usize)> = None;
    for (j, &v) in y.iter().enumerate().take(end).skip(start) {
        if v.is_nan() {
            continue;
        }
        found = Some(match found {
            None => (j, j),
            Some((lo, hi)) => (
                if v < y[lo] { j } else { lo },
                if v > y[hi] { j } else { hi },
            ),
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_unchanged() {
        let x = [0.0, 1.0, 2.0];
        let y = [5.0, 1.0, 3.0];
        let out = decimate(&x, &y, 3);
        assert_eq!(out.x, x);
        assert_eq!(out.y, y);
        assert_eq!(decimate(&x, &y, 0).y, y);
    }

    #[test]
    fn keeps_global_extremes_of_a_million_points() {
        let n = 1_000_000;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut y: Vec<f64> = (0..n).map(|i| (i as f64 * 0.001).sin()).collect();
        y[123_457] = 42.0;
        y[876_543] = -17.0;
        let out = decimate(&x, &y, 10);
        assert!(out.len() <= 20);
        assert!(out.y.contains(&42.0));
        assert!(out.y.contains(&-17.0));
    }

    #[test]
    fn remainder_is_folded_into_last_bucket() {
        // 29 samples into 10 buckets would give 15 buckets of width 2 without folding
        let x: Vec<f64> = (0..29).map(|i| i as f64).collect();
        let mut y: Vec<f64> = (0..29).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        y[28] = 100.0;
        let out = decimate(&x, &y, 10);
        assert!(out.len() <= 20, "got {} points", out.len());
        assert_eq!(out.y.last(), Some(&100.0));
    }

    #[test]
    fn preserves_source_order() {
        let x: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..1000).map(|i| ((i * 37) % 101) as f64).collect();
        let out = decimate(&x, &y, 50);
        assert!(out.x.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn max_before_min_is_emitted_first() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [9.0, 0.0, 5.0, 5.0];
        let out = decimate(&x, &y, 2);
        assert_eq!(out.y, vec![9.0, 0.0, 5.0]);
    }

    #[test]
    fn display_budget_only_applies_above_threshold() {
        let series = Series::from_y((0..50).map(|i| i as f64).collect());
        let budget = DisplayBudget {
            threshold: 100,
            target: 10,
        };
        assert_eq!(decimate_for_display(&series, &budget).len(), 50);
        let tight = DisplayBudget {
            threshold: 20,
            target: 10,
        };
        assert!(decimate_for_display(&series, &tight).len() <= 20);
    }
}
