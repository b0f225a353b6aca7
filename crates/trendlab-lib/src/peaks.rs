use crate::series::{value_range, Series};
use serde::{Deserialize, Serialize};

/// A strict local maximum that cleared the prominence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    /// `min(y - left_min, y - right_min)` where each minimum is taken up to the
    /// nearest strictly higher sample on that side (or the series edge).
    /// This is a local-baseline height, not classical topographic prominence.
    pub prominence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    pub count: usize,
    pub highest: Option<Peak>,
}

/// Detect peaks in `series.y()` reporting each peak's abscissa from `series.x()`.
///
/// `height_percent` is a percentage of the global y range and is clamped to `[0, 100]`.
pub fn detect_peaks(series: &Series, height_percent: f64) -> Vec<Peak> {
    let mut peaks = detect_peaks_in(series.y(), height_percent);
    for peak in &mut peaks {
        peak.x = series.x()[peak.index];
    }
    peaks
}

/// Peak detection over bare samples; `Peak::x` is the sample index.
pub fn detect_peaks_in(data: &[f64], height_percent: f64) -> Vec<Peak> {
    if data.len() < 3 {
        return Vec::new();
    }
    let Some((lo, hi)) = value_range(data) else {
        return Vec::new();
    };
    let threshold = height_percent.clamp(0.0, 100.0) / 100.0 * (hi - lo);
    if !threshold.is_finite() {
        return Vec::new();
    }

    let left = running_minima(data.iter().copied().enumerate(), data.len());
    let right = running_minima(data.iter().copied().enumerate().rev(), data.len());

    let mut peaks = Vec::new();
    for i in 1..data.len() - 1 {
        let y = data[i];
        if !(y > data[i - 1] && y > data[i + 1]) {
            continue;
        }
        let prominence = (y - left[i]).min(y - right[i]);
        if prominence >= threshold {
            peaks.push(Peak {
                index: i,
                x: i as f64,
                y,
                prominence,
            });
        }
    }
    peaks
}

pub fn summarize(peaks: &[Peak]) -> PeakSummary {
    let highest = peaks.iter().copied().fold(None, |best: Option<Peak>, p| match best {
        Some(b) if b.y >= p.y => Some(b),
        _ => Some(p),
    });
    PeakSummary {
        count: peaks.len(),
        highest,
    }
}

/// For every sample, the minimum seen while walking from it (inclusive) in the
/// iteration direction back towards the previous strictly higher sample.
///
/// A monotonic stack keeps the whole pass linear. NaN samples are transparent:
/// they neither stop the walk nor lower the minimum.
fn running_minima(samples: impl Iterator<Item = (usize, f64)>, len: usize) -> Vec<f64> {
    let mut minima = vec![f64::NAN; len];
    // (value, minimum over the span this entry absorbed)
    let mut stack: Vec<(f64, f64)> = Vec::new();
    for (i, y) in samples {
        if y.is_nan() {
            continue;
        }
        let mut span_min = y;
        while let Some(&(value, absorbed)) = stack.last() {
            if value > y {
                break;
            }
            span_min = span_min.min(absorbed);
            stack.pop();
        }
        minima[i] = span_min;
        stack.push((y, span_min));
    }
    minima
}
