use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("x has {x} samples but y has {y}")]
    LengthMismatch { x: usize, y: usize },
}

/// Ordered numeric samples paired with their abscissa.
///
/// Indices are stable within one pipeline run; every operation in this crate
/// takes a `Series` by reference and returns fresh data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Series {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, SeriesError> {
        if x.len() != y.len() {
            return Err(SeriesError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Bare samples; the abscissa is the sample index.
    pub fn from_y(y: Vec<f64>) -> Self {
        let x = (0..y.len()).map(|i| i as f64).collect();
        Self { x, y }
    }

    /// Callers guarantee equal lengths (e.g. a filter output over `x`).
    pub(crate) fn from_parts(x: Vec<f64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Same abscissa, new ordinate (e.g. a smoothed copy).
    pub fn with_y(&self, y: Vec<f64>) -> Result<Self, SeriesError> {
        Self::new(self.x.clone(), y)
    }

    /// `(min, max)` of y, skipping NaN.
    pub fn range(&self) -> Option<(f64, f64)> {
        value_range(&self.y)
    }

    /// Keep the samples whose x lies inside the inclusive window. Either bound may be open.
    pub fn clip_x(&self, start: Option<f64>, end: Option<f64>) -> Self {
        if start.is_none() && end.is_none() {
            return self.clone();
        }
        let lo = start.unwrap_or(f64::NEG_INFINITY);
        let hi = end.unwrap_or(f64::INFINITY);
        let (x, y) = self.points().filter(|(x, _)| *x >= lo && *x <= hi).unzip();
        Self { x, y }
    }
}

pub(crate) fn value_range(data: &[f64]) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
