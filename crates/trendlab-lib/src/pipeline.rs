use crate::{
    decimate::{decimate_for_display, DecimationResult, DisplayBudget},
    peaks::{detect_peaks, summarize, Peak, PeakSummary},
    regression::{fit, RegressionModel, RegressionResult},
    series::Series,
    smoothing::{smooth, SmoothingSpec},
};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakConfig {
    /// Minimum prominence as a percentage of the smoothed series' y range.
    pub height_percent: f64,
}

/// Optional x window applied before anything else runs. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XRange {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Everything one rendering pass needs to know about a series.
///
/// The host keeps one of these per loaded series and passes it in on every
/// recompute; nothing here is cached between calls.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub smoothing: SmoothingSpec,
    pub peaks: Option<PeakConfig>,
    pub display: DisplayBudget,
    pub trendline: Option<RegressionModel>,
    pub x_range: Option<XRange>,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing pipeline config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendOutcome {
    Fitted(RegressionResult),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Samples left after the x window.
    pub sample_count: usize,
    pub trace: DecimationResult,
    pub peaks: Vec<Peak>,
    pub peak_summary: Option<PeakSummary>,
    pub trend: Option<TrendOutcome>,
}

/// One rendering pass: smooth, detect peaks at full resolution, decimate the
/// smoothed trace for display, and fit the trendline on the raw pairs.
pub fn run_pipeline(series: &Series, cfg: &PipelineConfig) -> PipelineResult {
    let series = match cfg.x_range {
        Some(range) => series.clip_x(range.start, range.end),
        None => series.clone(),
    };

    let smoothed_y = smooth(series.y(), &cfg.smoothing);
    let smoothed = Series::from_parts(series.x().to_vec(), smoothed_y);

    let peaks = match cfg.peaks {
        Some(p) => detect_peaks(&smoothed, p.height_percent),
        None => Vec::new(),
    };
    let peak_summary = cfg.peaks.map(|_| summarize(&peaks));

    let trace = decimate_for_display(&smoothed, &cfg.display);

    let trend = cfg.trendline.map(|model| match fit(series.x(), series.y(), model) {
        Ok(result) => TrendOutcome::Fitted(result),
        Err(err) => {
            debug!("trendline hidden: {err}");
            TrendOutcome::Failed {
                reason: err.to_string(),
            }
        }
    });

    PipelineResult {
        sample_count: series.len(),
        trace,
        peaks,
        peak_summary,
        trend,
    }
}
