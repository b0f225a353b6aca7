//! Smoothing, peak detection, display decimation and curve fitting for
//! tabular measurement series.

pub mod decimate;
pub mod io;
pub mod peaks;
pub mod pipeline;
pub mod plot;
pub mod regression;
pub mod series;
pub mod smoothing;

pub use decimate::{decimate, DecimationResult, DisplayBudget};
pub use peaks::{detect_peaks, Peak, PeakSummary};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineResult};
pub use regression::{fit, FitError, RegressionModel, RegressionResult};
pub use series::{Series, SeriesError};
pub use smoothing::{smooth, SmoothingMethod, SmoothingSpec};
