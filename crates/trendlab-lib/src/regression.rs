use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Curve families that can be fitted by least squares after a log transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionModel {
    Linear,
    Logarithmic,
    Exponential,
    Power,
}

impl RegressionModel {
    pub const ALL: [RegressionModel; 4] = [
        RegressionModel::Linear,
        RegressionModel::Logarithmic,
        RegressionModel::Exponential,
        RegressionModel::Power,
    ];

    /// Map a raw pair into the space where the model is a straight line.
    pub fn linearize(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            RegressionModel::Linear => (x, y),
            RegressionModel::Logarithmic => (x.ln(), y),
            RegressionModel::Exponential => (x, y.ln()),
            RegressionModel::Power => (x.ln(), y.ln()),
        }
    }

    /// Turn a straight-line fit in linearized space into `(a, b)` of the model equation.
    fn coefficients(self, slope: f64, intercept: f64) -> (f64, f64) {
        match self {
            RegressionModel::Linear | RegressionModel::Logarithmic => (intercept, slope),
            RegressionModel::Exponential | RegressionModel::Power => (intercept.exp(), slope),
        }
    }

    fn evaluate(self, a: f64, b: f64, x: f64) -> f64 {
        match self {
            RegressionModel::Linear => b * x + a,
            RegressionModel::Logarithmic => a + b * x.ln(),
            RegressionModel::Exponential => a * (b * x).exp(),
            RegressionModel::Power => a * x.powf(b),
        }
    }

    fn equation(self, a: f64, b: f64) -> String {
        let (a, b) = (fixed4(a), fixed4(b));
        match self {
            RegressionModel::Linear => format!("y={b}x+{a}"),
            RegressionModel::Logarithmic => format!("y={a}+{b}ln(x)"),
            RegressionModel::Exponential => format!("y={a}e^({b}x)"),
            RegressionModel::Power => format!("y={a}x^{b}"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RegressionModel::Linear => "linear",
            RegressionModel::Logarithmic => "logarithmic",
            RegressionModel::Exponential => "exponential",
            RegressionModel::Power => "power",
        }
    }
}

impl fmt::Display for RegressionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown regression model `{0}` (expected linear, logarithmic, exponential or power)")]
pub struct ParseModelError(String);

impl FromStr for RegressionModel {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegressionModel::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseModelError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitError {
    /// Fewer than two finite pairs survived linearization, or the surviving
    /// pairs all share one linearized x (zero variance), so no line is
    /// determined. In the second case `valid` can be any count.
    #[error(
        "not enough valid points to fit a curve ({valid} usable, {excluded} excluded; \
         at least two distinct x values are needed)"
    )]
    InsufficientData { valid: usize, excluded: usize },
}

/// A fitted curve. Coefficients follow the model's back-transformed equation:
/// `a` is the intercept term (exponentiated for exponential/power models) and
/// `b` the slope or exponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub model: RegressionModel,
    pub a: f64,
    pub b: f64,
    /// Straight-line fit in linearized space.
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub equation_text: String,
    /// Pairs used by the fit.
    pub valid: usize,
    /// Pairs dropped because a linearized value was not finite.
    pub excluded: usize,
}

impl RegressionResult {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.model.evaluate(self.a, self.b, x)
    }

    /// Owned closure over the fitted coefficients.
    pub fn evaluator(&self) -> impl Fn(f64) -> f64 + Send + Sync + 'static {
        let (model, a, b) = (self.model, self.a, self.b);
        move |x| model.evaluate(a, b, x)
    }

    /// `steps + 1` evenly spaced points across `[x_min, x_max]` for a trend overlay.
    /// Points where the curve is undefined (e.g. `ln` of a non-positive x) are skipped.
    pub fn sample_curve(&self, x_min: f64, x_max: f64, steps: usize) -> Vec<[f64; 2]> {
        let steps = steps.max(1);
        let dx = (x_max - x_min) / steps as f64;
        (0..=steps)
            .map(|i| x_min + dx * i as f64)
            .filter_map(|x| {
                let y = self.evaluate(x);
                y.is_finite().then_some([x, y])
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Sums {
    n: usize,
    x: f64,
    y: f64,
    xy: f64,
    xx: f64,
    yy: f64,
}

impl Sums {
    fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        self.x += x;
        self.y += y;
        self.xy += x * y;
        self.xx += x * x;
        self.yy += y * y;
    }
}

/// Ordinary least squares on the model's linearized pairs.
///
/// Pairs whose linearized x or y is NaN or infinite are skipped; the number
/// skipped is reported in [`RegressionResult::excluded`].
pub fn fit(x: &[f64], y: &[f64], model: RegressionModel) -> Result<RegressionResult, FitError> {
    let total = x.len().min(y.len());
    let mut sums = Sums::default();
    for (&xi, &yi) in x.iter().zip(y) {
        let (lx, ly) = model.linearize(xi, yi);
        if lx.is_finite() && ly.is_finite() {
            sums.push(lx, ly);
        }
    }
    let excluded = total - sums.n;
    if excluded > 0 {
        debug!("{model} fit: {excluded} of {total} points excluded");
    }
    let insufficient = FitError::InsufficientData {
        valid: sums.n,
        excluded,
    };
    if sums.n < 2 {
        return Err(insufficient);
    }

    let n = sums.n as f64;
    let sxy = n * sums.xy - sums.x * sums.y;
    let sxx = n * sums.xx - sums.x * sums.x;
    let syy = n * sums.yy - sums.y * sums.y;
    let slope = sxy / sxx;
    if sxx == 0.0 || !slope.is_finite() {
        warn!("{model} fit: x values do not vary, no curve determined");
        return Err(insufficient);
    }
    let intercept = (sums.y - slope * sums.x) / n;

    let mut denom = (sxx * syy).sqrt();
    if denom == 0.0 || denom.is_nan() {
        denom = 1.0;
    }
    let r_squared = (sxy / denom).powi(2);

    let (a, b) = model.coefficients(slope, intercept);
    Ok(RegressionResult {
        model,
        a,
        b,
        slope,
        intercept,
        r_squared,
        equation_text: model.equation(a, b),
        valid: sums.n,
        excluded,
    })
}

fn fixed4(v: f64) -> String {
    // normalise -0.0 so it prints as 0.0000
    format!("{:.4}", v + 0.0)
}
