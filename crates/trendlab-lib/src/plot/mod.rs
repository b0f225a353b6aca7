use crate::pipeline::{PipelineResult, TrendOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub size: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlotSeries {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl PlotSeries {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            PlotSeries::Line(line) => &line.points,
            PlotSeries::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    /// Trendline caption such as `y=2.0000x+3.0000  R²=0.9981`.
    pub note: Option<String>,
    pub series: Vec<PlotSeries>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis::default(),
            y: Axis::default(),
            note: None,
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: PlotSeries) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every finite point, if any.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.points().iter())
            .filter(|p| p[0].is_finite() && p[1].is_finite())
            .fold(None, |acc, p| match acc {
                None => Some((p[0], p[0], p[1], p[1])),
                Some((x0, x1, y0, y1)) => {
                    Some((x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])))
                }
            })
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

const TRACE_COLOR: u32 = 0x1F77B4;
const PEAK_COLOR: u32 = 0xFF0000;
const TREND_COLOR: u32 = 0x555555;
const TREND_STEPS: usize = 200;

/// Lay out one pipeline pass: the display trace, peak markers and the trendline.
pub fn figure_from_pipeline(title: &str, result: &PipelineResult) -> Figure {
    let mut fig = Figure::new(Some(title.to_string()));
    fig.add_series(PlotSeries::Line(LineSeries {
        name: title.into(),
        points: result.trace.points(),
        style: Style {
            width: 1.4,
            dash: None,
            color: Color(TRACE_COLOR),
        },
    }));

    if !result.peaks.is_empty() {
        fig.add_series(PlotSeries::Markers(MarkerSeries {
            name: format!("{} Peaks", title),
            points: result.peaks.iter().map(|p| [p.x, p.y]).collect(),
            size: 6,
            color: Color(PEAK_COLOR),
        }));
    }

    if let Some(TrendOutcome::Fitted(fit)) = &result.trend {
        let (x_min, x_max) = finite_extent(&result.trace.x);
        if x_min < x_max {
            fig.add_series(PlotSeries::Line(LineSeries {
                name: format!("{} fit", fit.model),
                points: fit.sample_curve(x_min, x_max, TREND_STEPS),
                style: Style {
                    width: 1.0,
                    dash: Some([6.0, 4.0]),
                    color: Color(TREND_COLOR),
                },
            }));
        }
        fig.note = Some(format!("{}  R²={:.4}", fit.equation_text, fit.r_squared));
    }
    fig
}

fn finite_extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}
