use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use plotters::prelude::*;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};
use trendlab_lib::{
    decimate::decimate,
    io::{table as table_io, text as text_io},
    peaks::{detect_peaks, summarize, Peak, PeakSummary},
    pipeline::{run_pipeline, PeakConfig, PipelineConfig, XRange},
    plot::{figure_from_pipeline, Figure, PlotBackend, PlotSeries},
    regression::{fit, RegressionModel},
    series::Series,
    smoothing::{smooth, SmoothingMethod, SmoothingSpec},
};

#[derive(Parser)]
#[command(
    name = "trendlab",
    version,
    about = "Trendlab: smoothing, peaks, decimation and trendlines for measurement tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// Delimited table (with --y-col) or newline-delimited samples; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// Column used as abscissa; the row index when omitted
    #[arg(long)]
    x_col: Option<String>,
    /// Column holding the samples; switches input parsing to delimited-table mode
    #[arg(long)]
    y_col: Option<String>,
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// First row is data, columns are named "Column 1", "Column 2", ...
    #[arg(long)]
    no_header: bool,
    /// Treat unparsable cells as NaN instead of 0
    #[arg(long)]
    nan_cells: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    #[value(name = "moving-average")]
    MovingAverage,
    #[value(name = "savitzky-golay")]
    SavitzkyGolay,
}

#[derive(Args, Clone, Copy)]
struct SmoothingArgs {
    #[arg(long, default_value = "moving-average")]
    method: MethodArg,
    /// Window length in samples; 0 or 1 disables smoothing
    #[arg(long, default_value_t = 0)]
    window: usize,
    /// Savitzky–Golay polynomial order
    #[arg(long, default_value_t = 2)]
    order: usize,
}

impl From<MethodArg> for SmoothingMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::MovingAverage => SmoothingMethod::MovingAverage,
            MethodArg::SavitzkyGolay => SmoothingMethod::SavitzkyGolay,
        }
    }
}

impl SmoothingArgs {
    fn spec(&self) -> SmoothingSpec {
        SmoothingSpec {
            method: self.method.into(),
            window_size: self.window,
            polynomial_order: self.order,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Smooth a series and print the smoothed samples
    Smooth {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        smoothing: SmoothingArgs,
    },
    /// Detect prominent peaks (after optional smoothing)
    Peaks {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        smoothing: SmoothingArgs,
        /// Minimum prominence as a percentage of the y range
        #[arg(long, default_value_t = 0.0)]
        height_percent: f64,
    },
    /// Min/max bucket decimation for display
    Decimate {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 50_000)]
        target: usize,
    },
    /// Fit a trend curve to the raw (x, y) pairs
    Fit {
        #[command(flatten)]
        input: InputArgs,
        /// linear, logarithmic, exponential or power
        #[arg(long, default_value = "linear")]
        model: RegressionModel,
    },
    /// Run smoothing → peaks → decimation → trendline in one pass
    Pipeline {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        overrides: PipelineOverrides,
    },
    /// Render a pipeline pass to a PNG via plotters
    Plot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        overrides: PipelineOverrides,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },
}

/// Pipeline settings: a TOML file, then individual flags on top.
#[derive(Args, Clone)]
struct PipelineOverrides {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    method: Option<MethodArg>,
    #[arg(long)]
    window: Option<usize>,
    #[arg(long)]
    order: Option<usize>,
    #[arg(long)]
    height_percent: Option<f64>,
    #[arg(long)]
    trendline: Option<RegressionModel>,
    #[arg(long)]
    x_start: Option<f64>,
    #[arg(long)]
    x_end: Option<f64>,
}

impl PipelineOverrides {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(method) = self.method {
            cfg.smoothing.method = method.into();
        }
        if let Some(window) = self.window {
            cfg.smoothing.window_size = window;
        }
        if let Some(order) = self.order {
            cfg.smoothing.polynomial_order = order;
        }
        if let Some(height_percent) = self.height_percent {
            cfg.peaks = Some(PeakConfig { height_percent });
        }
        if let Some(model) = self.trendline {
            cfg.trendline = Some(model);
        }
        if self.x_start.is_some() || self.x_end.is_some() {
            cfg.x_range = Some(XRange {
                start: self.x_start,
                end: self.x_end,
            });
        }
        Ok(cfg)
    }
}

#[derive(Serialize)]
struct SmoothOutput {
    x: Vec<f64>,
    y: Vec<f64>,
}

#[derive(Serialize)]
struct PeaksOutput {
    peaks: Vec<Peak>,
    summary: PeakSummary,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Smooth { input, smoothing } => cmd_smooth(&input, &smoothing)?,
        Commands::Peaks {
            input,
            smoothing,
            height_percent,
        } => cmd_peaks(&input, &smoothing, height_percent)?,
        Commands::Decimate { input, target } => cmd_decimate(&input, target)?,
        Commands::Fit { input, model } => cmd_fit(&input, model)?,
        Commands::Pipeline { input, overrides } => cmd_pipeline(&input, &overrides)?,
        Commands::Plot {
            input,
            overrides,
            out,
            title,
        } => cmd_plot(&input, &overrides, &out, title.as_deref())?,
    }
    Ok(())
}

fn load_series(args: &InputArgs) -> Result<Series> {
    let series = match (&args.y_col, &args.input) {
        (Some(y_col), input) => {
            let delimiter = u8::try_from(args.delimiter)
                .context("delimiter must be a single-byte character")?;
            let table = match input {
                Some(path) => table_io::read_table(path, delimiter, !args.no_header)?,
                None => table_io::parse_table(io::stdin().lock(), delimiter, !args.no_header)?,
            };
            let policy = if args.nan_cells {
                table_io::NumericPolicy::Nan
            } else {
                table_io::NumericPolicy::ZeroFill
            };
            table.series(args.x_col.as_deref(), y_col, policy)?
        }
        (None, Some(path)) => text_io::read_series(path)?,
        (None, None) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_series(&buf)?
        }
    };
    info!("loaded {} samples", series.len());
    Ok(series)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_smooth(input: &InputArgs, smoothing: &SmoothingArgs) -> Result<()> {
    let series = load_series(input)?;
    let y = smooth(series.y(), &smoothing.spec());
    print_json(&SmoothOutput {
        x: series.x().to_vec(),
        y,
    })
}

fn cmd_peaks(input: &InputArgs, smoothing: &SmoothingArgs, height_percent: f64) -> Result<()> {
    let series = load_series(input)?;
    let smoothed = series.with_y(smooth(series.y(), &smoothing.spec()))?;
    let peaks = detect_peaks(&smoothed, height_percent);
    let summary = summarize(&peaks);
    print_json(&PeaksOutput { peaks, summary })
}

fn cmd_decimate(input: &InputArgs, target: usize) -> Result<()> {
    let series = load_series(input)?;
    print_json(&decimate(series.x(), series.y(), target))
}

fn cmd_fit(input: &InputArgs, model: RegressionModel) -> Result<()> {
    let series = load_series(input)?;
    let result = fit(series.x(), series.y(), model)?;
    if result.excluded > 0 {
        info!("{} points excluded from the {} fit", result.excluded, model);
    }
    print_json(&result)
}

fn cmd_pipeline(input: &InputArgs, overrides: &PipelineOverrides) -> Result<()> {
    let series = load_series(input)?;
    let cfg = overrides.resolve()?;
    print_json(&run_pipeline(&series, &cfg))
}

fn cmd_plot(
    input: &InputArgs,
    overrides: &PipelineOverrides,
    out: &Path,
    title: Option<&str>,
) -> Result<()> {
    let series = load_series(input)?;
    let cfg = overrides.resolve()?;
    let result = run_pipeline(&series, &cfg);
    let title = title
        .or(input.y_col.as_deref())
        .unwrap_or("series")
        .to_string();
    let mut fig = figure_from_pipeline(&title, &result);
    fig.x.label = input.x_col.clone();
    fig.y.label = input.y_col.clone();
    PngBackend { path: out }.draw(&fig)
}

struct PngBackend<'a> {
    path: &'a Path,
}

impl PlotBackend for PngBackend<'_> {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        draw_plotters_figure(self.path, fig)
    }
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (960, 540));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (mut x_min, mut x_max, mut y_min, mut y_max) =
        fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    if x_min == x_max {
        x_min -= 0.5;
        x_max += 0.5;
    }
    if y_min == y_max {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    let mut mesh = chart.configure_mesh();
    if let Some(label) = &fig.x.label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &fig.y.label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw()?;
    for series in &fig.series {
        match series {
            PlotSeries::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    RGBColor(r, g, b).stroke_width(line.style.width.round().max(1.0) as u32),
                ))?;
            }
            PlotSeries::Markers(markers) => {
                let (r, g, b) = markers.color.rgb();
                let color = RGBColor(r, g, b);
                chart.draw_series(
                    markers
                        .points
                        .iter()
                        .map(|p| TriangleMarker::new((p[0], p[1]), markers.size, color.filled())),
                )?;
            }
        }
    }
    if let Some(note) = &fig.note {
        root.draw(&Text::new(
            note.clone(),
            (80, 50),
            ("sans-serif", 16).into_font(),
        ))?;
    }
    root.present()?;
    Ok(())
}
