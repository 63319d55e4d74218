//! Chart rendering for summarized result logs.
//!
//! One chart per test case: dataset row count on a log-scaled x axis,
//! trimmed mean milliseconds on y, one line per (parameter, condition)
//! series with whisker error bars from the trimmed standard deviation.
//! Control series are dashed so the consolidated runs stand out.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::info;

use crate::matrix::Condition;
use crate::stats::{SeriesKey, SummaryTable, TrimmedStat};
use crate::{BenchError, BenchResult};

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 960;

// ── Options ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }

    /// # Errors
    ///
    /// Returns a config error for anything other than `png` or `svg`.
    pub fn parse(s: &str) -> BenchResult<Self> {
        match s {
            "png" => Ok(ChartFormat::Png),
            "svg" => Ok(ChartFormat::Svg),
            other => Err(BenchError::Config(format!(
                "unknown chart format `{other}` (expected png or svg)"
            ))),
        }
    }
}

impl std::fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub format: ChartFormat,
    pub width: u32,
    pub height: u32,
    pub out_dir: PathBuf,
}

impl ChartOptions {
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            format: ChartFormat::Png,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            out_dir: out_dir.into(),
        }
    }
}

/// File name a test case's chart is written under.
#[must_use]
pub fn chart_file_name(test_case: &str, format: ChartFormat) -> String {
    format!("{test_case}.{format}")
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Renders one chart per test case in `summary` and returns the written
/// paths, in test case order.
///
/// # Errors
///
/// Returns an error when the output directory cannot be created or a
/// chart fails to render.
pub fn render_all(summary: &SummaryTable, options: &ChartOptions) -> BenchResult<Vec<PathBuf>> {
    fs::create_dir_all(&options.out_dir)?;
    let mut written = Vec::with_capacity(summary.len());
    for (test_case, series) in summary {
        let path = options
            .out_dir
            .join(chart_file_name(test_case, options.format));
        match options.format {
            ChartFormat::Png => {
                let root =
                    BitMapBackend::new(&path, (options.width, options.height)).into_drawing_area();
                draw_chart(root, test_case, series)?;
            }
            ChartFormat::Svg => {
                let root =
                    SVGBackend::new(&path, (options.width, options.height)).into_drawing_area();
                draw_chart(root, test_case, series)?;
            }
        }
        info!(chart = %path.display(), "chart written");
        written.push(path);
    }
    Ok(written)
}

fn chart_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> BenchError {
    BenchError::Chart(err.to_string())
}

#[allow(clippy::cast_precision_loss)]
fn draw_chart<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    test_case: &str,
    series: &BTreeMap<SeriesKey, BTreeMap<u64, TrimmedStat>>,
) -> BenchResult<()> {
    root.fill(&WHITE).map_err(chart_error)?;

    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_max = 0.0f64;
    for points in series.values() {
        for (&size, stat) in points {
            let x = size as f64;
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_max = y_max.max(stat.mean + stat.std);
        }
    }
    if x_min > x_max {
        return Err(BenchError::Chart(format!(
            "no data points for `{test_case}`"
        )));
    }

    // Multiplicative padding keeps a single-size summary drawable on the
    // log axis.
    let x_low = (x_min * 0.8).max(0.5);
    let x_high = (x_max * 1.25).max(x_low * 2.0);
    let y_top = (y_max * 1.15).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title_case(test_case), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((x_low..x_high).log_scale(), 0.0..y_top)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc("# rows in dataset")
        .y_desc("time (ms)")
        .draw()
        .map_err(chart_error)?;

    // Color tracks the parameter, so the two conditions of one parameter
    // share a hue and differ only in dashing.
    let params: Vec<u32> = series
        .keys()
        .map(|&(param, _)| param)
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();

    for (&(param, condition), points) in series {
        let color_index = params.iter().position(|&p| p == param).unwrap_or(0);
        let color = Palette99::pick(color_index).to_rgba();
        let line: Vec<(f64, f64)> = points
            .iter()
            .map(|(&size, stat)| (size as f64, stat.mean))
            .collect();
        let label = format!("{condition}, n={param}");
        let legend_color = color;

        match condition {
            Condition::Control => {
                chart
                    .draw_series(DashedLineSeries::new(
                        line.iter().copied(),
                        4,
                        3,
                        color.stroke_width(2),
                    ))
                    .map_err(chart_error)?
                    .label(label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 18, y)], legend_color.stroke_width(2))
                    });
            }
            Condition::Optimized => {
                chart
                    .draw_series(LineSeries::new(
                        line.iter().copied(),
                        color.stroke_width(2),
                    ))
                    .map_err(chart_error)?
                    .label(label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 18, y)], legend_color.stroke_width(2))
                    });
            }
        }

        chart
            .draw_series(points.iter().flat_map(|(&size, stat)| {
                let x = size as f64;
                let low = stat.mean - stat.std;
                let high = stat.mean + stat.std;
                [
                    PathElement::new(vec![(x, low), (x, high)], color.stroke_width(1)),
                    PathElement::new(vec![(x * 0.97, low), (x * 1.03, low)], color.stroke_width(1)),
                    PathElement::new(
                        vec![(x * 0.97, high), (x * 1.03, high)],
                        color.stroke_width(1),
                    ),
                ]
            }))
            .map_err(chart_error)?;

        chart
            .draw_series(
                points
                    .iter()
                    .map(|(&size, stat)| Circle::new((size as f64, stat.mean), 3, color.filled())),
            )
            .map_err(chart_error)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_error)?;
    root.present().map_err(chart_error)?;
    Ok(())
}

/// `reify_n_concepts` becomes `Reify N Concepts`.
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ── Tests ──────────────────────────────────────────────────────────────
