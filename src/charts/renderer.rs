//! Chart Renderer Module
//! Annotated stress-strain PNGs via plotters.
//!
//! Two plot kinds:
//! - single trace: one sample's stress-strain curve with the elastic-fit
//!   line, yield and max-force markers, and numeric results in the legend.
//! - multi trace: all curves of one (group, length) bucket overlaid, with
//!   the bucket averages in the legend.

use crate::analysis::MaterialProperties;
use crate::data::DerivedCurve;
use crate::stats::{GroupKey, GroupSummary};
use clap::ValueEnum;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PLOT_WIDTH: u32 = 1200;
pub const PLOT_HEIGHT: u32 = 800;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("No data points to plot")]
    NoData,
}

/// Scalar result columns that can be scattered against each other in the
/// results plot (`visualize` subcommand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResultParam {
    /// Kinetic energy at break
    Ke,
    /// Break velocity
    V,
    /// Line diameter
    D,
    /// Specimen length
    L,
}

impl ResultParam {
    /// Column name in `individual_results.csv`.
    pub fn column_name(self) -> &'static str {
        match self {
            ResultParam::Ke => "kinetic_energy_J",
            ResultParam::V => "velocity_m_s",
            ResultParam::D => "diameter_mm",
            ResultParam::L => "length_mm",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ResultParam::Ke => "KE",
            ResultParam::V => "V",
            ResultParam::D => "D",
            ResultParam::L => "L",
        }
    }

    fn axis_label(self) -> &'static str {
        match self {
            ResultParam::Ke => "Kinetic Energy (J)",
            ResultParam::V => "Velocity (m/s)",
            ResultParam::D => "Diameter (mm)",
            ResultParam::L => "Length (mm)",
        }
    }
}

/// Render one sample's annotated stress-strain plot. Returns the PNG path.
pub fn plot_single_trace(
    curve: &DerivedCurve,
    props: &MaterialProperties,
    out_dir: &Path,
) -> Result<PathBuf, ChartError> {
    let geom = &props.geometry;
    let filename = format!(
        "plot-{}-{}in-{:.0}-single-{}.png",
        geom.group, geom.length_in, geom.diameter_mm, geom.test_run
    );
    let path = out_dir.join(filename);
    render_single(curve, props, &path).map_err(|e| ChartError::Render(e.to_string()))?;
    log::info!("Single trace plot saved to {}", path.display());
    Ok(path)
}

fn render_single(
    curve: &DerivedCurve,
    props: &MaterialProperties,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_max, y_max) = curve_bounds(std::iter::once(curve));
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "{} {}in d{:.0}mm run {}",
                props.geometry.group,
                props.geometry.length_in,
                props.geometry.diameter_mm,
                props.geometry.test_run
            ),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Strain")
        .y_desc("Stress (MPa)")
        .light_line_style(WHITE.mix(0.7))
        .label_style(("sans-serif", 14))
        .draw()?;

    let trace_color = Palette99::pick(0);
    chart
        .draw_series(LineSeries::new(
            curve
                .strain
                .iter()
                .zip(curve.stress_mpa.iter())
                .map(|(&x, &y)| (x, y)),
            trace_color.stroke_width(2),
        ))?
        .label(format!("Max Force = {:.2} N", props.max_force_n))
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], trace_color.stroke_width(2))
        });

    // Elastic fit through the origin, drawn over the pre-yield span.
    let fit_span = props
        .yield_point
        .map(|(strain, _)| strain)
        .unwrap_or(x_max * 0.3);
    chart
        .draw_series(LineSeries::new(
            (0..=20).map(|i| {
                let x = fit_span * i as f64 / 20.0;
                (x, props.modulus_mpa * x)
            }),
            RED.stroke_width(1),
        ))?
        .label(format!(
            "Modulus = {:.2} MPa{}",
            props.modulus_mpa,
            if props.modulus_from_fallback {
                " (fallback)"
            } else {
                ""
            }
        ))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(1)));

    if let Some((yield_strain, yield_stress)) = props.yield_point {
        chart
            .draw_series(std::iter::once(Circle::new(
                (yield_strain, yield_stress),
                6,
                RED.filled(),
            )))?
            .label(format!("Yield = {:.2} MPa", props.yield_stress_mpa))
            .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Render the overlaid stress-strain curves for one bucket.
pub fn plot_multi_trace(
    curves: &[DerivedCurve],
    key: &GroupKey,
    summary: &GroupSummary,
    out_dir: &Path,
) -> Result<PathBuf, ChartError> {
    let filename = format!("plot-{}-{}in-multi.png", key.group, key.length_in);
    let path = out_dir.join(filename);
    render_multi(curves, key, summary, &path).map_err(|e| ChartError::Render(e.to_string()))?;
    log::info!("Multi trace plot saved to {}", path.display());
    Ok(path)
}

fn render_multi(
    curves: &[DerivedCurve],
    key: &GroupKey,
    summary: &GroupSummary,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_max, y_max) = curve_bounds(curves.iter());
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "{} {}in | Avg Modulus {:.2} MPa, Yield {:.2} MPa, Max Force {:.2} N",
                key.group,
                key.length_in,
                summary.modulus_mpa.mean,
                summary.yield_stress_mpa.mean,
                summary.max_force_n.mean
            ),
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Strain")
        .y_desc("Stress (MPa)")
        .light_line_style(WHITE.mix(0.7))
        .label_style(("sans-serif", 14))
        .draw()?;

    for (i, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(i);
        chart
            .draw_series(LineSeries::new(
                curve
                    .strain
                    .iter()
                    .zip(curve.stress_mpa.iter())
                    .map(|(&x, &y)| (x, y)),
                color.stroke_width(1),
            ))?
            .label(format!("Sample {}", i + 1))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Scatter one exported result column against another. Returns the PNG path.
pub fn plot_result_scatter(
    points: &[(f64, f64)],
    x_param: ResultParam,
    y_param: ResultParam,
    out_dir: &Path,
) -> Result<PathBuf, ChartError> {
    if points.is_empty() {
        return Err(ChartError::NoData);
    }
    let filename = format!("output-{}-vs-{}.png", y_param.tag(), x_param.tag());
    let path = out_dir.join(filename);
    render_scatter(points, x_param, y_param, &path)
        .map_err(|e| ChartError::Render(e.to_string()))?;
    log::info!("Output plot saved to {}", path.display());
    Ok(path)
}

fn render_scatter(
    points: &[(f64, f64)],
    x_param: ResultParam,
    y_param: ResultParam,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_range, y_range) = scatter_bounds(points);
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} vs {}", y_param.tag(), x_param.tag()),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc(x_param.axis_label())
        .y_desc(y_param.axis_label())
        .light_line_style(WHITE.mix(0.7))
        .label_style(("sans-serif", 14))
        .draw()?;

    let color = Palette99::pick(0);
    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 5, color.filled())),
        )?
        .label(format!("{} vs {}", y_param.tag(), x_param.tag()))
        .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Axis ranges padded around the data, widened when a column is constant.
fn scatter_bounds(points: &[(f64, f64)]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    (pad_range(x_min, x_max), pad_range(y_min, y_max))
}

fn pad_range(min: f64, max: f64) -> std::ops::Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (min - pad)..(max + pad)
}

/// Shared axis bounds with a small margin, never zero-sized.
fn curve_bounds<'a, I: Iterator<Item = &'a DerivedCurve>>(curves: I) -> (f64, f64) {
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for curve in curves {
        for &x in &curve.strain {
            x_max = x_max.max(x);
        }
        for &y in &curve.stress_mpa {
            y_max = y_max.max(y);
        }
    }
    let x_max = if x_max.is_finite() && x_max > 0.0 {
        x_max * 1.05
    } else {
        1.0
    };
    let y_max = if y_max.is_finite() && y_max > 0.0 {
        y_max * 1.1
    } else {
        1.0
    };
    (x_max, y_max)
}
