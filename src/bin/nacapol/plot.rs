//! Five-panel figure of an airfoil and its polar.
//!
//! Top to bottom: airfoil shape (equal aspect), CL, CD, CM and CL/CD against
//! angle of attack. PNG is written unless the output path ends in `.svg`.

use anyhow::Result;
use foxil::coords::Coordinates;
use foxil::result::Polar;
use log::warn;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

const FIGURE_SIZE: (u32, u32) = (1000, 1200);
const MARGIN: u32 = 10;
const X_LABEL_AREA: u32 = 35;
const Y_LABEL_AREA: u32 = 60;
const CAPTION_HEIGHT: u32 = 30;
const MARKER_SIZE: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Diamond,
}

struct Panel<'a> {
    caption: Option<String>,
    x_desc: Option<&'a str>,
    y_desc: &'a str,
    xs: &'a [f64],
    ys: &'a [f64],
    color: RGBColor,
    marker: Marker,
}

/// Render the figure for one airfoil. Returns the written path, or `None` when
/// there was no polar data to show.
pub fn plot_airfoil_and_polar(
    coords: &Coordinates,
    polar: &Polar,
    label: &str,
    output: &Path,
) -> Result<Option<PathBuf>> {
    if polar.is_empty() {
        warn!("No polar data to plot for {}.", label);
        return Ok(None);
    }

    if output.extension().is_some_and(|ext| ext == "svg") {
        let root = SVGBackend::new(output, FIGURE_SIZE).into_drawing_area();
        draw_figure(&root, coords, polar, label)?;
    } else {
        let root = BitMapBackend::new(output, FIGURE_SIZE).into_drawing_area();
        draw_figure(&root, coords, polar, label)?;
    }
    Ok(Some(output.to_path_buf()))
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    coords: &Coordinates,
    polar: &Polar,
    label: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let areas = root.split_evenly((5, 1));

    let alphas = polar.alphas();
    let cls = polar.cls();
    let cds = polar.cds();
    let cms = polar.cms();
    let ratios = polar.lift_drag_ratios();

    let (w, h) = areas[0].dim_in_pixel();
    let plot_w = w.saturating_sub(Y_LABEL_AREA + 2 * MARGIN).max(1);
    let plot_h = h
        .saturating_sub(X_LABEL_AREA + CAPTION_HEIGHT + 2 * MARGIN)
        .max(1);
    let (shape_x, shape_y) = equal_aspect_ranges(&coords.xs, &coords.ys, plot_w, plot_h);
    draw_panel(
        &areas[0],
        &Panel {
            caption: Some(format!("NACA Airfoil {}", label)),
            x_desc: Some("x/c"),
            y_desc: "y/c",
            xs: &coords.xs,
            ys: &coords.ys,
            color: BLUE,
            marker: Marker::Circle,
        },
        shape_x,
        shape_y,
    )?;

    let polar_panels = [
        (&cls, "Cl", BLUE, Marker::Circle),
        (&cds, "Cd", RED, Marker::Square),
        (&cms, "Cm", GREEN, Marker::Triangle),
        (&ratios, "Cl/Cd", MAGENTA, Marker::Diamond),
    ];
    let count = polar_panels.len();
    let alpha_range = padded_range(&alphas);
    for (idx, (ys, y_desc, color, marker)) in polar_panels.into_iter().enumerate() {
        let last = idx == count - 1;
        draw_panel(
            &areas[idx + 1],
            &Panel {
                caption: None,
                x_desc: last.then_some("Alpha (deg)"),
                y_desc,
                xs: &alphas,
                ys,
                color,
                marker,
            },
            alpha_range.clone(),
            padded_range(ys),
        )?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA);
    if let Some(caption) = &panel.caption {
        builder.caption(caption, ("sans-serif", 22).into_font());
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    let mut mesh = chart.configure_mesh();
    mesh.y_desc(panel.y_desc);
    if let Some(x_desc) = panel.x_desc {
        mesh.x_desc(x_desc);
    }
    mesh.draw()?;

    let points: Vec<(f64, f64)> = panel
        .xs
        .iter()
        .copied()
        .zip(panel.ys.iter().copied())
        .collect();
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        panel.color.stroke_width(2),
    ))?;

    let style = panel.color.filled();
    let s = MARKER_SIZE;
    match panel.marker {
        Marker::Circle => {
            chart.draw_series(points.iter().map(|&p| Circle::new(p, s, style)))?;
        }
        Marker::Square => {
            chart.draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Rectangle::new([(-s, -s), (s, s)], style)),
            )?;
        }
        Marker::Triangle => {
            chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, s + 1, style)))?;
        }
        Marker::Diamond => {
            chart.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p)
                    + Polygon::new(vec![(0, -s - 1), (s + 1, 0), (0, s + 1), (-s - 1, 0)], style)
            }))?;
        }
    }
    Ok(())
}

/// Data range widened by 5% on each side; degenerate spans get a unit window.
pub fn padded_range(values: &[f64]) -> Range<f64> {
    let (min, max) = finite_bounds(values);
    let span = max - min;
    if span <= f64::EPSILON {
        let half = if min.abs() > f64::EPSILON { min.abs() * 0.5 } else { 1.0 };
        return (min - half)..(max + half);
    }
    (min - 0.05 * span)..(max + 0.05 * span)
}

/// Axis ranges with the same data units per pixel on both axes, centred on the data.
pub fn equal_aspect_ranges(
    xs: &[f64],
    ys: &[f64],
    width: u32,
    height: u32,
) -> (Range<f64>, Range<f64>) {
    let x = padded_range(xs);
    let y = padded_range(ys);
    let units_per_px = ((x.end - x.start) / width as f64).max((y.end - y.start) / height as f64);
    let half_w = units_per_px * width as f64 / 2.0;
    let half_h = units_per_px * height as f64 / 2.0;
    let cx = (x.start + x.end) / 2.0;
    let cy = (y.start + y.end) / 2.0;
    ((cx - half_w)..(cx + half_w), (cy - half_h)..(cy + half_h))
}

fn finite_bounds(values: &[f64]) -> (f64, f64) {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max { (0.0, 0.0) } else { (min, max) }
}
