//! SVG rendering of chart descriptions, on a dark background.

use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use chrono::DateTime;
use plotters::data::float::pretty_print_float;
use plotters::prelude::*;

use crate::chart::{Chart, Color as SeriesColor, Point, Series, Style, Symbol, X};
use crate::error::{Error, Result};

static DEFAULT_FONT: FontFamily = FontFamily::SansSerif;
static SIZE: (u32, u32) = (960, 540);

const BACKGROUND: RGBColor = RGBColor(17, 17, 17);
const FOREGROUND: RGBColor = RGBColor(242, 245, 250);
const GRID: RGBColor = RGBColor(40, 52, 66);
const CYAN: RGBColor = RGBColor(0, 255, 255);
const RED: RGBColor = RGBColor(255, 0, 0);

fn rgb(color: SeriesColor) -> RGBColor {
    match color {
        SeriesColor::Cyan => CYAN,
        SeriesColor::Red => RED,
    }
}

fn failed<E: Display>(path: &Path) -> impl Fn(E) -> Error + '_ {
    move |e| Error::RenderError {
        path: path.to_owned(),
        reason: e.to_string(),
    }
}

/// Where a point lands on the canvas; rows without a timestamp aren't drawn
fn coordinates(point: &Point) -> Option<(f64, f64)> {
    match point.x {
        X::Number(x) => Some((x, point.y)),
        X::Time(t) => Some((t.and_utc().timestamp() as f64, point.y)),
        X::Missing => None,
    }
}

fn time_label(x: f64) -> String {
    DateTime::from_timestamp(x as i64, 0)
        .map(|t| t.naive_utc().format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Range covering `values` with a margin; degenerate ranges are widened to unit width
fn padded_range<'a, I>(values: I) -> Range<f64>
where
    I: Iterator<Item = &'a f64> + Clone,
{
    if values.clone().next().is_none() {
        return 0.0..1.0;
    }

    let range = plotters::data::fitting_range(values);
    let (low, high) = if range.start == range.end {
        (range.start - 0.5, range.end + 0.5)
    } else {
        (range.start, range.end)
    };
    let margin = (high - low) * 0.05;

    (low - margin)..(high + margin)
}

/// Draws `chart` into an SVG file at `path`
pub fn render_svg(chart: &Chart, path: &Path) -> Result<()> {
    let series: Vec<(&Series, Vec<(f64, f64)>)> = chart
        .series
        .iter()
        .map(|s| (s, s.points.iter().filter_map(coordinates).collect()))
        .collect();
    let xs: Vec<f64> = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| p.0))
        .collect();
    let ys: Vec<f64> = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| p.1))
        .collect();

    let root_area = SVGBackend::new(path, SIZE).into_drawing_area();
    root_area.fill(&BACKGROUND).map_err(failed(path))?;

    let mut chart_context = ChartBuilder::on(&root_area)
        .caption(&chart.title, (DEFAULT_FONT, 20).into_font().color(&FOREGROUND))
        .margin((5).percent())
        .set_label_area_size(LabelAreaPosition::Left, (5).percent_width().min(60))
        .set_label_area_size(LabelAreaPosition::Bottom, (5).percent_height().min(40))
        .build_cartesian_2d(padded_range(xs.iter()), padded_range(ys.iter()))
        .map_err(failed(path))?;

    let x_is_time = chart.x_axis.time;
    let x_formatter = move |x: &f64| {
        if x_is_time {
            time_label(*x)
        } else {
            pretty_print_float(*x, true)
        }
    };
    chart_context
        .configure_mesh()
        .x_desc(chart.x_axis.title.as_str())
        .y_desc(chart.y_axis.title.as_str())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&|y| pretty_print_float(*y, true))
        .axis_style(&FOREGROUND)
        .bold_line_style(&GRID)
        .light_line_style(TRANSPARENT)
        .label_style((DEFAULT_FONT, 12).into_font().color(&FOREGROUND))
        .axis_desc_style((DEFAULT_FONT, 14).into_font().color(&FOREGROUND))
        .draw()
        .map_err(failed(path))?;

    for (series, points) in series {
        let color = rgb(series.color);
        let size = series.marker.size;

        if series.style == Style::LinesMarkers {
            chart_context
                .draw_series(LineSeries::new(points.iter().cloned(), color.stroke_width(1)))
                .map_err(failed(path))?;
        }

        match series.marker.symbol {
            Symbol::Circle => {
                chart_context
                    .draw_series(
                        points
                            .iter()
                            .map(|&p| Circle::new(p, size / 2, color.filled())),
                    )
                    .map_err(failed(path))?
                    .label(series.name)
                    .legend(move |(x, y)| Circle::new((x + 10, y), size / 2, color.filled()));
            }
            Symbol::X => {
                chart_context
                    .draw_series(
                        points
                            .iter()
                            .map(|&p| Cross::new(p, size / 2, color.stroke_width(2))),
                    )
                    .map_err(failed(path))?
                    .label(series.name)
                    .legend(move |(x, y)| Cross::new((x + 10, y), size / 2, color.stroke_width(2)));
            }
        }
    }

    chart_context
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&BACKGROUND.mix(0.8))
        .border_style(&FOREGROUND)
        .label_font((DEFAULT_FONT, 12).into_font().color(&FOREGROUND))
        .draw()
        .map_err(failed(path))?;

    root_area.present().map_err(failed(path))?;
    debug!("wrote {:?}", path);
    Ok(())
}
