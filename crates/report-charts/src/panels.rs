use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::data::{format_currency, padded_range, AxisCurrency, ReportData, Series};
use std::ops::Range;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const ORANGE: RGBColor = RGBColor(255, 140, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const PALETTE: [RGBColor; 3] = [BLUE, GREEN, RED];

fn series_colors(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

#[derive(Debug, Clone, Copy)]
enum YAxis {
    Currency,
    Percent,
    Multiple,
}

impl YAxis {
    fn formatter(self, range: &Range<f64>) -> Box<dyn Fn(&f64) -> String> {
        match self {
            YAxis::Currency => {
                let axis = AxisCurrency::for_range(range);
                Box::new(move |y| axis.label(*y))
            }
            YAxis::Percent => Box::new(|y| format!("{:.1}%", y)),
            YAxis::Multiple => Box::new(|y| format!("{:.1}x", y)),
        }
    }
}

/// Line chart of one or more series over the period axis.
fn line_panel(
    area: &Area,
    data: &ReportData,
    caption: &str,
    series: &[&Series],
    y_axis: YAxis,
    annotate: bool,
) -> Result<()> {
    let y_range = padded_range(series.iter().flat_map(|s| s.values()), false);
    let y_formatter = y_axis.formatter(&y_range);
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(data.x_range(), y_range)?;

    chart
        .configure_mesh()
        .x_labels(data.dates.len().max(2) * 2)
        .x_label_formatter(&|x| data.date_label(*x))
        .y_label_formatter(&*y_formatter)
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = series_colors(i);
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(s.points.iter().map(|p| Circle::new(*p, 4, color.filled())))?;
        if annotate {
            chart.draw_series(s.points.iter().map(|(x, y)| {
                Text::new(format_currency(*y), (*x, *y), ("sans-serif", 12))
            }))?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

pub fn revenue(area: &Area, data: &ReportData) -> Result<()> {
    line_panel(
        area,
        data,
        "Revenue Trend",
        &[&data.revenue],
        YAxis::Currency,
        true,
    )
}

pub fn margins(area: &Area, data: &ReportData) -> Result<()> {
    let series: Vec<&Series> = data.margins.iter().collect();
    line_panel(area, data, "Profit Margins (%)", &series, YAxis::Percent, false)
}

pub fn multiples(area: &Area, data: &ReportData) -> Result<()> {
    let series: Vec<&Series> = data.multiples.iter().collect();
    line_panel(area, data, "Valuation Multiples", &series, YAxis::Multiple, false)
}

pub fn dupont(area: &Area, data: &ReportData) -> Result<()> {
    let series: Vec<&Series> = data.dupont.iter().collect();
    line_panel(area, data, "DuPont ROE Decomposition (%)", &series, YAxis::Percent, false)
}

/// Grouped bars of operating and net income per period.
pub fn income(area: &Area, data: &ReportData) -> Result<()> {
    let y_range = padded_range(
        data.operating_income.values().chain(data.net_income.values()),
        true,
    );
    let y_formatter = YAxis::Currency.formatter(&y_range);
    let mut chart = ChartBuilder::on(area)
        .caption("Operating vs Net Income", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(data.x_range(), y_range)?;

    chart
        .configure_mesh()
        .x_labels(data.dates.len().max(2) * 2)
        .x_label_formatter(&|x| data.date_label(*x))
        .y_label_formatter(&*y_formatter)
        .draw()?;

    for (series, offset, color) in [
        (&data.operating_income, -0.35, BLUE),
        (&data.net_income, 0.0, ORANGE),
    ] {
        chart
            .draw_series(series.points.iter().map(|(x, y)| {
                Rectangle::new([(x + offset, 0.0), (x + offset + 0.35, *y)], color.mix(0.8).filled())
            }))?
            .label(series.label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Forecast FCF bars, discounted FCF line and a dashed discounted terminal value.
pub fn dcf(area: &Area, data: &ReportData) -> Result<()> {
    let years = data.forecast_fcf.len().max(1);
    let x_range = 0.5..(years as f64 + 0.5);
    let y_range = padded_range(
        data.forecast_fcf
            .iter()
            .chain(&data.discounted_cash_flows)
            .copied()
            .chain(std::iter::once(data.discounted_terminal_value)),
        true,
    );
    let y_formatter = YAxis::Currency.formatter(&y_range);
    let mut chart = ChartBuilder::on(area)
        .caption("DCF Projection", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_range)?;

    chart
        .configure_mesh()
        .x_labels(years * 2)
        .x_label_formatter(&|x| {
            let year = x.round();
            if (x - year).abs() < 1e-6 && year >= 1.0 {
                format!("Year {}", year as usize)
            } else {
                String::new()
            }
        })
        .y_label_formatter(&*y_formatter)
        .draw()?;

    chart
        .draw_series(data.forecast_fcf.iter().enumerate().map(|(i, fcf)| {
            let x = i as f64 + 1.0;
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, *fcf)], BLUE.mix(0.6).filled())
        }))?
        .label("Forecast FCF")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], BLUE.mix(0.6).filled()));

    let discounted: Vec<(f64, f64)> = data
        .discounted_cash_flows
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0, *v))
        .collect();
    chart
        .draw_series(LineSeries::new(discounted.iter().copied(), GREEN.stroke_width(2)))?
        .label("Discounted FCF")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));
    chart.draw_series(discounted.iter().map(|p| Circle::new(*p, 4, GREEN.filled())))?;

    let tv = data.discounted_terminal_value;
    chart
        .draw_series(
            dash_segments(x_range.start, x_range.end, 24)
                .into_iter()
                .map(|(a, b)| PathElement::new(vec![(a, tv), (b, tv)], PURPLE.stroke_width(2))),
        )?
        .label(format!("Discounted Terminal Value: {}", format_currency(tv)))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 8, y)], PURPLE.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Split `[start, end]` into `count` dashes separated by equal gaps.
pub(crate) fn dash_segments(start: f64, end: f64, count: usize) -> Vec<(f64, f64)> {
    if count == 0 || end <= start {
        return Vec::new();
    }
    let step = (end - start) / (2 * count - 1) as f64;
    (0..count)
        .map(|i| {
            let a = start + step * (2 * i) as f64;
            (a, a + step)
        })
        .collect()
}
