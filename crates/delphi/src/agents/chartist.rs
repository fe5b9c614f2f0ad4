//! Price chart rendering
//!
//! [`render_chart`] sorts price points by date, draws them as a single line
//! series, and returns the image base64-encoded. The drawing step sits behind
//! [`PlotSurface`] so the plotted sequence can be observed in tests.

use crate::api::PricePoint;
use crate::error::{DelphiError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use tracing::{debug, error, warn};

pub const CHART_TITLE: &str = "Stock Price Over Last 100 Days";
const X_LABEL: &str = "Date";
const Y_LABEL: &str = "Closing Price (USD)";

/// Draws a date-ordered closing-price series into image bytes
pub trait PlotSurface {
    /// `series` is sorted ascending by date and never empty
    fn plot(&self, series: &[(NaiveDate, f64)]) -> Result<Vec<u8>>;
}

/// SVG line chart drawn with `plotters`
#[derive(Debug, Clone, Copy)]
pub struct SvgPlotter {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgPlotter {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
        }
    }
}

fn chart_error(e: impl std::fmt::Display) -> DelphiError {
    DelphiError::Chart(e.to_string())
}

impl PlotSurface for SvgPlotter {
    fn plot(&self, series: &[(NaiveDate, f64)]) -> Result<Vec<u8>> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(DelphiError::Chart("no points to plot".to_string()));
        };

        let (mut start, mut end) = (first.0, last.0);
        if start == end {
            start -= Duration::days(1);
            end += Duration::days(1);
        }

        let (mut low, mut high) = series
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, close)| {
                (lo.min(*close), hi.max(*close))
            });
        let pad = ((high - low) * 0.05).max(1.0);
        low -= pad;
        high += pad;

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(CHART_TITLE, ("sans-serif", 24))
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(start..end, low..high)
                .map_err(chart_error)?;

            chart
                .configure_mesh()
                .x_desc(X_LABEL)
                .y_desc(Y_LABEL)
                .x_label_formatter(&|date: &NaiveDate| date.format("%Y-%m-%d").to_string())
                .draw()
                .map_err(chart_error)?;

            chart
                .draw_series(LineSeries::new(series.iter().copied(), &BLUE))
                .map_err(chart_error)?;
            chart
                .draw_series(
                    series
                        .iter()
                        .map(|&(date, close)| Circle::new((date, close), 3, BLUE.filled())),
                )
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }

        Ok(svg.into_bytes())
    }
}

/// Render `points` with the default [`SvgPlotter`]
pub fn render_chart(points: &[PricePoint]) -> String {
    render_chart_with(points, &SvgPlotter::default())
}

/// Render `points` with `surface` and base64-encode the image
///
/// Returns an empty string when there is nothing to plot or drawing fails.
/// Points whose date is not `YYYY-MM-DD` are dropped.
pub fn render_chart_with(points: &[PricePoint], surface: &dyn PlotSurface) -> String {
    if points.is_empty() {
        debug!("No price points, skipping chart");
        return String::new();
    }

    let mut series: Vec<(NaiveDate, f64)> = points
        .iter()
        .filter_map(|point| match NaiveDate::parse_from_str(&point.date, "%Y-%m-%d") {
            Ok(date) => Some((date, point.close)),
            Err(e) => {
                warn!(date = %point.date, error = %e, "Dropping price point with invalid date");
                None
            }
        })
        .collect();

    if series.is_empty() {
        return String::new();
    }

    series.sort_by_key(|(date, _)| *date);

    match surface.plot(&series) {
        Ok(image) => {
            debug!(points = series.len(), bytes = image.len(), "Chart rendered");
            STANDARD.encode(image)
        }
        Err(e) => {
            error!(error = %e, "Chart rendering failed");
            String::new()
        }
    }
}
