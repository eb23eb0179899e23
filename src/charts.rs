//! Chart rendering for the report sections.
//!
//! Each renderer draws into an in-memory RGB framebuffer and encodes it
//! as PNG bytes sized for document embedding. Styling is fixed, so
//! identical metrics always produce identical image bytes. Empty series
//! render a labeled placeholder instead of erroring.

use log::debug;
use plotters::coord::ranged1d::{IntoSegmentedCoord, SegmentValue};
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use crate::types::MetricsSummary;

/// Bar and line chart dimensions (pixels).
pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 500;

/// Pie chart dimensions (pixels).
pub const PIE_WIDTH: u32 = 640;
pub const PIE_HEIGHT: u32 = 480;

const BAR_COLOR: RGBColor = RGBColor(27, 27, 112);
const LINE_COLOR: RGBColor = RGBColor(178, 34, 34);

/// Severity palette: Critical, High, Medium, Low, Unknown.
const SEVERITY_COLORS: [RGBColor; 5] = [
    RGBColor(178, 34, 34),
    RGBColor(230, 126, 34),
    RGBColor(241, 196, 15),
    RGBColor(39, 174, 96),
    RGBColor(127, 140, 141),
];

/// Chart rendering failures. These indicate an upstream bug or a broken
/// drawing environment, never an empty series.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart drawing failed: {0}")]
    Draw(String),

    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Vertical bars of ranked attack categories.
pub fn category_chart(summary: &MetricsSummary) -> Result<Vec<u8>, RenderError> {
    bar_chart("Events by Attack Category", &summary.ranked_categories)
}

/// Vertical bars of the top offending source IPs.
pub fn top_sources_chart(summary: &MetricsSummary) -> Result<Vec<u8>, RenderError> {
    bar_chart("Top Offending Source IPs", &summary.top_sources)
}

/// Line chart of daily event counts over the observed period.
pub fn timeline_chart(summary: &MetricsSummary) -> Result<Vec<u8>, RenderError> {
    let mut buf = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (CHART_WIDTH, CHART_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        if summary.daily_counts.is_empty() {
            draw_placeholder(&root, "Daily Attack Timeline")?;
        } else {
            let start = summary.daily_counts[0].0;
            let last = summary.daily_counts[summary.daily_counts.len() - 1].0;
            // A one-day period still needs a non-degenerate x range.
            let end = if last > start {
                last
            } else {
                last.succ_opt().unwrap_or(last)
            };
            let y_max = summary
                .daily_counts
                .iter()
                .map(|(_, c)| *c)
                .max()
                .unwrap_or(0)
                .max(1) as f64
                * 1.2;

            let mut chart = ChartBuilder::on(&root)
                .caption("Daily Attack Timeline", ("sans-serif", 28))
                .margin(12)
                .x_label_area_size(48)
                .y_label_area_size(56)
                .build_cartesian_2d(start..end, 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .x_label_formatter(&|d| d.format("%d/%m").to_string())
                .y_label_formatter(&|y| format!("{:.0}", y))
                .y_desc("Events")
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    LineSeries::new(
                        summary.daily_counts.iter().map(|(d, c)| (*d, *c as f64)),
                        LINE_COLOR.stroke_width(2),
                    )
                    .point_size(3),
                )
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }
    encode_png(CHART_WIDTH, CHART_HEIGHT, buf)
}

/// Pie of the severity distribution. Zero-count levels are omitted from
/// the pie; an all-zero distribution renders the placeholder.
pub fn severity_chart(summary: &MetricsSummary) -> Result<Vec<u8>, RenderError> {
    let mut buf = vec![0u8; (PIE_WIDTH * PIE_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut buf, (PIE_WIDTH, PIE_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let slices: Vec<(&str, u64, RGBColor)> = summary
            .severity_counts
            .iter()
            .zip(SEVERITY_COLORS.iter())
            .filter(|((_, count), _)| *count > 0)
            .map(|((severity, count), color)| (severity.label(), *count, *color))
            .collect();

        if slices.is_empty() {
            draw_placeholder(&root, "Severity Distribution")?;
        } else {
            let area = root
                .titled("Severity Distribution", ("sans-serif", 28))
                .map_err(draw_err)?;
            let (w, h) = area.dim_in_pixel();
            let center = ((w / 2) as i32, (h / 2) as i32);
            let radius = (w.min(h) / 2).saturating_sub(70) as f64;

            let sizes: Vec<f64> = slices.iter().map(|(_, c, _)| *c as f64).collect();
            let colors: Vec<RGBColor> = slices.iter().map(|(_, _, color)| *color).collect();
            let labels: Vec<String> = slices
                .iter()
                .map(|(label, count, _)| format!("{} ({})", label, count))
                .collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
            area.draw(&pie).map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }
    encode_png(PIE_WIDTH, PIE_HEIGHT, buf)
}

/// Shared vertical bar chart over (label, count) pairs.
fn bar_chart(title: &str, data: &[(String, u64)]) -> Result<Vec<u8>, RenderError> {
    let mut buf = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (CHART_WIDTH, CHART_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        if data.is_empty() {
            draw_placeholder(&root, title)?;
        } else {
            let y_max = data.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as f64 * 1.2;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 28))
                .margin(12)
                .x_label_area_size(72)
                .y_label_area_size(56)
                .build_cartesian_2d((0usize..data.len()).into_segmented(), 0f64..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(data.len())
                .x_label_formatter(&|seg| match seg {
                    SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => data
                        .get(*i)
                        .map(|(label, _)| short_label(label))
                        .unwrap_or_default(),
                    SegmentValue::Last => String::new(),
                })
                .y_label_formatter(&|y| format!("{:.0}", y))
                .y_desc("Events")
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_COLOR.filled())
                        .margin(10)
                        .data(data.iter().enumerate().map(|(i, (_, c))| (i, *c as f64))),
                )
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }
    debug!("rendered '{}' with {} bars", title, data.len());
    encode_png(CHART_WIDTH, CHART_HEIGHT, buf)
}

/// Empty-series placeholder: title plus a centered notice.
fn draw_placeholder(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    title: &str,
) -> Result<(), RenderError> {
    let (w, h) = root.dim_in_pixel();

    let title_style = ("sans-serif", 28)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    root.draw(&Text::new(title.to_string(), ((w / 2) as i32, 16), title_style))
        .map_err(draw_err)?;

    let note_style = ("sans-serif", 20)
        .into_font()
        .color(&RGBColor(127, 140, 141))
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        "no events recorded".to_string(),
        ((w / 2) as i32, (h / 2) as i32),
        note_style,
    ))
    .map_err(draw_err)?;

    Ok(())
}

fn short_label(label: &str) -> String {
    // Labels are free text from the input; truncate on char boundaries.
    if label.chars().count() > 16 {
        let head: String = label.chars().take(14).collect();
        format!("{}..", head)
    } else {
        label.to_string()
    }
}

fn encode_png(width: u32, height: u32, buf: Vec<u8>) -> Result<Vec<u8>, RenderError> {
    let img = image::RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| RenderError::Draw("framebuffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut png),
        image::ImageOutputFormat::Png,
    )?;
    Ok(png)
}
