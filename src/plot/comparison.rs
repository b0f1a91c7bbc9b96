//! Cross-dataset comparison figure.
//!
//! Two stacked panels sharing the x domain and the `0..y_max_with_buffer` y range:
//! the top one overlays each dataset's raw means (translucent) on its fitted
//! curve, the bottom one shows the fitted curves alone.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::FigureSize;
use crate::error::AppError;
use crate::fit::Comparison;
use crate::plot::{axis_label, padded_range, render_error, series_color, zero_based_range};

/// Render `combined_fit_curves.png`.
pub fn render_comparison(comparison: &Comparison, path: &Path, size: FigureSize) -> Result<(), AppError> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    draw_comparison(&root, comparison).map_err(|e| render_error(path, e))
}

fn draw_comparison<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, cmp: &Comparison) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));

    draw_panel(&panels[0], cmp, "Raw Data with Fitted Curves", true)?;
    draw_panel(&panels[1], cmp, "Fitted Curves Comparison", false)?;

    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cmp: &Comparison,
    caption: &str,
    with_data: bool,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(padded_range(cmp.x_min, cmp.x_max), zero_based_range(cmp.y_max_with_buffer))?;

    chart
        .configure_mesh()
        .x_desc("Number of Elements (n)")
        .y_desc("Time (ns)")
        .y_label_formatter(&|v| axis_label(*v))
        .draw()?;

    for s in &cmp.series {
        let color = series_color(s.index);

        if with_data {
            chart
                .draw_series(
                    s.x.iter()
                        .zip(s.y.iter())
                        .map(|(&x, &y)| Circle::new((x, y), 4, color.mix(0.5).filled())),
                )?
                .label(format!("{} (data)", s.name))
                .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.mix(0.5).filled()));
        }

        chart
            .draw_series(LineSeries::new(
                cmp.x_shared.iter().copied().zip(s.y_fit.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}
