//! Per-dataset diagnostic figure.
//!
//! Layout (one PNG per dataset):
//!
//! - top-left: mean time with ±1 stdev error bars
//! - top-right: one line per quantile column (Q0..Q4)
//! - bottom, centred: observed means plus the fitted trend, with the equation
//!   annotated in a white box

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{Dataset, FigureSize, FitResult, QUANTILE_COUNT};
use crate::error::AppError;
use crate::math::min_max;
use crate::plot::{axis_label, padded_range, render_error, series_color};

const X_DESC: &str = "Number of Elements (n)";
const Y_DESC: &str = "Time (ns)";

/// Render `<dataset>_analysis.png` for one fitted dataset.
pub fn render_dataset_figure(
    dataset: &Dataset,
    fit: &FitResult,
    path: &Path,
    size: FigureSize,
) -> Result<(), AppError> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    draw_dataset_figure(&root, dataset, fit).map_err(|e| render_error(path, e))
}

/// Figure title: model type plus dataset name.
pub fn analysis_title(fit: &FitResult) -> String {
    format!("Mean Time vs. Number of Elements with {} - {}", fit.model_type, fit.name)
}

fn draw_dataset_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    fit: &FitResult,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let body = root.titled(&analysis_title(fit), ("sans-serif", 28))?;

    let (w, h) = body.dim_in_pixel();
    let (top, bottom) = body.split_vertically(h / 2);
    let (top_left, top_right) = top.split_horizontally(w / 2);
    let side = w / 4;
    let bottom_centre = bottom.margin(0, 0, side, side);

    draw_error_bars(&top_left, dataset)?;
    draw_quantiles(&top_right, dataset)?;
    draw_fit(&bottom_centre, fit)?;

    root.present()?;
    Ok(())
}

fn draw_error_bars<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, dataset: &Dataset) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let samples = dataset.samples();
    let x = dataset.sizes();
    let lows: Vec<f64> = samples.iter().map(|s| s.t_mean - s.t_stdev).collect();
    let highs: Vec<f64> = samples.iter().map(|s| s.t_mean + s.t_stdev).collect();

    let (x_lo, x_hi) = min_max(&x).unwrap_or((0.0, 1.0));
    let (y_lo, _) = min_max(&lows).unwrap_or((0.0, 1.0));
    let (_, y_hi) = min_max(&highs).unwrap_or((0.0, 1.0));

    let mut chart = ChartBuilder::on(area)
        .caption("Mean Time ± Standard Deviation", ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(padded_range(x_lo, x_hi), padded_range(y_lo, y_hi))?;

    chart
        .configure_mesh()
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .y_label_formatter(&|v| axis_label(*v))
        .draw()?;

    let color = series_color(0);
    chart.draw_series(samples.iter().map(|s| {
        ErrorBar::new_vertical(
            s.n as f64,
            s.t_mean - s.t_stdev,
            s.t_mean,
            s.t_mean + s.t_stdev,
            color.filled(),
            8,
        )
    }))?;

    Ok(())
}

fn draw_quantiles<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, dataset: &Dataset) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let samples = dataset.samples();
    let x = dataset.sizes();
    let all_q: Vec<f64> = samples.iter().flat_map(|s| s.quantiles).collect();

    let (x_lo, x_hi) = min_max(&x).unwrap_or((0.0, 1.0));
    let (y_lo, y_hi) = min_max(&all_q).unwrap_or((0.0, 1.0));

    let mut chart = ChartBuilder::on(area)
        .caption("Quantiles", ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(padded_range(x_lo, x_hi), padded_range(y_lo, y_hi))?;

    chart
        .configure_mesh()
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .y_label_formatter(&|v| axis_label(*v))
        .draw()?;

    for q in 0..QUANTILE_COUNT {
        let color = series_color(q);
        chart
            .draw_series(LineSeries::new(
                samples.iter().map(|s| (s.n as f64, s.quantiles[q])),
                color.stroke_width(2),
            ))?
            .label(format!("Q{q}"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_fit<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, fit: &FitResult) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let y_trend = fit.y_trend();
    let all_y: Vec<f64> = fit.y.iter().chain(y_trend.iter()).copied().collect();

    let (x_lo, x_hi) = min_max(&fit.x).unwrap_or((0.0, 1.0));
    let (y_lo, y_hi) = min_max(&all_y).unwrap_or((0.0, 1.0));
    let x_range = padded_range(x_lo, x_hi);
    let y_range = padded_range(y_lo, y_hi);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Mean Time with {}", fit.model_type), ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .y_label_formatter(&|v| axis_label(*v))
        .draw()?;

    let data_color = series_color(0);
    chart
        .draw_series(
            fit.x
                .iter()
                .zip(fit.y.iter())
                .map(|(&x, &y)| Circle::new((x, y), 4, data_color.filled())),
        )?
        .label("Mean time")
        .legend(move |(x, y)| Circle::new((x + 10, y), 4, data_color.filled()));

    let fit_color = series_color(3);
    chart
        .draw_series(LineSeries::new(
            fit.x_trend.iter().copied().zip(y_trend.iter().copied()),
            fit_color.stroke_width(2),
        ))?
        .label(fit.model_type.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], fit_color));

    // Equation box, anchored near the top-left corner of the plotting area.
    let anchor = (
        x_range.start + 0.03 * (x_range.end - x_range.start),
        y_range.end - 0.04 * (y_range.end - y_range.start),
    );
    let box_w = fit.equation.chars().count() as i32 * 10 + 16;
    chart.draw_series(std::iter::once(
        EmptyElement::at(anchor)
            + Rectangle::new([(0, 0), (box_w, 30)], ShapeStyle::from(&WHITE).filled())
            + Text::new(fit.equation.clone(), (8, 6), ("sans-serif", 18).into_font()),
    ))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{FitOptions, fit_series};

    #[test]
    fn title_names_model_type_and_dataset() {
        let x: Vec<f64> = (1..=8).map(|i| (i * 32) as f64).collect();
        let y: Vec<f64> = x.iter().map(|&n| n * n.log2() + 1.0).collect();
        let fit = fit_series("divide_and_conquer_improved", &x, &y, &FitOptions::default()).unwrap();

        assert_eq!(
            analysis_title(&fit),
            "Mean Time vs. Number of Elements with nlog(n) fit - divide_and_conquer_improved"
        );
    }
}
