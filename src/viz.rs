//! Figures rendered with Plotters: correlation heatmap, actual vs predicted
//! scatter and random forest feature importances

use crate::data::CorrelationMatrix;
use crate::error::PipelineError;
use crate::model::RandomForestRegressor;
use ndarray::Array1;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::info;

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Any backend or font failure means the figure cannot be shown
fn display_error(err: Box<dyn std::error::Error>) -> PipelineError {
    PipelineError::DisplayUnavailable(err.to_string())
}

/// Diverging blue-white-red colour for a correlation in [-1, 1]
fn coolwarm(value: f64) -> RGBColor {
    if value.is_nan() {
        return RGBColor(200, 200, 200);
    }
    let v = value.clamp(-1.0, 1.0);
    let blend = |from: (f64, f64, f64), t: f64| {
        let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
        RGBColor(
            mix(from.0, 247.0),
            mix(from.1, 247.0),
            mix(from.2, 247.0),
        )
    };
    if v < 0.0 {
        blend((59.0, 76.0, 192.0), 1.0 + v)
    } else {
        blend((180.0, 4.0, 38.0), 1.0 - v)
    }
}

/// Render the correlation matrix as an annotated heatmap
///
/// # Arguments
/// * `corr` - Pairwise correlations of the cleaned numeric columns
/// * `output_path` - Path to save the PNG figure
pub fn create_correlation_heatmap(corr: &CorrelationMatrix, output_path: &Path) -> crate::Result<()> {
    if corr.columns.len() < 2 {
        return Err(PipelineError::SchemaMismatch(format!(
            "correlation heatmap needs at least two numeric columns, got {}",
            corr.columns.len()
        )));
    }
    draw_heatmap(corr, output_path).map_err(display_error)?;
    info!(path = %output_path.display(), "correlation heatmap saved");
    Ok(())
}

fn draw_heatmap(corr: &CorrelationMatrix, output_path: &Path) -> DrawResult<()> {
    let n = corr.columns.len() as i32;

    let root = BitMapBackend::new(output_path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    // Integer ranges are inclusive, so 0..n-1 yields one segment per column
    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Heatmap", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(120)
        .y_label_area_size(160)
        .build_cartesian_2d((0..n - 1).into_segmented(), (0..n - 1).into_segmented())?;

    // Row 0 of the matrix is drawn at the top
    let label = |v: &SegmentValue<i32>, flip: bool| match v {
        SegmentValue::CenterOf(i) if (0..n).contains(i) => {
            let idx = if flip { n - 1 - i } else { *i };
            corr.columns[idx as usize].clone()
        }
        _ => String::new(),
    };
    let x_label = |v: &SegmentValue<i32>| label(v, false);
    let y_label = |v: &SegmentValue<i32>| label(v, true);

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_label_style(("sans-serif", 13).into_font().transform(FontTransform::Rotate90))
        .y_label_style(("sans-serif", 13))
        .draw()?;

    let cell_font = ("sans-serif", 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for i in 0..n {
        for j in 0..n {
            let value = corr.values[[i as usize, j as usize]];
            let y = n - 1 - i;
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                ],
                coolwarm(value).filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.2}", value),
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(y)),
                cell_font.clone(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Scatter of actual vs predicted prices with an identity reference line
///
/// # Arguments
/// * `actual` - Test-set target values
/// * `predicted` - Random forest predictions for the same rows
/// * `target_range` - (min, max) of the full target column, spanned by the reference line
/// * `output_path` - Path to save the PNG figure
pub fn create_actual_vs_predicted_plot(
    actual: &Array1<f64>,
    predicted: &Array1<f64>,
    target_range: (f64, f64),
    output_path: &Path,
) -> crate::Result<()> {
    draw_scatter(actual, predicted, target_range, output_path).map_err(display_error)?;
    info!(path = %output_path.display(), "actual vs predicted plot saved");
    Ok(())
}

fn draw_scatter(
    actual: &Array1<f64>,
    predicted: &Array1<f64>,
    target_range: (f64, f64),
    output_path: &Path,
) -> DrawResult<()> {
    let (lo, hi) = actual
        .iter()
        .chain(predicted.iter())
        .chain([target_range.0, target_range.1].iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return Err("no finite values to plot".into());
    }
    let pad = ((hi - lo) * 0.05).max(1.0);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Actual vs Predicted Price (Random Forest)", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((lo - pad)..(hi + pad), (lo - pad)..(hi + pad))?;

    chart
        .configure_mesh()
        .x_desc("Actual Price")
        .y_desc("Predicted Price")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        actual
            .iter()
            .zip(predicted.iter())
            .map(|(&a, &p)| Circle::new((a, p), 4, BLUE.mix(0.6).filled())),
    )?;

    chart.draw_series(DashedLineSeries::new(
        vec![
            (target_range.0, target_range.0),
            (target_range.1, target_range.1),
        ],
        8,
        6,
        RED.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}

/// Horizontal bar chart of the forest's feature importances
///
/// Bars follow the feature order of the training matrix, first feature on top.
pub fn create_feature_importance_chart(
    model: &RandomForestRegressor,
    output_path: &Path,
) -> crate::Result<()> {
    draw_importances(model.feature_names(), model.feature_importances(), output_path)
        .map_err(display_error)?;
    info!(path = %output_path.display(), "feature importance chart saved");
    Ok(())
}

fn draw_importances(names: &[String], importances: &[f64], output_path: &Path) -> DrawResult<()> {
    let n = names.len() as i32;
    if n == 0 {
        return Err("model has no features".into());
    }
    let max_importance = importances.iter().copied().fold(0.0, f64::max).max(1e-3);
    // A single bar still needs a non-empty axis range
    let last_segment = (n - 1).max(1);

    let root = BitMapBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Feature Importance (Random Forest)", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(160)
        .build_cartesian_2d(0f64..(max_importance * 1.1), (0..last_segment).into_segmented())?;

    let y_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) if (0..n).contains(i) => names[(n - 1 - i) as usize].clone(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n as usize)
        .y_label_formatter(&y_label)
        .x_desc("Importance Score")
        .y_desc("Features")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        Histogram::horizontal(&chart)
            .style(BLUE.mix(0.7).filled())
            .margin(4)
            .data(
                importances
                    .iter()
                    .enumerate()
                    .map(|(i, &imp)| (n - 1 - i as i32, imp)),
            ),
    )?;

    root.present()?;
    Ok(())
}
