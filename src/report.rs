//! Diagnostic charts for the modeling stage, rendered to SVG.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{PipelineError, Result};

fn chart_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Unexpected(format!("chart rendering failed: {e}"))
}

/// Render one or more ROC curves with the chance diagonal.
///
/// Each curve is a `(label, points)` pair as produced by
/// [`roc_curve`](crate::analysis::metrics::roc_curve).
pub fn roc_chart(
    path: impl AsRef<Path>,
    title: &str,
    curves: &[(String, Vec<(f32, f32)>)],
) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..1f32, 0f32..1f32)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .draw()
        .map_err(chart_err)?;

    for (i, (label, points)) in curves.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))
            .map_err(chart_err)?
            .label(label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .draw_series(LineSeries::new(
            [(0.0f32, 0.0f32), (1.0, 1.0)],
            BLACK.stroke_width(1),
        ))
        .map_err(chart_err)?
        .label("Random Guessing")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .position(SeriesLabelPosition::LowerRight)
        .draw()
        .map_err(chart_err)?;
    root.present().map_err(chart_err)?;
    Ok(())
}

/// Render the distribution of sentiment scores as a binned histogram.
pub fn score_histogram(
    path: impl AsRef<Path>,
    title: &str,
    scores: &[f32],
    bins: usize,
) -> Result<()> {
    if scores.is_empty() || bins == 0 {
        return Err(PipelineError::Configuration(
            "histogram needs scores and at least one bin".to_string(),
        ));
    }

    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = if max > min { max - min } else { 1.0 };
    let width = span / bins as f32;

    let mut counts = vec![0usize; bins];
    for &score in scores {
        let bin = (((score - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    let tallest = counts.iter().copied().max().unwrap_or(1) as f32;

    let root = SVGBackend::new(path.as_ref(), (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(min..max, 0f32..tallest * 1.05)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Sentiment Score")
        .y_desc("Frequency")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = min + i as f32 * width;
            let x1 = x0 + width;
            Rectangle::new([(x0, 0.0), (x1, count as f32)], BLUE.mix(0.6).filled())
        }))
        .map_err(chart_err)?;
    root.present().map_err(chart_err)?;
    Ok(())
}
