use crate::extract::extract_chart;
use anyhow::Result;
use sentinel_core::layout::ChartLayout;
use sentinel_core::model::{ChartDocument, ColorScale};
use sentinel_core::report::Warning;
use tracing::{debug, warn};

pub fn calibrate_color_scale(svg: &str, layout: &ChartLayout) -> Result<ColorScale> {
    let doc = extract_chart(svg)?;
    Ok(calibrate(&doc, layout, &mut Vec::new()))
}

/// Derives the color scale from the named gradient and the colorbar tick labels.
///
/// The value range is re-read on every run since the colorbar grows with case counts; only
/// the stop colors are assumed stable. A missing gradient yields no stops (all values read as
/// 0), missing ticks fall back to the layout's default range. Both are reported in `warnings`.
pub fn calibrate(doc: &ChartDocument, layout: &ChartLayout, warnings: &mut Vec<Warning>) -> ColorScale {
    let stops = match doc.gradient(&layout.gradient_id) {
        Some(g) => g.stops.clone(),
        None => {
            warn!(id = %layout.gradient_id, "colorbar gradient not found");
            warnings.push(Warning::new(
                "gradient_missing",
                format!("No gradient with id '{}'; heatmap values default to 0.", layout.gradient_id),
            ));
            Vec::new()
        }
    };

    let ticks: Vec<i64> = doc
        .labels
        .iter()
        .filter(|l| l.x > layout.colorbar_x_min)
        .filter_map(|l| l.numeric_value())
        .collect();

    let (min_value, max_value) = match (ticks.iter().min(), ticks.iter().max()) {
        (Some(&min), Some(&max)) => (min as f64, max as f64),
        _ => {
            warn!("no colorbar tick labels; using default range");
            warnings.push(Warning::new(
                "colorbar_range_default",
                format!(
                    "No numeric colorbar labels; assuming range {}-{}.",
                    layout.default_min_value, layout.default_max_value
                ),
            ));
            (layout.default_min_value, layout.default_max_value)
        }
    };

    debug!(stops = stops.len(), min_value, max_value, "calibrated colorbar");
    ColorScale {
        stops,
        min_value,
        max_value,
    }
}
