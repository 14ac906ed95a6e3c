use crate::extract::extract_chart;
use crate::labels::{index_by, numeric_ticks};
use anyhow::Result;
use itertools::Itertools;
use sentinel_core::geom::{argmin_by, distinct_sorted, nearest_index, position_of, round1};
use sentinel_core::layout::ChartLayout;
use sentinel_core::model::{BarSegment, ChartDocument, Rect};
use sentinel_core::report::Warning;
use sentinel_core::week::{parse_week_label, weeks_from_anchor, WeekKey};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BarChartReconstruction {
    pub segments: Vec<BarSegment>,
    pub secondary: BTreeMap<WeekKey, f64>,
    /// Upper-cased fill -> virus name.
    pub legend: BTreeMap<String, String>,
    pub warnings: Vec<Warning>,
}

/// Linear calibration of one value axis. y grows downward, so `baseline_y` is where the
/// axis reads 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub pixels_per_unit: f64,
    pub baseline_y: f64,
}

pub fn parse_bar_chart(svg: &str, layout: &ChartLayout) -> Result<BarChartReconstruction> {
    let doc = extract_chart(svg)?;
    Ok(reconstruct_bar_chart(&doc, layout))
}

/// Color -> virus map read from the legend swatches in the header band.
///
/// Each swatch takes the nearest label to its right whose baseline sits within the layout's
/// vertical offset band below the swatch top. The secondary series entry is always present.
pub fn legend_colors(doc: &ChartDocument, layout: &ChartLayout) -> BTreeMap<String, String> {
    let header_labels: Vec<_> = doc
        .labels
        .iter()
        .filter(|l| l.y < layout.header_y_max)
        .collect();

    let mut legend = BTreeMap::new();
    for swatch in doc
        .rects()
        .filter(|r| layout.is_legend_swatch(r.width, r.height, r.y))
    {
        let candidates: Vec<_> = header_labels
            .iter()
            .filter(|l| {
                let dy = l.y - swatch.y;
                l.x > swatch.x && layout.legend_text_dy_min <= dy && dy <= layout.legend_text_dy_max
            })
            .collect();
        if let Some(i) = argmin_by(&candidates, |l| l.x - swatch.x) {
            let name = candidates[i].content.replace(' ', "_").replace('.', "");
            legend.insert(swatch.fill.clone(), name);
        }
    }

    legend.insert(
        layout.secondary_color.to_ascii_uppercase(),
        layout.secondary_label.clone(),
    );
    legend
}

/// Two-point linear calibration from the first two ticks (by y). `None` when there are fewer
/// than two ticks or they carry the same value.
pub fn axis_pixels_per_unit(ticks: &[(f64, i64)]) -> Option<f64> {
    let [(y0, v0), (y1, v1), ..] = ticks else {
        return None;
    };
    let dv = (v1 - v0).abs() as f64;
    if dv == 0.0 {
        return None;
    }
    Some((y1 - y0).abs() / dv)
}

/// One week per distinct bar x: the bar nearest the leftmost week label carries that label's
/// week and the others count outward from it.
pub fn reconstruct_bar_chart(doc: &ChartDocument, layout: &ChartLayout) -> BarChartReconstruction {
    let mut warnings = Vec::new();

    let legend = legend_colors(doc, layout);
    if legend.len() <= 1 {
        warnings.push(Warning::new("legend_empty", "No legend swatches were matched to labels."));
    }

    let primary = primary_axis(doc, layout, &mut warnings);
    let secondary_axis = secondary_axis(doc, layout, &mut warnings);

    let bars: Vec<&Rect> = doc
        .rects()
        .filter(|r| {
            layout.is_bar_width(r.width)
                && r.height > 0.0
                && r.y > layout.header_y_max
                && !layout.is_background_fill(&r.fill)
                && !layout.is_secondary_fill(&r.fill)
        })
        .sorted_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        .collect();
    let bar_xs = distinct_sorted(bars.iter().map(|r| r.x));

    let weeks = bar_weeks(doc, &bar_xs, layout, &mut warnings);
    let week_at = |i: usize| -> WeekKey {
        weeks
            .get(i)
            .cloned()
            .unwrap_or_else(|| WeekKey::new(format!("x={:?}", bar_xs[i])))
    };

    let mut unknown = BTreeSet::new();
    let mut segments = Vec::with_capacity(bars.len());
    for rect in &bars {
        let Some(i) = position_of(&bar_xs, rect.x) else {
            continue;
        };
        let virus = match legend.get(&rect.fill) {
            Some(name) => name.clone(),
            None => {
                unknown.insert(rect.fill.clone());
                format!("unknown_{}", rect.fill)
            }
        };
        segments.push(BarSegment {
            week: week_at(i),
            virus,
            value: round1(rect.height / primary.pixels_per_unit),
            color: rect.fill.clone(),
        });
    }
    if !unknown.is_empty() {
        warn!(?unknown, "bar colors missing from legend");
        warnings.push(Warning::new(
            "unknown_color",
            format!("Bar colors without legend entry: {}", unknown.iter().join(", ")),
        ));
    }

    let mut secondary = BTreeMap::new();
    let cutoff = secondary_axis.baseline_y - layout.baseline_tolerance;
    for poly in doc.polygons().filter(|p| layout.is_secondary_fill(&p.fill)) {
        // Vertices on the baseline only close the polygon.
        for point in poly.points.iter().filter(|p| p.y < cutoff) {
            let value = round1((secondary_axis.baseline_y - point.y) / secondary_axis.pixels_per_unit);
            if let Some(i) = nearest_index(&bar_xs, point.x) {
                secondary.insert(week_at(i), value);
            }
        }
    }

    debug!(
        segments = segments.len(),
        bars = bar_xs.len(),
        secondary = secondary.len(),
        "reconstructed bar chart"
    );
    BarChartReconstruction {
        segments,
        secondary,
        legend,
        warnings,
    }
}

fn primary_axis(doc: &ChartDocument, layout: &ChartLayout, warnings: &mut Vec<Warning>) -> AxisScale {
    let ticks = numeric_ticks(doc.labels.iter().filter(|l| l.x < layout.left_axis_x_max));
    let pixels_per_unit = axis_pixels_per_unit(&ticks).unwrap_or_else(|| {
        warn!(ticks = ticks.len(), "left axis not calibrated; using unit scale");
        warnings.push(Warning::new(
            "primary_axis_unit_scale",
            "Left axis ticks unusable; bar heights read as 1 px per detection.",
        ));
        1.0
    });
    AxisScale {
        pixels_per_unit,
        baseline_y: ticks.last().map_or(layout.default_baseline_y, |(y, _)| *y),
    }
}

fn secondary_axis(doc: &ChartDocument, layout: &ChartLayout, warnings: &mut Vec<Warning>) -> AxisScale {
    let ticks = numeric_ticks(doc.labels.iter().filter(|l| l.x > layout.colorbar_x_min));
    if ticks.len() < 2 {
        warn!(ticks = ticks.len(), "right axis not calibrated; using defaults");
        warnings.push(Warning::new(
            "secondary_axis_default",
            format!(
                "Right axis ticks missing; assuming baseline y={} and 1 px per unit.",
                layout.default_baseline_y
            ),
        ));
        return AxisScale {
            pixels_per_unit: 1.0,
            baseline_y: layout.default_baseline_y,
        };
    }

    // Lowest tick on screen reads 0.
    let baseline_y = ticks.last().map_or(layout.default_baseline_y, |(y, _)| *y);
    let pixels_per_unit = axis_pixels_per_unit(&ticks).unwrap_or_else(|| {
        warnings.push(Warning::new(
            "secondary_axis_unit_scale",
            "Right axis ticks carry equal values; using 1 px per unit.",
        ));
        1.0
    });
    AxisScale {
        pixels_per_unit,
        baseline_y,
    }
}

fn bar_weeks(
    doc: &ChartDocument,
    bar_xs: &[f64],
    layout: &ChartLayout,
    warnings: &mut Vec<Warning>,
) -> Vec<WeekKey> {
    if bar_xs.is_empty() {
        return Vec::new();
    }
    let week_labels = index_by(
        doc.labels
            .iter()
            .filter(|l| l.content.contains(layout.week_marker.as_str())),
        |l| l.x,
    );
    // Labels sit slightly right of their bar and only on every other column.
    let weeks = week_labels.first().and_then(|(x, l)| {
        let (week, year) = parse_week_label(&l.content)?;
        let anchor_index = nearest_index(bar_xs, *x).unwrap_or(0);
        weeks_from_anchor(bar_xs.len(), anchor_index, week, year, layout.weeks_per_year)
    });
    let Some(weeks) = weeks else {
        warn!("bar chart week labels unreadable; keying bars by x");
        warnings.push(Warning::new(
            "unlabeled_bars",
            "No readable week label; bars are keyed by x coordinate.",
        ));
        return Vec::new();
    };
    weeks
}
