use crate::calibrate::calibrate;
use crate::extract::extract_chart;
use crate::labels::index_by;
use anyhow::{bail, Result};
use sentinel_core::geom::{argmin_by, distinct_sorted, position_of};
use sentinel_core::layout::ChartLayout;
use sentinel_core::model::{ChartDocument, ColorScale, HeatmapCell, TextLabel};
use sentinel_core::report::Warning;
use sentinel_core::week::{parse_week_label, weeks_from_anchor, WeekKey};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HeatmapReconstruction {
    pub cells: Vec<HeatmapCell>,
    pub scale: ColorScale,
    pub warnings: Vec<Warning>,
}

pub fn parse_heatmap(svg: &str, layout: &ChartLayout) -> Result<HeatmapReconstruction> {
    let doc = extract_chart(svg)?;
    let mut warnings = Vec::new();
    let scale = calibrate(&doc, layout, &mut warnings);
    let cells = reconstruct_heatmap(&doc, &scale, layout, &mut warnings)?;
    Ok(HeatmapReconstruction {
        cells,
        scale,
        warnings,
    })
}

/// One cell per rectangle that resolves to both a virus row and a week column.
///
/// Rows: distinct rectangle y values, ascending, are paired index-wise with the virus
/// labels; each row takes the label nearest to `y + row_label_offset`. Columns: distinct
/// rectangle x values, ascending, count forward from the week named by the leftmost rotated
/// week label.
pub fn reconstruct_heatmap(
    doc: &ChartDocument,
    scale: &ColorScale,
    layout: &ChartLayout,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<HeatmapCell>> {
    let virus_labels = index_by(
        doc.labels
            .iter()
            .filter(|l| !l.rotated && layout.is_virus_label_position(l.x, l.y)),
        |l| l.y,
    );
    let week_labels = index_by(
        doc.labels
            .iter()
            .filter(|l| l.rotated && l.content.contains(layout.week_marker.as_str())),
        |l| l.x,
    );

    let rects: Vec<_> = doc.rects().collect();
    let row_ys = distinct_sorted(rects.iter().map(|r| r.y));
    let col_xs = distinct_sorted(rects.iter().map(|r| r.x));

    if row_ys.len() != virus_labels.len() {
        let message = format!(
            "{} rectangle rows but {} virus labels; rows are paired in order.",
            row_ys.len(),
            virus_labels.len()
        );
        if layout.strict_row_match {
            bail!("heatmap row/label mismatch: {message}");
        }
        warn!(rows = row_ys.len(), labels = virus_labels.len(), "heatmap row/label mismatch");
        warnings.push(Warning::new("row_label_mismatch", message));
    }

    let rows: Vec<Option<&str>> = row_ys
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            if i >= virus_labels.len() {
                return None;
            }
            argmin_by(&virus_labels, |(label_y, _)| (label_y - y - layout.row_label_offset).abs())
                .map(|j| virus_labels[j].1.content.as_str())
        })
        .collect();

    let columns = column_weeks(&week_labels, col_xs.len(), layout, warnings);

    let mut cells = Vec::new();
    let mut dropped = 0usize;
    for rect in &rects {
        let virus = position_of(&row_ys, rect.y).and_then(|i| rows[i]);
        let week = position_of(&col_xs, rect.x).and_then(|i| columns.get(i));
        match (virus, week) {
            (Some(virus), Some(week)) => cells.push(HeatmapCell {
                virus: virus.to_string(),
                week: week.clone(),
                value: scale.value_for(&rect.fill),
                color: rect.fill.clone(),
            }),
            _ => dropped += 1,
        }
    }

    debug!(cells = cells.len(), dropped, "reconstructed heatmap");
    Ok(cells)
}

fn column_weeks(
    week_labels: &[(f64, &TextLabel)],
    columns: usize,
    layout: &ChartLayout,
    warnings: &mut Vec<Warning>,
) -> Vec<WeekKey> {
    let Some((_, anchor)) = week_labels.first() else {
        warnings.push(Warning::new("no_week_labels", "No rotated week labels found."));
        return Vec::new();
    };
    // The leftmost label names the leftmost column.
    let weeks = parse_week_label(&anchor.content)
        .and_then(|(week, year)| weeks_from_anchor(columns, 0, week, year, layout.weeks_per_year));
    match weeks {
        Some(weeks) => weeks,
        None => {
            warnings.push(Warning::new(
                "week_anchor_unparsed",
                format!("Cannot read a week from label '{}'.", anchor.content),
            ));
            Vec::new()
        }
    }
}
