use sentinel_core::dataset::{Dataset, Orientation};
use sentinel_core::merge::merge;
use sentinel_core::model::{BarSegment, HeatmapCell};
use sentinel_core::week::WeekKey;
use std::collections::BTreeMap;

fn cell(virus: &str, week: &str, value: f64) -> HeatmapCell {
    HeatmapCell {
        virus: virus.to_string(),
        week: WeekKey::new(week),
        value,
        color: "#FF0000".to_string(),
    }
}

fn heatmap(cells: &[HeatmapCell]) -> Dataset {
    Dataset::from_heatmap_cells(cells, "heatmap.svg", "Heatmap", Some("0-120 (Fallzahl)".into()))
}

#[test]
fn absent_history_returns_fresh() {
    let fresh = heatmap(&[cell("RSV", "KW10/2025", 12.0)]);
    assert_eq!(fresh.clone(), merge(fresh, None));
}

#[test]
fn merging_with_itself_is_identity() {
    let ds = heatmap(&[
        cell("RSV", "KW10/2025", 12.0),
        cell("Influenza", "KW11/2025", 30.5),
        cell("RSV", "KW52/2024", 1.0),
    ]);
    assert_eq!(ds.clone(), merge(ds.clone(), Some(ds)));

    let mut secondary = BTreeMap::new();
    secondary.insert(WeekKey::new("KW10/2025"), 250.0);
    let bars = Dataset::from_bar_segments(
        &[BarSegment {
            week: WeekKey::new("KW10/2025"),
            virus: "RSV".to_string(),
            value: 4.0,
            color: "#123456".to_string(),
        }],
        &secondary,
        "bar.svg",
        "Bars",
    );
    assert_eq!(bars.clone(), merge(bars.clone(), Some(bars)));
}

#[test]
fn fresh_values_win_on_overlap() {
    let old = heatmap(&[cell("RSV", "KW09/2025", 5.0), cell("RSV", "KW10/2025", 7.0)]);
    let fresh = heatmap(&[cell("RSV", "KW10/2025", 20.0), cell("RSV", "KW11/2025", 25.0)]);

    let merged = merge(fresh, Some(old));
    let rsv = |w: &str| merged.value("RSV", &WeekKey::new(w));
    assert_eq!(5.0, rsv("KW09/2025"));
    assert_eq!(20.0, rsv("KW10/2025"));
    assert_eq!(25.0, rsv("KW11/2025"));
}

#[test]
fn unions_weeks_chronologically_and_viruses_lexicographically() {
    let old = heatmap(&[cell("RSV", "KW51/2024", 1.0), cell("Corona", "KW02/2025", 2.0)]);
    let fresh = heatmap(&[cell("Adeno", "KW01/2025", 3.0), cell("RSV", "KW02/2025", 4.0)]);

    let merged = merge(fresh, Some(old));
    let weeks: Vec<_> = merged.weeks.iter().map(WeekKey::as_str).collect();
    assert_eq!(vec!["KW51/2024", "KW01/2025", "KW02/2025"], weeks);
    let viruses: Vec<_> = merged.viruses.iter().map(String::as_str).collect();
    assert_eq!(vec!["Adeno", "Corona", "RSV"], viruses);
    assert_eq!(2.0, merged.value("Corona", &WeekKey::new("KW02/2025")));
}

#[test]
fn merges_secondary_series_with_fresh_precedence() {
    let mut old = Dataset::new(Orientation::WeekMajor, "bar.svg", "old");
    old.insert("RSV", &WeekKey::new("KW01/2025"), 1.0);
    old.secondary = Some(BTreeMap::from([
        (WeekKey::new("KW01/2025"), 100.0),
        (WeekKey::new("KW02/2025"), 110.0),
    ]));

    let mut fresh = Dataset::new(Orientation::WeekMajor, "bar.svg", "fresh");
    fresh.insert("RSV", &WeekKey::new("KW02/2025"), 2.0);
    fresh.secondary = Some(BTreeMap::from([(WeekKey::new("KW02/2025"), 150.0)]));

    let merged = merge(fresh, Some(old));
    let secondary = merged.secondary.expect("secondary series");
    assert_eq!(Some(&100.0), secondary.get(&WeekKey::new("KW01/2025")));
    assert_eq!(Some(&150.0), secondary.get(&WeekKey::new("KW02/2025")));
    assert_eq!("fresh", merged.description);
}

#[test]
fn keeps_persisted_scale_when_fresh_has_none() {
    let old = heatmap(&[cell("RSV", "KW01/2025", 1.0)]);
    let fresh = Dataset::from_heatmap_cells(&[cell("RSV", "KW02/2025", 2.0)], "s", "d", None);
    let merged = merge(fresh, Some(old));
    assert_eq!(Some("0-120 (Fallzahl)"), merged.scale.as_deref());
}

#[test]
fn ignores_history_with_other_orientation() {
    let fresh = heatmap(&[cell("RSV", "KW10/2025", 12.0)]);
    let mut old = Dataset::new(Orientation::WeekMajor, "bar.svg", "bars");
    old.insert("Influenza", &WeekKey::new("KW01/2025"), 3.0);
    assert_eq!(fresh.clone(), merge(fresh, Some(old)));
}
