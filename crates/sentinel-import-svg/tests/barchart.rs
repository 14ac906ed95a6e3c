use sentinel_core::dataset::Dataset;
use sentinel_core::layout::ChartLayout;
use sentinel_core::week::WeekKey;
use sentinel_import_svg::barchart::axis_pixels_per_unit;
use sentinel_import_svg::{extract_chart, parse_bar_chart, reconstruct_bar_chart};

const LEGEND: &str = r##"
  <rect x="100" y="20" width="12" height="12" fill="#ff0000"/>
  <text x="116" y="32">RSV</text>
  <rect x="200" y="20" width="12" height="12" fill="#00FF00"/>
  <text x="216" y="32">Influenza A.</text>
  <rect x="300" y="20" width="12" height="12" fill="#E4E4E4"/>
  <text x="316" y="32">Einsendungen</text>"##;

const AXES: &str = r##"
  <text x="40" y="360">0</text>
  <text x="40" y="260">50</text>
  <text x="720" y="360">0</text>
  <text x="720" y="160">200</text>"##;

const BARS: &str = r##"
  <rect x="60" y="70" width="640" height="290" fill="white"/>
  <polygon fill="#e4e4e4" points="80,360 80,260 100,240 120,300 120,360"/>
  <rect x="80" y="340" width="10" height="20" fill="#FF0000"/>
  <rect x="80" y="330" width="10" height="10" fill="#00ff00"/>
  <rect x="100" y="320" width="10" height="40" fill="#FF0000"/>
  <rect x="120" y="354" width="10" height="6" fill="#0000FF"/>
  <text x="102" y="380" transform="rotate(-45 102 380)">KW08/2025</text>"##;

fn chart(parts: &[&str]) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="400">{}</svg>"##,
        parts.concat()
    )
}

#[test]
fn reads_legend_next_to_swatches() {
    let doc = extract_chart(&chart(&[LEGEND])).expect("parse");
    let legend = sentinel_import_svg::barchart::legend_colors(&doc, &ChartLayout::default());
    assert_eq!(Some("RSV"), legend.get("#FF0000").map(String::as_str));
    assert_eq!(Some("Influenza_A"), legend.get("#00FF00").map(String::as_str));
    assert_eq!(Some("Einsendungen"), legend.get("#E4E4E4").map(String::as_str));
}

#[test]
fn reconstructs_segments_and_secondary_series() {
    let out = parse_bar_chart(&chart(&[LEGEND, AXES, BARS]), &ChartLayout::default()).expect("bars");

    let find = |week: &str, virus: &str| {
        out.segments
            .iter()
            .find(|s| s.week.as_str() == week && s.virus == virus)
            .map(|s| s.value)
    };
    assert_eq!(4, out.segments.len());
    assert_eq!(Some(10.0), find("KW07/2025", "RSV"));
    assert_eq!(Some(5.0), find("KW07/2025", "Influenza_A"));
    assert_eq!(Some(20.0), find("KW08/2025", "RSV"));
    assert_eq!(Some(3.0), find("KW09/2025", "unknown_#0000FF"));

    let secondary: Vec<_> = out
        .secondary
        .iter()
        .map(|(w, v)| (w.as_str(), *v))
        .collect();
    assert_eq!(
        vec![("KW07/2025", 100.0), ("KW08/2025", 120.0), ("KW09/2025", 60.0)],
        secondary
    );
    assert!(out.warnings.iter().any(|w| w.code == "unknown_color"));
    assert!(!out.warnings.iter().any(|w| w.code.contains("axis")));
}

#[test]
fn assembles_week_major_dataset() {
    let out = parse_bar_chart(&chart(&[LEGEND, AXES, BARS]), &ChartLayout::default()).expect("bars");
    let ds = Dataset::from_bar_segments(&out.segments, &out.secondary, "bar.svg", "Bars");
    assert_eq!(3, ds.weeks.len());
    assert_eq!(0.0, ds.value("Influenza_A", &WeekKey::new("KW08/2025")));
    assert_eq!(
        Some(&60.0),
        ds.secondary.as_ref().and_then(|s| s.get(&WeekKey::new("KW09/2025")))
    );
}

#[test]
fn falls_back_to_unit_scale_and_default_baseline() {
    let out = reconstruct_bar_chart(
        &extract_chart(&chart(&[LEGEND, BARS])).expect("parse"),
        &ChartLayout::default(),
    );
    let rsv = out
        .segments
        .iter()
        .find(|s| s.week.as_str() == "KW08/2025")
        .expect("segment");
    assert_eq!(40.0, rsv.value);
    // Default baseline 360 at 1 px per unit.
    assert_eq!(Some(&120.0), out.secondary.get(&WeekKey::new("KW08/2025")));

    let codes: Vec<_> = out.warnings.iter().map(|w| w.code.as_str()).collect();
    assert!(codes.contains(&"primary_axis_unit_scale"));
    assert!(codes.contains(&"secondary_axis_default"));
}

#[test]
fn keys_bars_by_x_without_week_labels() {
    let bars = BARS.replace("KW08/2025", "Woche 8");
    let out = parse_bar_chart(&chart(&[LEGEND, AXES, &bars]), &ChartLayout::default()).expect("bars");
    assert!(out.segments.iter().all(|s| s.week.as_str().starts_with("x=")));
    assert!(out.segments.iter().any(|s| s.week.as_str() == "x=80.0"));
    assert!(out.warnings.iter().any(|w| w.code == "unlabeled_bars"));
}

#[test]
fn two_point_axis_calibration() {
    assert_eq!(Some(2.0), axis_pixels_per_unit(&[(260.0, 50), (360.0, 0)]));
    assert_eq!(None, axis_pixels_per_unit(&[(260.0, 50)]));
    assert_eq!(None, axis_pixels_per_unit(&[(260.0, 5), (360.0, 5)]));
}

#[test]
fn secondary_vertices_within_tolerance_of_baseline_are_dropped() {
    let body = r##"
  <polygon fill="#E4E4E4" points="80,360 100,359.5 120,358.9 120,360"/>
  <rect x="80" y="340" width="10" height="20" fill="#FF0000"/>
  <rect x="100" y="340" width="10" height="20" fill="#FF0000"/>
  <rect x="120" y="340" width="10" height="20" fill="#FF0000"/>
  <text x="102" y="380">KW08/2025</text>"##;
    let out = parse_bar_chart(&chart(&[LEGEND, AXES, body]), &ChartLayout::default()).expect("bars");

    let secondary: Vec<_> = out
        .secondary
        .iter()
        .map(|(w, v)| (w.as_str(), *v))
        .collect();
    assert_eq!(vec![("KW09/2025", 1.1)], secondary);
}

#[test]
fn legend_text_offset_bounds_are_inclusive() {
    let legend = r##"
  <rect x="100" y="20" width="12" height="12" fill="#FF0000"/>
  <text x="116" y="28">Oben</text>
  <rect x="200" y="20" width="12" height="12" fill="#00FF00"/>
  <text x="216" y="36">Unten</text>
  <rect x="300" y="20" width="12" height="12" fill="#0000FF"/>
  <text x="316" y="37">Zu tief</text>"##;
    let doc = extract_chart(&chart(&[legend])).expect("parse");
    let legend = sentinel_import_svg::barchart::legend_colors(&doc, &ChartLayout::default());
    assert_eq!(Some("Oben"), legend.get("#FF0000").map(String::as_str));
    assert_eq!(Some("Unten"), legend.get("#00FF00").map(String::as_str));
    assert_eq!(None, legend.get("#0000FF"));
}

#[test]
fn bar_width_bounds_are_exclusive() {
    let body = r##"
  <rect x="80" y="340" width="5" height="20" fill="#FF0000"/>
  <rect x="100" y="340" width="15" height="20" fill="#FF0000"/>
  <rect x="120" y="340" width="5.5" height="20" fill="#FF0000"/>
  <rect x="140" y="340" width="14.5" height="20" fill="#FF0000"/>
  <text x="122" y="380">KW08/2025</text>"##;
    let out = parse_bar_chart(&chart(&[LEGEND, AXES, body]), &ChartLayout::default()).expect("bars");

    let weeks: Vec<_> = out.segments.iter().map(|s| s.week.as_str()).collect();
    assert_eq!(vec!["KW08/2025", "KW09/2025"], weeks);
}
