use sentinel_core::model::TextLabel;
use std::cmp::Ordering;

/// Labels keyed by one coordinate, ascending. When several labels share a coordinate the one
/// appearing last in the document is kept.
pub(crate) fn index_by<'a>(
    labels: impl IntoIterator<Item = &'a TextLabel>,
    key: impl Fn(&TextLabel) -> f64,
) -> Vec<(f64, &'a TextLabel)> {
    let mut keyed: Vec<(f64, &TextLabel)> = labels.into_iter().map(|l| (key(l), l)).collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut out: Vec<(f64, &TextLabel)> = Vec::with_capacity(keyed.len());
    for (k, label) in keyed {
        match out.last_mut() {
            Some(last) if last.0 == k => last.1 = label,
            _ => out.push((k, label)),
        }
    }
    out
}

pub(crate) fn numeric_ticks<'a>(
    labels: impl IntoIterator<Item = &'a TextLabel>,
) -> Vec<(f64, i64)> {
    let numeric: Vec<&TextLabel> = labels.into_iter().filter(|l| l.is_numeric()).collect();
    index_by(numeric, |l| l.y)
        .into_iter()
        .filter_map(|(y, l)| l.numeric_value().map(|v| (y, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(x: f64, y: f64, content: &str) -> TextLabel {
        TextLabel {
            x,
            y,
            content: content.to_string(),
            rotated: false,
        }
    }

    #[test]
    fn later_label_wins_on_shared_key() {
        let labels = vec![label(0.0, 20.0, "b"), label(0.0, 10.0, "a"), label(5.0, 20.0, "c")];
        let keyed = index_by(&labels, |l| l.y);
        let contents: Vec<_> = keyed.iter().map(|(_, l)| l.content.as_str()).collect();
        assert_eq!(vec!["a", "c"], contents);
    }

    #[test]
    fn ticks_skip_non_numeric() {
        let labels = vec![label(0.0, 300.0, "0"), label(0.0, 200.0, "N"), label(0.0, 100.0, "50")];
        assert_eq!(vec![(100.0, 50), (300.0, 0)], numeric_ticks(&labels));
    }
}
