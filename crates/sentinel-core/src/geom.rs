use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Ascending, de-duplicated copy of `values`. NaN sorts last and is kept once.
pub fn distinct_sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out.dedup();
    out
}

/// Index of the element minimizing `cost`. Ties resolve to the earliest index.
pub fn argmin_by<T>(items: &[T], mut cost: impl FnMut(&T) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, item) in items.iter().enumerate() {
        let c = cost(item);
        match best {
            Some((_, best_cost)) if c >= best_cost => {}
            _ => best = Some((i, c)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the value closest to `target`. Ties resolve to the earliest index.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    argmin_by(values, |v| (v - target).abs())
}

pub fn position_of(sorted: &[f64], value: f64) -> Option<usize> {
    sorted
        .binary_search_by(|probe| probe.partial_cmp(&value).unwrap_or(Ordering::Less))
        .ok()
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_prefers_first_on_tie() {
        assert_eq!(Some(0), nearest_index(&[10.0, 20.0], 15.0));
        assert_eq!(Some(1), nearest_index(&[10.0, 20.0], 16.0));
        assert_eq!(None, nearest_index(&[], 1.0));
    }

    #[test]
    fn distinct_sorted_dedups() {
        let v = distinct_sorted([3.0, 1.0, 3.0, 2.0, 1.0]);
        assert_eq!(vec![1.0, 2.0, 3.0], v);
        assert_eq!(Some(2), position_of(&v, 3.0));
        assert_eq!(None, position_of(&v, 2.5));
    }
}
