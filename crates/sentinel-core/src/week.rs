use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A week label such as `KW08/2025`.
///
/// Ordering is chronological on `(year, week)`. Keys that do not parse sort as `(0, 0)`,
/// i.e. before every well-formed key; among themselves they fall back to string order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(String);

impl WeekKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_parts(week: u32, year: i32) -> Self {
        Self(format!("KW{week:02}/{year}"))
    }

    /// Normalizes `week` into `1..=weeks_per_year`, carrying into `year`.
    pub fn normalized(week: i64, year: i64, weeks_per_year: u32) -> Option<Self> {
        let (week, year) = normalize_week(week, year, weeks_per_year)?;
        Some(Self::from_parts(week, year))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parts(&self) -> Option<(u32, i32)> {
        parse_week_label(&self.0)
    }

    pub fn sort_key(&self) -> (i32, u32) {
        match self.parts() {
            Some((week, year)) => (year, week),
            None => (0, 0),
        }
    }
}

impl Ord for WeekKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for WeekKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WeekKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Parses the leading `KW<week>/<year>` of a label. Trailing text is ignored.
pub fn parse_week_label(label: &str) -> Option<(u32, i32)> {
    let rest = label.strip_prefix("KW")?;
    let (week, rest) = split_digits(rest)?;
    let rest = rest.strip_prefix('/')?;
    let (year, _) = split_digits(rest)?;
    Some((week.parse().ok()?, year.parse().ok()?))
}

fn split_digits(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s.split_at(end))
}

/// Fixed-length year arithmetic: weeks above `weeks_per_year` roll into the next year,
/// weeks below 1 into the previous one. Not calendar-accurate for 53-week ISO years.
///
/// `None` when the resulting year does not fit an `i32`.
pub fn normalize_week(week: i64, year: i64, weeks_per_year: u32) -> Option<(u32, i32)> {
    let wpy = i64::from(weeks_per_year.max(1));
    let zero_based = week.checked_sub(1)?;
    let year = year.checked_add(zero_based.div_euclid(wpy))?;
    let week = zero_based.rem_euclid(wpy) + 1;
    Some((u32::try_from(week).ok()?, i32::try_from(year).ok()?))
}

/// Week keys for `count` consecutive columns where column `anchor_index` carries
/// `(anchor_week, anchor_year)`. `None` if any column falls outside the representable years.
pub fn weeks_from_anchor(
    count: usize,
    anchor_index: usize,
    anchor_week: u32,
    anchor_year: i32,
    weeks_per_year: u32,
) -> Option<Vec<WeekKey>> {
    (0..count)
        .map(|i| {
            let offset = i64::try_from(i).ok()? - i64::try_from(anchor_index).ok()?;
            WeekKey::normalized(
                i64::from(anchor_week) + offset,
                i64::from(anchor_year),
                weeks_per_year,
            )
        })
        .collect()
}
