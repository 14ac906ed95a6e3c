use chrono::{Datelike, Duration, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Columns coerced to integers; anything non-numeric (including empty) becomes 0.
pub const INTEGER_COLUMNS: [&str; 7] = [
    "COVID",
    "INFLUENZA",
    "RSV",
    "PNEUMOKOKKEN",
    "SONSTIGE",
    "AUFNAHMEN",
    "BEV_ZAHL",
];

pub const WEEK_COLUMN: &str = "KW";

const DATE_KEY: &str = "date";

#[derive(Debug, Error)]
pub enum SariError {
    #[error("SARI feed has no header row")]
    MissingHeader,
    #[error("SARI feed has no data rows")]
    NoRows,
    #[error("SARI CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SariRow {
    pub fields: Vec<(String, Field)>,
    /// Monday of the row's week; `None` when the week label does not parse.
    pub date: Option<NaiveDate>,
}

impl SariRow {
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, field)| field)
    }

    fn has_week_column(&self) -> bool {
        self.get(WEEK_COLUMN).is_some()
    }
}

impl Serialize for SariRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let date = self
            .has_week_column()
            .then(|| self.date.map(|d| d.format("%Y-%m-%d").to_string()));
        for (name, field) in &self.fields {
            match &date {
                // A feed's own `date` column is replaced in place.
                Some(date) if name == DATE_KEY => map.serialize_entry(name, date)?,
                _ => map.serialize_entry(name, field)?,
            }
        }
        if let Some(date) = &date {
            if self.get(DATE_KEY).is_none() {
                map.serialize_entry(DATE_KEY, date)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SariTable {
    pub columns: Vec<String>,
    pub rows: Vec<SariRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SariDocument<'a> {
    pub source: &'a str,
    pub description: String,
    pub fetched_at: String,
    pub columns: &'a [String],
    pub row_count: usize,
    pub data: &'a [SariRow],
}

impl<'a> SariDocument<'a> {
    pub fn new(source: &'a str, name: &str, fetched_at: String, table: &'a SariTable) -> Self {
        Self {
            source,
            description: format!("SARI {name} data"),
            fetched_at,
            columns: &table.columns,
            row_count: table.rows.len(),
            data: &table.rows,
        }
    }
}

/// Decodes a feed. Rows whose field count differs from the header are skipped.
pub fn parse_sari(text: &str) -> Result<SariTable, SariError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(clean).collect();
    if columns.iter().all(String::is_empty) {
        return Err(SariError::MissingHeader);
    }

    let mut records = 0usize;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        records += 1;
        if record.len() != columns.len() {
            continue;
        }

        let mut date = None;
        let fields = columns
            .iter()
            .zip(record.iter())
            .map(|(name, raw)| {
                let value = clean(raw);
                if name == WEEK_COLUMN {
                    date = week_label_to_date(&value);
                }
                let field = if INTEGER_COLUMNS.contains(&name.as_str()) {
                    Field::Int(value.parse().unwrap_or(0))
                } else {
                    Field::Text(value)
                };
                (name.clone(), field)
            })
            .collect();
        rows.push(SariRow { fields, date });
    }

    if records == 0 {
        return Err(SariError::NoRows);
    }
    Ok(SariTable { columns, rows })
}

fn clean(raw: &str) -> String {
    raw.trim().replace('"', "")
}

/// Monday of ISO week `nn` for labels like `19. KW 2023`.
///
/// Week 1 is the week containing January 4th; later weeks are plain 7-day offsets from its
/// Monday, so out-of-range week numbers run into the neighbouring year.
pub fn week_label_to_date(label: &str) -> Option<NaiveDate> {
    let (week, rest) = leading_number(label)?;
    let rest = rest.strip_prefix('.')?.trim_start();
    let rest = rest.strip_prefix("KW")?.trim_start();
    let (year, _) = leading_number(rest)?;
    iso_week_monday(i32::try_from(year).ok()?, u32::try_from(week).ok()?)
}

pub fn iso_week_monday(year: i32, week: u32) -> Option<NaiveDate> {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)?;
    let week1 = jan4 - Duration::days(i64::from(jan4.weekday().num_days_from_monday()));
    week1.checked_add_signed(Duration::weeks(i64::from(week) - 1))
}

fn leading_number(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let (digits, rest) = s.split_at(end);
    Some((digits.parse().ok()?, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_label_parsing_accepts_loose_spacing() {
        assert_eq!(
            NaiveDate::from_ymd_opt(2023, 5, 8),
            week_label_to_date("19.KW2023")
        );
        assert_eq!(None, week_label_to_date("KW 19 2023"));
        assert_eq!(None, week_label_to_date("19 KW 2023"));
    }
}
