use crate::geom::round1;
use crate::model::{BarSegment, HeatmapCell};
use crate::week::WeekKey;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset I/O: {0}")]
    Io(#[from] io::Error),
}

/// Nesting of the serialized `data` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// `data[virus][week]` (heatmap)
    VirusMajor,
    /// `data[week][virus]` (stacked bar chart)
    WeekMajor,
}

/// Values keyed by virus and week, plus an optional per-week secondary series.
///
/// `viruses` and `weeks` always cover every key present in `values`. Combinations absent
/// from `values` read as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub source: String,
    pub description: String,
    pub scale: Option<String>,
    pub orientation: Orientation,
    pub viruses: BTreeSet<String>,
    pub weeks: BTreeSet<WeekKey>,
    pub values: BTreeMap<String, BTreeMap<WeekKey, f64>>,
    pub secondary: Option<BTreeMap<WeekKey, f64>>,
}

impl Dataset {
    pub fn new(
        orientation: Orientation,
        source: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            description: description.into(),
            scale: None,
            orientation,
            viruses: BTreeSet::new(),
            weeks: BTreeSet::new(),
            values: BTreeMap::new(),
            secondary: None,
        }
    }

    pub fn insert(&mut self, virus: &str, week: &WeekKey, value: f64) {
        self.viruses.insert(virus.to_string());
        self.weeks.insert(week.clone());
        self.values
            .entry(virus.to_string())
            .or_default()
            .insert(week.clone(), value);
    }

    pub fn get(&self, virus: &str, week: &WeekKey) -> Option<f64> {
        self.values.get(virus).and_then(|row| row.get(week)).copied()
    }

    pub fn value(&self, virus: &str, week: &WeekKey) -> f64 {
        self.get(virus, week).unwrap_or(0.0)
    }

    pub fn fill_grid(&mut self) {
        for virus in &self.viruses {
            let row = self.values.entry(virus.clone()).or_default();
            for week in &self.weeks {
                row.entry(week.clone()).or_insert(0.0);
            }
        }
    }

    /// Virus-major dataset from heatmap cells. A repeated (virus, week) keeps the last value.
    pub fn from_heatmap_cells(
        cells: &[HeatmapCell],
        source: impl Into<String>,
        description: impl Into<String>,
        scale: Option<String>,
    ) -> Self {
        let mut ds = Self::new(Orientation::VirusMajor, source, description);
        ds.scale = scale;
        for cell in cells {
            ds.insert(&cell.virus, &cell.week, cell.value);
        }
        ds.fill_grid();
        ds
    }

    /// Segments sharing (week, virus) are summed, then rounded to one decimal. The secondary
    /// series is emitted for every week, 0 where the chart had no sample.
    pub fn from_bar_segments(
        segments: &[BarSegment],
        secondary: &BTreeMap<WeekKey, f64>,
        source: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut sums: BTreeMap<(String, WeekKey), f64> = BTreeMap::new();
        for seg in segments {
            *sums
                .entry((seg.virus.clone(), seg.week.clone()))
                .or_insert(0.0) += seg.value;
        }

        let mut ds = Self::new(Orientation::WeekMajor, source, description);
        for ((virus, week), sum) in &sums {
            ds.insert(virus, week, round1(*sum));
        }
        ds.fill_grid();
        ds.secondary = Some(
            ds.weeks
                .iter()
                .map(|w| (w.clone(), secondary.get(w).copied().unwrap_or(0.0)))
                .collect(),
        );
        ds
    }

    /// Decodes the persisted JSON shape. The orientation is not stored in the file and must
    /// be supplied by the caller.
    pub fn from_json(text: &str, orientation: Orientation) -> Result<Self, DatasetError> {
        let file: DatasetFile = serde_json::from_str(text)?;
        let mut ds = Self::new(orientation, file.source, file.description);
        ds.scale = file.scale;
        ds.viruses.extend(file.viruses);
        ds.weeks.extend(file.weeks);
        for (outer, row) in &file.data {
            for (inner, value) in row {
                match orientation {
                    Orientation::VirusMajor => ds.insert(outer, &WeekKey::new(inner.as_str()), *value),
                    Orientation::WeekMajor => ds.insert(inner, &WeekKey::new(outer.as_str()), *value),
                }
            }
        }
        ds.secondary = file.einsendungen;
        Ok(ds)
    }

    pub fn to_json_pretty(&self) -> Result<String, DatasetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Tabular export of the full grid. Virus-major writes one row per virus; week-major one
    /// row per week, followed by the secondary series when present.
    pub fn write_csv<W: io::Write>(&self, out: W) -> Result<(), DatasetError> {
        let mut writer = csv::Writer::from_writer(out);
        match self.orientation {
            Orientation::VirusMajor => {
                let mut header = vec!["Virus".to_string()];
                header.extend(self.weeks.iter().map(|w| w.to_string()));
                writer.write_record(&header)?;
                for virus in &self.viruses {
                    let mut row = vec![virus.clone()];
                    row.extend(self.weeks.iter().map(|w| self.value(virus, w).to_string()));
                    writer.write_record(&row)?;
                }
            }
            Orientation::WeekMajor => {
                let mut header = vec!["Week".to_string()];
                header.extend(self.viruses.iter().cloned());
                if self.secondary.is_some() {
                    header.push("Einsendungen".to_string());
                }
                writer.write_record(&header)?;
                for week in &self.weeks {
                    let mut row = vec![week.to_string()];
                    row.extend(self.viruses.iter().map(|v| self.value(v, week).to_string()));
                    if let Some(secondary) = &self.secondary {
                        row.push(secondary.get(week).copied().unwrap_or(0.0).to_string());
                    }
                    writer.write_record(&row)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    source: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    scale: Option<String>,
    #[serde(default)]
    viruses: Vec<String>,
    #[serde(default)]
    weeks: Vec<WeekKey>,
    #[serde(default)]
    data: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    einsendungen: Option<BTreeMap<WeekKey, f64>>,
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Dataset", 7)?;
        st.serialize_field("source", &self.source)?;
        st.serialize_field("description", &self.description)?;
        match &self.scale {
            Some(scale) => st.serialize_field("scale", scale)?,
            None => st.skip_field("scale")?,
        }
        st.serialize_field("viruses", &self.viruses)?;
        st.serialize_field("weeks", &self.weeks)?;
        st.serialize_field("data", &Grid(self))?;
        match &self.secondary {
            Some(secondary) => st.serialize_field("einsendungen", secondary)?,
            None => st.skip_field("einsendungen")?,
        }
        st.end()
    }
}

struct Grid<'a>(&'a Dataset);

struct VirusRow<'a> {
    dataset: &'a Dataset,
    virus: &'a str,
}

struct WeekRow<'a> {
    dataset: &'a Dataset,
    week: &'a WeekKey,
}

impl Serialize for Grid<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ds = self.0;
        match ds.orientation {
            Orientation::VirusMajor => {
                let mut map = serializer.serialize_map(Some(ds.viruses.len()))?;
                for virus in &ds.viruses {
                    map.serialize_entry(virus, &VirusRow { dataset: ds, virus })?;
                }
                map.end()
            }
            Orientation::WeekMajor => {
                let mut map = serializer.serialize_map(Some(ds.weeks.len()))?;
                for week in &ds.weeks {
                    map.serialize_entry(week, &WeekRow { dataset: ds, week })?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for VirusRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.dataset.weeks.len()))?;
        for week in &self.dataset.weeks {
            map.serialize_entry(week, &self.dataset.value(self.virus, week))?;
        }
        map.end()
    }
}

impl Serialize for WeekRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.dataset.viruses.len()))?;
        for virus in &self.dataset.viruses {
            map.serialize_entry(virus, &self.dataset.value(virus, self.week))?;
        }
        map.end()
    }
}
