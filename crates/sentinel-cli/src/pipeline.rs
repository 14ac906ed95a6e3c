use anyhow::{Context, Result};
use sentinel_core::dataset::Dataset;
use sentinel_core::layout::ChartLayout;
use sentinel_core::report::{RunMetadata, SourceStatus, Warning};
use sentinel_core::sari::{parse_sari, SariDocument};
use sentinel_core::store;
use sentinel_import_svg::{parse_bar_chart, parse_heatmap};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const HEATMAP_SOURCE: &str = "https://viro.meduniwien.ac.at/fileadmin/content/OE/virologie/dokumente/Virus_Epidemiogie/RespiratorischeViren/sentinelHeatmap.svg";
pub const BAR_CHART_SOURCE: &str = "https://viro.meduniwien.ac.at/fileadmin/content/OE/virologie/dokumente/Virus_Epidemiogie/RespiratorischeViren/SentinelGraph.svg";
const HEATMAP_DESCRIPTION: &str = "Virusnachweise im Sentinelsystem - Heatmap data";
const BAR_CHART_DESCRIPTION: &str = "Anzahl der Einsendungen und positiven Virusnachweise";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

pub fn heatmap_dataset(svg: &str, layout: &ChartLayout, source: &str) -> Result<(Dataset, Vec<Warning>)> {
    let out = parse_heatmap(svg, layout)?;
    info!(cells = out.cells.len(), "extracted heatmap cells");
    let ds = Dataset::from_heatmap_cells(
        &out.cells,
        source,
        HEATMAP_DESCRIPTION,
        Some(out.scale.describe()),
    );
    Ok((ds, out.warnings))
}

pub fn bar_chart_dataset(svg: &str, layout: &ChartLayout, source: &str) -> Result<(Dataset, Vec<Warning>)> {
    let out = parse_bar_chart(svg, layout)?;
    info!(
        segments = out.segments.len(),
        secondary = out.secondary.len(),
        "extracted bar segments"
    );
    let ds = Dataset::from_bar_segments(&out.segments, &out.secondary, source, BAR_CHART_DESCRIPTION);
    Ok((ds, out.warnings))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Heatmap,
    BarChart,
}

impl Chart {
    pub fn name(self) -> &'static str {
        match self {
            Chart::Heatmap => "heatmap",
            Chart::BarChart => "barchart",
        }
    }

    pub fn default_source(self) -> &'static str {
        match self {
            Chart::Heatmap => HEATMAP_SOURCE,
            Chart::BarChart => BAR_CHART_SOURCE,
        }
    }
}

/// Reads one chart, reconstructs it and writes the result to `out`.
///
/// JSON output is merged into any dataset already stored at `out`; CSV output holds the
/// fresh reconstruction only.
pub fn process_chart(
    chart: Chart,
    input: &Path,
    out: &Path,
    format: OutputFormat,
    layout: &ChartLayout,
    source: Option<&str>,
) -> Result<SourceStatus> {
    let name = chart.name();
    let svg = std::fs::read_to_string(input).with_context(|| format!("read {name} chart: {input:?}"))?;
    let source = source.unwrap_or_else(|| chart.default_source());
    let (fresh, warnings) = match chart {
        Chart::Heatmap => heatmap_dataset(&svg, layout, source),
        Chart::BarChart => bar_chart_dataset(&svg, layout, source),
    }
    .with_context(|| format!("reconstruct {name} chart: {input:?}"))?;

    for w in &warnings {
        warn!(chart = name, code = %w.code, "{}", w.message);
    }

    let weeks = match format {
        OutputFormat::Json => {
            let fresh_weeks = fresh.weeks.len();
            let merged = store::merge_into(out, fresh).with_context(|| format!("write {name} dataset: {out:?}"))?;
            info!(chart = name, fresh_weeks, total_weeks = merged.weeks.len(), "merged with history");
            merged.weeks.len()
        }
        OutputFormat::Csv => {
            ensure_parent(out)?;
            let file = File::create(out).with_context(|| format!("create {out:?}"))?;
            fresh.write_csv(file).with_context(|| format!("write {name} CSV: {out:?}"))?;
            fresh.weeks.len()
        }
    };
    info!(chart = name, ?out, "saved");
    Ok(SourceStatus::weeks(weeks, warnings))
}

pub fn process_sari(input: &Path, name: &str, out: &Path, source: Option<&str>) -> Result<SourceStatus> {
    let text = std::fs::read_to_string(input).with_context(|| format!("read SARI {name}: {input:?}"))?;
    let table = parse_sari(&text).with_context(|| format!("decode SARI {name}: {input:?}"))?;
    let source = source
        .map(str::to_string)
        .unwrap_or_else(|| input.display().to_string());
    let doc = SariDocument::new(&source, name, chrono::Local::now().to_rfc3339(), &table);

    ensure_parent(out)?;
    let json = serde_json::to_string_pretty(&doc).context("serialize SARI document")?;
    std::fs::write(out, json).with_context(|| format!("write SARI {name}: {out:?}"))?;
    info!(feed = name, rows = table.rows.len(), ?out, "saved");
    Ok(SourceStatus::rows(table.rows.len()))
}

#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub heatmap: Option<PathBuf>,
    pub barchart: Option<PathBuf>,
    pub sari: Vec<(String, PathBuf)>,
}

/// Runs every configured pipeline into `output_dir` and writes `metadata.json`.
///
/// A failing pipeline is recorded in the metadata and does not stop the others.
pub fn run_all(inputs: &RunInputs, output_dir: &Path, layout: &ChartLayout) -> Result<RunMetadata> {
    let mut sentinel = BTreeMap::new();
    let mut sari = BTreeMap::new();

    let charts = [
        (Chart::Heatmap, inputs.heatmap.as_deref(), "heatmap.json"),
        (Chart::BarChart, inputs.barchart.as_deref(), "barchart.json"),
    ];
    for (chart, input, file) in charts {
        let Some(input) = input else {
            continue;
        };
        let out = output_dir.join("sentinel").join(file);
        let status = process_chart(chart, input, &out, OutputFormat::Json, layout, None)
            .unwrap_or_else(|err| failed(chart.name(), &err));
        sentinel.insert(chart.name().to_string(), status);
    }

    for (name, input) in &inputs.sari {
        let out = output_dir.join("sari").join(format!("{name}.json"));
        let status = process_sari(input, name, &out, None).unwrap_or_else(|err| failed(name, &err));
        sari.insert(name.clone(), status);
    }

    let metadata = RunMetadata {
        last_updated: chrono::Local::now().to_rfc3339(),
        sources: BTreeMap::from([
            ("sentinel".to_string(), sentinel),
            ("sari".to_string(), sari),
        ]),
    };
    let path = output_dir.join("metadata.json");
    ensure_parent(&path)?;
    let json = serde_json::to_string_pretty(&metadata).context("serialize metadata")?;
    std::fs::write(&path, json).with_context(|| format!("write metadata: {path:?}"))?;
    info!(?path, "metadata saved");
    Ok(metadata)
}

fn failed(name: &str, err: &anyhow::Error) -> SourceStatus {
    error!(source = name, "{err:#}");
    SourceStatus::failed(format!("{err:#}"))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent:?}"))?;
        }
    }
    Ok(())
}
