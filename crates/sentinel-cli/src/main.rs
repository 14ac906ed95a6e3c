mod pipeline;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pipeline::{Chart, OutputFormat, RunInputs};
use sentinel_core::layout::ChartLayout;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "sentinel")]
#[command(about = "Recover respiratory-virus surveillance data from the published sentinel charts.")]
struct Cli {
    /// JSON file overriding chart layout thresholds
    #[arg(long, global = true)]
    layout: Option<PathBuf>,
    /// Vertical offset between a heatmap row and its label
    #[arg(long, global = true)]
    row_offset: Option<f64>,
    /// Fail when heatmap rows and virus labels differ in count
    #[arg(long, global = true)]
    strict_rows: bool,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconstruct the virus x week heatmap
    Heatmap {
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(long)]
        source: Option<String>,
    },
    /// Reconstruct the stacked detections bar chart and submissions series
    Barchart {
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(long)]
        source: Option<String>,
    },
    /// Decode a semicolon-delimited SARI feed
    Sari {
        input: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        source: Option<String>,
    },
    /// Process every given chart and feed into one data directory
    Run {
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long)]
        heatmap: Option<PathBuf>,
        #[arg(long)]
        barchart: Option<PathBuf>,
        /// NAME=PATH, repeatable
        #[arg(long, value_parser = parse_named_path)]
        sari: Vec<(String, PathBuf)>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let layout = load_layout(cli.layout.as_deref(), cli.row_offset, cli.strict_rows)?;

    match cli.cmd {
        Command::Heatmap {
            input,
            out,
            format,
            source,
        } => {
            ensure_input_file(&input)?;
            pipeline::process_chart(Chart::Heatmap, &input, &out, format, &layout, source.as_deref())?;
        }
        Command::Barchart {
            input,
            out,
            format,
            source,
        } => {
            ensure_input_file(&input)?;
            pipeline::process_chart(Chart::BarChart, &input, &out, format, &layout, source.as_deref())?;
        }
        Command::Sari {
            input,
            name,
            out,
            source,
        } => {
            ensure_input_file(&input)?;
            pipeline::process_sari(&input, &name, &out, source.as_deref())?;
        }
        Command::Run {
            output_dir,
            heatmap,
            barchart,
            sari,
        } => {
            let inputs = RunInputs {
                heatmap,
                barchart,
                sari,
            };
            let metadata = pipeline::run_all(&inputs, &output_dir, &layout)?;
            if metadata.has_errors() {
                bail!("completed with errors, see {:?}", output_dir.join("metadata.json"));
            }
            info!("all pipelines completed");
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_layout(path: Option<&Path>, row_offset: Option<f64>, strict_rows: bool) -> Result<ChartLayout> {
    let mut layout = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("read layout: {path:?}"))?;
            serde_json::from_str(&text).with_context(|| format!("parse layout: {path:?}"))?
        }
        None => ChartLayout::default(),
    };
    if let Some(offset) = row_offset {
        layout.row_label_offset = offset;
    }
    layout.strict_row_match |= strict_rows;
    Ok(layout)
}

fn parse_named_path(s: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{s}'"))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{s}'"));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => bail!("input is not a file: {input:?}"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}
