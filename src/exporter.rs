use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::datasets::{DatasetSpec, RecordType};
use crate::fetch_error::FetchError;
use crate::fetcher::{RawSeries, TimeseriesFetcher};

/// Inches to meters conversion factor
pub const INCHES_TO_METERS: f64 = 0.0254;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No 'Value (m)' or 'Value (in)' column found")]
    NoValueColumn,

    #[error("Failed to parse value: {0}")]
    Number(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write output CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Which response column carries the value, resolved once per response.
/// The portal reports depth/elevation series in meters or, for some legacy
/// loggers, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColumn {
    Meters(usize),
    Inches(usize),
}

/// Locate the canonical value column. `Value (m)` wins over `Value (in)`.
pub fn resolve_value_column(columns: &[String]) -> Result<ValueColumn, ExportError> {
    if let Some(idx) = columns.iter().position(|c| c == "Value (m)") {
        return Ok(ValueColumn::Meters(idx));
    }
    if let Some(idx) = columns.iter().position(|c| c == "Value (in)") {
        return Ok(ValueColumn::Inches(idx));
    }
    Err(ExportError::NoValueColumn)
}

/// One normalized observation; `value_m` is always in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value_m: f64,
}

/// Convert the resolved value column to meters and drop all other columns.
pub fn to_observations(
    series: &RawSeries,
    column: ValueColumn,
) -> Result<Vec<Observation>, ExportError> {
    let (idx, factor) = match column {
        ValueColumn::Meters(idx) => (idx, 1.0),
        ValueColumn::Inches(idx) => (idx, INCHES_TO_METERS),
    };

    series
        .rows
        .iter()
        .map(|row| {
            let cell = row
                .cells
                .get(idx)
                .ok_or_else(|| ExportError::Number("<missing cell>".to_string()))?;
            let value = cell
                .trim()
                .parse::<f64>()
                .map_err(|_| ExportError::Number(cell.clone()))?;
            Ok(Observation {
                timestamp: row.timestamp,
                value_m: value * factor,
            })
        })
        .collect()
}

#[derive(Serialize)]
struct OutputRow<'a> {
    #[serde(rename = "DateTime")]
    date_time: String,
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "Location")]
    location: &'a str,
}

/// Write observations as `DateTime,Value,Location` CSV, creating missing
/// directories first. Existing files are truncated, never appended.
pub fn write_observations(
    path: &Path,
    bore: &str,
    observations: &[Observation],
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Header is written explicitly so an empty series still produces a
    // well-formed file.
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["DateTime", "Value", "Location"])?;
    for obs in observations {
        writer.serialize(OutputRow {
            date_time: obs.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            value: obs.value_m,
            location: bore,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// One failed (bore, dataset, record-type) combination.
#[derive(Debug, Clone)]
pub struct Failure {
    pub bore: String,
    pub logical_name: &'static str,
    pub record_type: RecordType,
    pub error: String,
}

/// Accumulated result of a run: output paths written, failures recorded.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub successes: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

/// Fetch, normalize, and persist one (bore, dataset) combination.
pub async fn export_combination(
    fetcher: &TimeseriesFetcher,
    bore: &str,
    spec: &DatasetSpec,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let series = fetcher.fetch_series(bore, spec).await?;
    info!(
        "Fetched {}@{}: {} rows, columns {:?}",
        spec.remote_name,
        bore,
        series.rows.len(),
        series.columns
    );

    let column = resolve_value_column(&series.columns)?;
    let observations = to_observations(&series, column)?;

    let path = spec.output_path(out_dir, bore);
    write_observations(&path, bore, &observations)?;

    Ok(path)
}

/// Run the full bore x dataset cross-product sequentially.
///
/// Failures are recorded and the loop continues; nothing here aborts the run.
pub async fn run_export(
    fetcher: &TimeseriesFetcher,
    bores: &[String],
    datasets: &[DatasetSpec],
    out_dir: &Path,
) -> RunOutcome {
    let total = bores.len() * datasets.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} exports ({msg})")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut outcome = RunOutcome::default();

    for bore in bores {
        for spec in datasets {
            info!(
                "Exporting {} {} for bore {}: {}",
                spec.logical_name,
                spec.record_type,
                bore,
                fetcher.export_url(bore, spec)
            );

            match export_combination(fetcher, bore, spec, out_dir).await {
                Ok(path) => {
                    info!("Wrote {path:?}");
                    outcome.successes.push(path);
                }
                Err(e) => {
                    warn!(
                        "Export failed for {} {} {}: {e}",
                        bore, spec.logical_name, spec.record_type
                    );
                    outcome.failures.push(Failure {
                        bore: bore.clone(),
                        logical_name: spec.logical_name,
                        record_type: spec.record_type,
                        error: e.to_string(),
                    });
                }
            }

            pb.set_message(format!(
                "{} successful, {} failed",
                outcome.successes.len(),
                outcome.failures.len()
            ));
            pb.inc(1);
        }
    }

    pb.finish_with_message(format!(
        "Complete: {} successful, {} failed",
        outcome.successes.len(),
        outcome.failures.len()
    ));

    outcome
}

/// Print the end-of-run summary block.
pub fn print_summary(outcome: &RunOutcome) {
    println!("\n{}", "=".repeat(60));
    println!("Export Summary");
    println!("{}", "=".repeat(60));

    println!("Successful exports: {}", outcome.successes.len());
    for path in &outcome.successes {
        println!("  {}", path.display());
    }

    println!("{}", "-".repeat(60));
    println!("Failed exports:     {}", outcome.failures.len());
    for failure in &outcome.failures {
        println!(
            "  {} {} {}: {}",
            failure.bore, failure.logical_name, failure.record_type, failure.error
        );
    }

    println!("{}", "=".repeat(60));
}
