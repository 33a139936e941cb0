// export.rs
// Writes the metric history out as CSV, TSV or JSON, optionally gzip-compressed

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::{write::GzEncoder, Compression};

use crate::config::ExportFormat;
use crate::error::ExportError;
use crate::simulation::MetricsHistory;

pub const TIMESERIES_FILE: &str = "cycler_timeseries";
pub const CURVES_FILE: &str = "cycler_curves";
pub const PHASES_FILE: &str = "cycler_phases";
pub const HISTORY_FILE: &str = "cycler_history";

/// Export `history` into `output_dir` and return the paths written.
pub fn export_history(
    history: &MetricsHistory,
    format: ExportFormat,
    output_dir: &Path,
    compress: bool,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(output_dir)?;

    let files: Vec<(&str, String)> = match format {
        ExportFormat::Json => vec![(HISTORY_FILE, history_json(history)?)],
        ExportFormat::Csv | ExportFormat::Tsv => vec![
            (TIMESERIES_FILE, timeseries_csv(history)),
            (CURVES_FILE, curves_csv(history)),
            (PHASES_FILE, phases_csv(history)),
        ],
    };

    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Tsv => "tsv",
        ExportFormat::Json => "json",
    };

    let mut written = Vec::with_capacity(files.len());
    for (stem, content) in files {
        let content = if format == ExportFormat::Tsv {
            to_tsv(&content)
        } else {
            content
        };
        let mut filename = format!("{stem}.{extension}");
        if compress {
            filename.push_str(".gz");
        }
        let path = output_dir.join(filename);
        write_file(&path, content.as_bytes(), compress)?;
        written.push(path);
    }
    Ok(written)
}

fn write_file(path: &Path, bytes: &[u8], compress: bool) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    if compress {
        let mut encoder = GzEncoder::new(writer, Compression::fast());
        encoder.write_all(bytes)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = writer;
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    Ok(())
}

pub fn timeseries_csv(history: &MetricsHistory) -> String {
    let mut content = String::new();

    content.push_str("# Cycler History Export\n");
    content.push_str(&format!("# Timesteps: {}\n", history.timesteps()));
    content.push_str(&format!("# Phase changes: {}\n", history.phase_changes.len()));
    content.push('\n');
    content.push_str("timestep,soc,current,driver,potential\n");

    let rows = history
        .soc
        .iter()
        .zip(history.current.iter())
        .zip(history.driver.iter())
        .zip(history.potential.iter());
    for (((soc, current), driver), potential) in rows {
        content.push_str(&format!(
            "{},{},{},{},{}\n",
            soc.timestep, soc.value, current.value, driver.value, potential.value
        ));
    }
    content
}

pub fn curves_csv(history: &MetricsHistory) -> String {
    let mut content = String::new();

    content.push_str("# Charge Curve Export\n");
    content.push_str(&format!("# Curve interval: {}\n", history.curve_interval));
    content.push('\n');

    let width = history.curves.first().map_or(0, |c| c.values.len());
    content.push_str("timestep");
    for i in 0..width {
        content.push_str(&format!(",c{i}"));
    }
    content.push('\n');

    for curve in &history.curves {
        content.push_str(&curve.timestep.to_string());
        for value in &curve.values {
            content.push_str(&format!(",{value}"));
        }
        content.push('\n');
    }
    content
}

pub fn phases_csv(history: &MetricsHistory) -> String {
    let mut content = String::from("timestep,from,to\n");
    for change in &history.phase_changes {
        content.push_str(&format!("{},{},{}\n", change.timestep, change.from, change.to));
    }
    content
}

pub fn history_json(history: &MetricsHistory) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(history)?)
}

fn to_tsv(csv: &str) -> String {
    csv.replace(',', "\t")
}
