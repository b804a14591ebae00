//! CSV Data Loader Module
//! Strict loading of tensile-test CSVs using Polars.
//!
//! Expected file layout: a `Time,Force,Stroke` header row, a `sec,N,mm` unit
//! row, then numeric triples. Quoted fields are tolerated. The loader never
//! substitutes defaults for unparseable values; it fails per-file instead.

use crate::config::AnalysisConfig;
use crate::data::curve::RawSample;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

pub const EXPECTED_COLUMNS: [&str; 3] = ["Time", "Force", "Stroke"];
pub const EXPECTED_UNITS: [&str; 3] = ["sec", "N", "mm"];

#[derive(Error, Debug)]
pub enum LoaderError {
    /// Malformed header, unit row, or data rows. Fatal for the file.
    #[error("Malformed file {path}: {reason}")]
    FileFormat { path: String, reason: String },
    /// Too few rows for a meaningful curve fit. Batch callers skip these.
    #[error("Insufficient data rows in {path}: {rows} (need at least {min})")]
    InsufficientRows {
        path: String,
        rows: usize,
        min: usize,
    },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load and validate one tensile-test CSV into a [`RawSample`].
pub fn load_sample(path: &Path, config: &AnalysisConfig) -> Result<RawSample, LoaderError> {
    validate_header_rows(path)?;

    // Unit row already validated, so skip it and let Polars infer numeric
    // columns from the data rows. Strict: no ignore_errors.
    let df = LazyCsvReader::new(path.to_path_buf())
        .with_skip_rows_after_header(1)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()
        .map_err(|e| LoaderError::FileFormat {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let rows = df.height();
    if rows < config.min_rows {
        return Err(LoaderError::InsufficientRows {
            path: path.display().to_string(),
            rows,
            min: config.min_rows,
        });
    }

    let sample = RawSample {
        time_s: column_f64(&df, "Time", path)?,
        force_n: column_f64(&df, "Force", path)?,
        stroke_mm: column_f64(&df, "Stroke", path)?,
    };

    if sample.time_s.windows(2).any(|w| w[1] < w[0]) {
        return Err(LoaderError::FileFormat {
            path: path.display().to_string(),
            reason: "Time column is not monotonically non-decreasing".to_string(),
        });
    }

    log::debug!("Loaded {} rows from {}", sample.len(), path.display());
    Ok(sample)
}

/// Check the column-name row and the unit row before handing the file to
/// Polars. Quotes around fields are stripped.
fn validate_header_rows(path: &Path) -> Result<(), LoaderError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let header = lines.next().transpose()?.unwrap_or_default();
    let fields = split_fields(&header);
    if fields != EXPECTED_COLUMNS {
        return Err(LoaderError::FileFormat {
            path: path.display().to_string(),
            reason: format!(
                "Expected columns {:?}, found {:?}",
                EXPECTED_COLUMNS, fields
            ),
        });
    }

    let units = lines.next().transpose()?.unwrap_or_default();
    let fields = split_fields(&units);
    if fields != EXPECTED_UNITS {
        return Err(LoaderError::FileFormat {
            path: path.display().to_string(),
            reason: format!("Expected unit row {:?}, found {:?}", EXPECTED_UNITS, fields),
        });
    }

    Ok(())
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}

/// Extract a fully numeric column as `Vec<f64>`. A single non-numeric or
/// missing field makes the whole file malformed.
fn column_f64(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<f64>, LoaderError> {
    let column = df.column(name).map_err(|_| LoaderError::FileFormat {
        path: path.display().to_string(),
        reason: format!("Missing column '{}'", name),
    })?;
    let cast = column.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    if ca.null_count() > 0 {
        return Err(LoaderError::FileFormat {
            path: path.display().to_string(),
            reason: format!(
                "Column '{}' has {} non-numeric or missing values",
                name,
                ca.null_count()
            ),
        });
    }
    Ok(ca.into_iter().filter_map(|v| v).collect())
}
