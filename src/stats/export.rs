//! Results Export Module
//! Writes the two structured outputs: per-sample rows and per-bucket
//! averages, plus the optional plain-text summary report.

use crate::analysis::MaterialProperties;
use crate::stats::aggregator::GroupStatistics;
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const INDIVIDUAL_RESULTS_FILE: &str = "individual_results.csv";
pub const MULTI_RUN_AVERAGES_FILE: &str = "multi_run_averages.csv";
pub const SUMMARY_REPORT_FILE: &str = "summary_report.txt";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build results table: {0}")]
    Polars(#[from] PolarsError),
    #[error("Column '{column}' in {path} is missing or not fully numeric")]
    InvalidColumn { path: String, column: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One analyzed sample with the file it came from.
#[derive(Debug, Clone)]
pub struct SampleResult {
    pub file: String,
    pub properties: MaterialProperties,
}

/// Write `individual_results.csv`: one full-fidelity row per sample.
pub fn write_individual_results(
    results: &[SampleResult],
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let mut df = DataFrame::new(vec![
        Column::new(
            "file".into(),
            results.iter().map(|r| r.file.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "group".into(),
            results
                .iter()
                .map(|r| r.properties.geometry.group.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "max_force_N".into(),
            results
                .iter()
                .map(|r| r.properties.max_force_n)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "modulus_MPa".into(),
            results
                .iter()
                .map(|r| r.properties.modulus_mpa)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "yield_stress_MPa".into(),
            results
                .iter()
                .map(|r| r.properties.yield_stress_mpa)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "kinetic_energy_J".into(),
            results
                .iter()
                .map(|r| r.properties.kinetic_energy_j)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "velocity_m_s".into(),
            results
                .iter()
                .map(|r| r.properties.velocity_m_s)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "length_mm".into(),
            results
                .iter()
                .map(|r| r.properties.geometry.gauge_length_mm)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "diameter_mm".into(),
            results
                .iter()
                .map(|r| r.properties.geometry.diameter_mm)
                .collect::<Vec<_>>(),
        ),
    ])?;

    let path = out_dir.join(INDIVIDUAL_RESULTS_FILE);
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    log::info!("Individual results saved to {}", path.display());
    Ok(path)
}

/// Write `multi_run_averages.csv`: one aggregated row per (group, length).
pub fn write_group_averages(
    stats: &GroupStatistics,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let keys: Vec<_> = stats.keys().collect();
    let summaries: Vec<_> = stats.values().collect();

    let mut df = DataFrame::new(vec![
        Column::new(
            "group".into(),
            keys.iter().map(|k| k.group.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "length_in".into(),
            keys.iter().map(|k| k.length_in).collect::<Vec<u32>>(),
        ),
        Column::new(
            "sample_count".into(),
            summaries.iter().map(|s| s.count as u32).collect::<Vec<_>>(),
        ),
        Column::new(
            "avg_max_force_N".into(),
            summaries
                .iter()
                .map(|s| s.max_force_n.mean)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "std_max_force_N".into(),
            summaries
                .iter()
                .map(|s| s.max_force_n.std)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "avg_modulus_MPa".into(),
            summaries
                .iter()
                .map(|s| s.modulus_mpa.mean)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "std_modulus_MPa".into(),
            summaries
                .iter()
                .map(|s| s.modulus_mpa.std)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "avg_yield_stress_MPa".into(),
            summaries
                .iter()
                .map(|s| s.yield_stress_mpa.mean)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "std_yield_stress_MPa".into(),
            summaries
                .iter()
                .map(|s| s.yield_stress_mpa.std)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "avg_kinetic_energy_J".into(),
            summaries
                .iter()
                .map(|s| s.kinetic_energy_j.mean)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "std_kinetic_energy_J".into(),
            summaries
                .iter()
                .map(|s| s.kinetic_energy_j.std)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "avg_velocity_m_s".into(),
            summaries
                .iter()
                .map(|s| s.velocity_m_s.mean)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "std_velocity_m_s".into(),
            summaries
                .iter()
                .map(|s| s.velocity_m_s.std)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "length_mm".into(),
            summaries.iter().map(|s| s.length_mm).collect::<Vec<_>>(),
        ),
        Column::new(
            "diameter_mm".into(),
            summaries.iter().map(|s| s.diameter_mm).collect::<Vec<_>>(),
        ),
    ])?;

    let path = out_dir.join(MULTI_RUN_AVERAGES_FILE);
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    log::info!("Multi-run averages saved to {}", path.display());
    Ok(path)
}

/// Read two numeric columns of a previously exported results CSV as paired
/// points, row-aligned. Used by the results scatter plot.
pub fn read_result_series(
    path: &Path,
    x_column: &str,
    y_column: &str,
) -> Result<Vec<(f64, f64)>, ExportError> {
    let df = LazyCsvReader::new(path.to_path_buf())
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;

    let x = numeric_column(&df, x_column, path)?;
    let y = numeric_column(&df, y_column, path)?;
    Ok(x.into_iter().zip(y).collect())
}

fn numeric_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<f64>, ExportError> {
    let invalid = || ExportError::InvalidColumn {
        path: path.display().to_string(),
        column: name.to_string(),
    };
    let column = df.column(name).map_err(|_| invalid())?;
    let cast = column.cast(&DataType::Float64).map_err(|_| invalid())?;
    let ca = cast.f64().map_err(|_| invalid())?;
    if ca.null_count() > 0 {
        return Err(invalid());
    }
    Ok(ca.into_iter().filter_map(|v| v).collect())
}

/// Write the human-readable summary report for a batch run.
pub fn write_summary_report(
    stats: &GroupStatistics,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = out_dir.join(SUMMARY_REPORT_FILE);
    let mut file = File::create(&path)?;

    writeln!(file, "Fishing Line Material Properties Analysis Summary")?;
    writeln!(file, "{}", "=".repeat(50))?;
    writeln!(file)?;

    let mut current_group: Option<&str> = None;
    for (key, summary) in stats {
        if current_group != Some(key.group.as_str()) {
            if current_group.is_some() {
                writeln!(file)?;
            }
            writeln!(file, "Group: {}", key.group)?;
            writeln!(file, "{}", "-".repeat(30))?;
            current_group = Some(key.group.as_str());
        }
        writeln!(file, "  Length: {}in", key.length_in)?;
        writeln!(file, "    Sample Count: {}", summary.count)?;
        writeln!(
            file,
            "    Modulus: {:.2} ± {:.2} MPa",
            summary.modulus_mpa.mean, summary.modulus_mpa.std
        )?;
        writeln!(
            file,
            "    Yield Stress: {:.2} ± {:.2} MPa",
            summary.yield_stress_mpa.mean, summary.yield_stress_mpa.std
        )?;
        writeln!(
            file,
            "    Max Force: {:.2} ± {:.2} N",
            summary.max_force_n.mean, summary.max_force_n.std
        )?;
        writeln!(file)?;
    }

    log::info!("Summary report saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SpecimenGeometry;
    use tempfile::TempDir;

    fn result(diameter_mm: f64, kinetic_energy_j: f64) -> SampleResult {
        SampleResult {
            file: "test.csv".to_string(),
            properties: MaterialProperties {
                modulus_mpa: 2.45,
                yield_stress_mpa: 1.85,
                max_force_n: 45.0,
                kinetic_energy_j,
                velocity_m_s: 4.7,
                yield_point: None,
                modulus_from_fallback: false,
                geometry: SpecimenGeometry {
                    diameter_mm,
                    gauge_length_mm: 127.0,
                    length_in: 5,
                    group: "group_a".to_string(),
                    crimp_type: "crimp".to_string(),
                    test_run: 1,
                },
            },
        }
    }

    #[test]
    fn reads_back_exported_result_columns() {
        let out = TempDir::new().expect("temp dir");
        let results = vec![result(21.0, 0.5), result(16.0, 0.3)];
        let path = write_individual_results(&results, out.path()).expect("export");

        let points =
            read_result_series(&path, "diameter_mm", "kinetic_energy_J").expect("read back");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], (21.0, 0.5));
        assert_eq!(points[1], (16.0, 0.3));
    }

    #[test]
    fn rejects_missing_and_non_numeric_columns() {
        let out = TempDir::new().expect("temp dir");
        let path = write_individual_results(&[result(21.0, 0.5)], out.path()).expect("export");

        assert!(matches!(
            read_result_series(&path, "no_such_column", "kinetic_energy_J"),
            Err(ExportError::InvalidColumn { .. })
        ));
        assert!(matches!(
            read_result_series(&path, "file", "kinetic_energy_J"),
            Err(ExportError::InvalidColumn { .. })
        ));
    }
}
