//! End-to-end pipeline test: a synthetic group_*/<L>in tree run through
//! geometry parsing, loading, extraction, aggregation, and CSV export.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use fishline::analysis::PropertyExtractor;
use fishline::config::AnalysisConfig;
use fishline::data::{load_sample, SpecimenGeometry};
use fishline::stats::{
    read_result_series, write_group_averages, write_individual_results, write_summary_report,
    Aggregator, SampleResult, INDIVIDUAL_RESULTS_FILE, MULTI_RUN_AVERAGES_FILE,
    SUMMARY_REPORT_FILE,
};
use tempfile::TempDir;

const DIAMETER_MM: f64 = 21.0;
const GAUGE_MM: f64 = 127.0; // 5 in

/// Bilinear stress-strain sample serialized as a test CSV: elastic slope
/// `modulus` MPa up to 4% strain, then a shallow plastic slope.
fn bilinear_csv(modulus: f64) -> String {
    let area = std::f64::consts::PI * (DIAMETER_MM / 2.0).powi(2);
    let mut csv = String::from("\"Time\",\"Force\",\"Stroke\"\nsec,N,mm\n");
    for i in 0..100 {
        let strain = i as f64 * 0.001;
        let stress = if strain <= 0.04 {
            modulus * strain
        } else {
            modulus * 0.04 + 20.0 * (strain - 0.04)
        };
        writeln!(
            csv,
            "{},{},{}",
            i as f64 * 0.01,
            stress * area,
            strain * GAUGE_MM
        )
        .unwrap();
    }
    csv
}

fn write_tree(root: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for (group, modulus) in [("group_a", 250.0), ("group_b", 400.0)] {
        let dir = root.join(group).join("5in");
        fs::create_dir_all(&dir).unwrap();
        for run in 1..=2 {
            let path = dir.join(format!("test--line-crimp-21--{}.csv", run));
            fs::write(&path, bilinear_csv(modulus)).unwrap();
            files.push(path);
        }
    }
    files
}

#[test]
fn full_pipeline_over_synthetic_tree() {
    let data_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let config = AnalysisConfig::default();

    let mut results = Vec::new();
    for path in write_tree(data_dir.path()) {
        let geometry = SpecimenGeometry::from_path(&path).expect("conventional path");
        assert_eq!(geometry.diameter_mm, DIAMETER_MM);
        assert_eq!(geometry.gauge_length_mm, GAUGE_MM);

        let raw = load_sample(&path, &config).expect("valid CSV");
        let analysis = PropertyExtractor::extract(&raw, &geometry, &config).expect("extraction");
        assert_eq!(analysis.curve.len(), raw.len());
        let props = analysis.properties;

        assert!(props.max_force_n.is_finite() && props.max_force_n > 0.0);
        assert!(props.kinetic_energy_j > 0.0);
        assert!(props.velocity_m_s > 0.0);
        assert!(!props.modulus_from_fallback, "bilinear data has a knee");
        let (yield_strain, _) = props.yield_point.expect("knee expected");
        assert!((yield_strain - 0.04).abs() <= 0.001 + 1e-12);

        results.push(SampleResult {
            file: path.display().to_string(),
            properties: props,
        });
    }

    let group_a_modulus = results
        .iter()
        .find(|r| r.properties.geometry.group == "group_a")
        .map(|r| r.properties.modulus_mpa)
        .unwrap();
    assert!((group_a_modulus - 250.0).abs() / 250.0 < 1e-6);

    let properties: Vec<_> = results.iter().map(|r| r.properties.clone()).collect();
    let stats = Aggregator::aggregate(&properties);
    assert_eq!(stats.len(), 2);
    for summary in stats.values() {
        assert_eq!(summary.count, 2);
        // Identical runs within a group: std = 0 by the n−1 convention.
        assert!(summary.modulus_mpa.std.abs() < 1e-9);
    }

    write_individual_results(&results, out_dir.path()).expect("individual export");
    write_group_averages(&stats, out_dir.path()).expect("averages export");
    write_summary_report(&stats, out_dir.path()).expect("summary report");

    let individual =
        fs::read_to_string(out_dir.path().join(INDIVIDUAL_RESULTS_FILE)).expect("csv exists");
    let mut lines = individual.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("file,group,max_force_N,modulus_MPa"));
    assert_eq!(lines.count(), 4);

    let averages =
        fs::read_to_string(out_dir.path().join(MULTI_RUN_AVERAGES_FILE)).expect("csv exists");
    assert!(averages.contains("group_a"));
    assert!(averages.contains("group_b"));
    assert_eq!(averages.lines().count(), 3);

    let report =
        fs::read_to_string(out_dir.path().join(SUMMARY_REPORT_FILE)).expect("report exists");
    assert!(report.contains("Group: group_a"));
    assert!(report.contains("Length: 5in"));

    // The exported per-sample table feeds the results scatter plot.
    let points = read_result_series(
        &out_dir.path().join(INDIVIDUAL_RESULTS_FILE),
        "diameter_mm",
        "kinetic_energy_J",
    )
    .expect("scatter columns");
    assert_eq!(points.len(), 4);
    assert!(points.iter().all(|&(d, ke)| d == DIAMETER_MM && ke > 0.0));
}

#[test]
fn short_files_are_reported_as_insufficient() {
    let data_dir = TempDir::new().unwrap();
    let dir = data_dir.path().join("group_a").join("5in");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("test--line-crimp-21--1.csv");
    fs::write(&path, "Time,Force,Stroke\nsec,N,mm\n0,1,0.1\n0.01,2,0.2\n").unwrap();

    let err = load_sample(&path, &AnalysisConfig::default());
    assert!(matches!(
        err,
        Err(fishline::data::LoaderError::InsufficientRows { rows: 2, .. })
    ));
}
