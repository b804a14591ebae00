//! fishline CLI - batch driver for the tensile-test analysis pipeline.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use fishline::analysis::{MaterialProperties, PropertyExtractor};
use fishline::charts::{self, ResultParam};
use fishline::config::AnalysisConfig;
use fishline::data::{load_sample, DerivedCurve, SpecimenGeometry};
use fishline::stats::{
    read_result_series, write_group_averages, write_individual_results, write_summary_report,
    Aggregator, GroupKey, SampleResult,
};

#[derive(Parser)]
#[command(
    name = "fishline",
    version,
    about = "Analyze and visualize fishing line material properties"
)]
struct Cli {
    /// Verbose output (use -vv for more verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file overriding the analysis constants
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze material properties from test data
    Analyze {
        /// Path(s) to input CSV files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        output: PathBuf,
    },
    /// Visualize exported result data as a parameter scatter
    Visualize {
        /// Path(s) to results CSV files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// X-axis result column
        #[arg(long, value_enum, default_value_t = ResultParam::D)]
        x_param: ResultParam,

        /// Y-axis result column
        #[arg(long, value_enum, default_value_t = ResultParam::Ke)]
        y_param: ResultParam,
    },
    /// Process all data in a group_*/<L>in directory structure
    Batch {
        /// Root data directory containing group subdirectories
        #[arg(short = 'd', long)]
        data_dir: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Also write summary_report.txt
        #[arg(long)]
        summary: bool,
    },
}

/// One fully analyzed sample, kept around for plotting and export.
struct Analyzed {
    file: String,
    curve: DerivedCurve,
    properties: MaterialProperties,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .init();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Command::Analyze { input, output } => {
            fs::create_dir_all(&output)?;
            run_analyze(&input, &output, &config)
        }
        Command::Visualize {
            input,
            output,
            x_param,
            y_param,
        } => {
            fs::create_dir_all(&output)?;
            run_visualize(&input, &output, x_param, y_param)
        }
        Command::Batch {
            data_dir,
            output,
            summary,
        } => {
            fs::create_dir_all(&output)?;
            run_batch(&data_dir, &output, summary, &config)
        }
    }
}

/// Scatter two result columns of previously exported CSVs against each other.
fn run_visualize(
    inputs: &[PathBuf],
    out_dir: &Path,
    x_param: ResultParam,
    y_param: ResultParam,
) -> Result<()> {
    let mut points = Vec::new();
    for path in inputs {
        let mut series = read_result_series(path, x_param.column_name(), y_param.column_name())
            .with_context(|| format!("Reading {}", path.display()))?;
        points.append(&mut series);
    }

    let plot = charts::plot_result_scatter(&points, x_param, y_param, out_dir)?;
    println!("Output plot saved to {}", plot.display());
    log::info!("Visualization complete. Results saved to {}", out_dir.display());
    Ok(())
}

/// Load, extract, and plot explicit input files. A bad file aborts the run.
fn run_analyze(inputs: &[PathBuf], out_dir: &Path, config: &AnalysisConfig) -> Result<()> {
    let mut results = Vec::new();
    for path in inputs {
        let analyzed = analyze_file(path, config)?;
        charts::plot_single_trace(&analyzed.curve, &analyzed.properties, out_dir)?;

        let p = &analyzed.properties;
        println!(
            "File: {} | Force: {:.2}N | Modulus: {:.2}MPa | Yield: {:.2}MPa | \
             KE: {:.4}J | Velocity: {:.2}m/s | Length: {:.1}mm | Diameter: {:.0}mm",
            analyzed.file,
            p.max_force_n,
            p.modulus_mpa,
            p.yield_stress_mpa,
            p.kinetic_energy_j,
            p.velocity_m_s,
            p.geometry.gauge_length_mm,
            p.geometry.diameter_mm
        );
        results.push(SampleResult {
            file: analyzed.file,
            properties: analyzed.properties,
        });
    }

    export_results(&results, out_dir, false)?;
    log::info!("Analysis complete. Results saved to {}", out_dir.display());
    Ok(())
}

/// Walk the group_*/<L>in tree, analyze everything in parallel, and write
/// per-bucket plots and statistics. Bad files are skipped with a reason.
fn run_batch(data_dir: &Path, out_dir: &Path, summary: bool, config: &AnalysisConfig) -> Result<()> {
    if !data_dir.is_dir() {
        bail!("Data directory {} does not exist", data_dir.display());
    }

    let files = discover_csv_files(data_dir);
    if files.is_empty() {
        log::warn!("No test CSVs found under {}", data_dir.display());
        return Ok(());
    }
    log::info!("Found {} test files", files.len());

    // Each worker gets an immutable path and returns an immutable result.
    let analyzed: Vec<Analyzed> = files
        .par_iter()
        .filter_map(|path| match analyze_file(path, config) {
            Ok(a) => Some(a),
            Err(e) => {
                log::warn!("Skipping {}: {:#}", path.display(), e);
                None
            }
        })
        .collect();

    if analyzed.is_empty() {
        bail!("No file under {} could be analyzed", data_dir.display());
    }

    let mut buckets: BTreeMap<GroupKey, Vec<&Analyzed>> = BTreeMap::new();
    for a in &analyzed {
        let key = GroupKey {
            group: a.properties.geometry.group.clone(),
            length_in: a.properties.geometry.length_in,
        };
        buckets.entry(key).or_default().push(a);
    }

    let properties: Vec<MaterialProperties> =
        analyzed.iter().map(|a| a.properties.clone()).collect();
    let group_stats = Aggregator::aggregate(&properties);

    for (key, bucket_summary) in &group_stats {
        if let Some(members) = buckets.get(key) {
            let curves: Vec<DerivedCurve> = members.iter().map(|a| a.curve.clone()).collect();
            charts::plot_multi_trace(&curves, key, bucket_summary, out_dir)?;
        }
    }

    let results: Vec<SampleResult> = analyzed
        .into_iter()
        .map(|a| SampleResult {
            file: a.file,
            properties: a.properties,
        })
        .collect();
    export_results(&results, out_dir, summary)?;

    log::info!(
        "Batch processing complete. Results saved to {}",
        out_dir.display()
    );
    Ok(())
}

fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<Analyzed> {
    let geometry = match SpecimenGeometry::from_path(path) {
        Ok(geom) => geom,
        Err(e) => {
            log::warn!("{}; using fallback geometry", e);
            SpecimenGeometry::fallback(path)
        }
    };

    let raw = load_sample(path, config).with_context(|| format!("Loading {}", path.display()))?;
    let analysis = PropertyExtractor::extract(&raw, &geometry, config)
        .with_context(|| format!("Analyzing {}", path.display()))?;
    if analysis.properties.modulus_from_fallback {
        log::warn!(
            "Knee detection did not converge for {}; modulus regressed over the initial {:.0}% of the curve",
            path.display(),
            config.fallback_fraction * 100.0
        );
    }

    Ok(Analyzed {
        file: path.display().to_string(),
        curve: analysis.curve,
        properties: analysis.properties,
    })
}

fn export_results(results: &[SampleResult], out_dir: &Path, summary: bool) -> Result<()> {
    write_individual_results(results, out_dir)?;

    let properties: Vec<MaterialProperties> =
        results.iter().map(|r| r.properties.clone()).collect();
    let group_stats = Aggregator::aggregate(&properties);
    write_group_averages(&group_stats, out_dir)?;
    if summary {
        write_summary_report(&group_stats, out_dir)?;
    }
    Ok(())
}

/// Find `group_*/<L>in/*.csv` files, sorted for deterministic processing.
fn discover_csv_files(data_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(data_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension().map(|e| e == "csv").unwrap_or(false)
                && dir_name_matches(path, 1, |name| {
                    name.ends_with("in") && name.chars().next().is_some_and(|c| c.is_ascii_digit())
                })
                && dir_name_matches(path, 2, |name| name.starts_with("group_"))
        })
        .collect()
}

fn dir_name_matches(path: &Path, levels_up: usize, predicate: impl Fn(&str) -> bool) -> bool {
    let mut ancestor = path.parent();
    for _ in 1..levels_up {
        ancestor = ancestor.and_then(Path::parent);
    }
    ancestor
        .and_then(|p| p.file_name())
        .map(|name| predicate(&name.to_string_lossy()))
        .unwrap_or(false)
}
