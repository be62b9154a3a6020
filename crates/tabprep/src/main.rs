//! CLI entry point for the tabular cleaning pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tabprep::{Pipeline, PipelineConfig, PipelineResult, ZeroVariancePolicy};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular cleaning pipeline",
    long_about = "Cleans a CSV table: drops fully-empty rows, imputes missing values, \
                  removes duplicates, standardizes numeric columns, clips outliers and \
                  buckets one column.\n\n\
                  EXAMPLES:\n  \
                  # Clean with defaults (writes a timestamped CSV)\n  \
                  tabprep -i housing.csv\n\n  \
                  # Fixed output name, custom directory\n  \
                  tabprep -i housing.csv -o out --dataset-name housing --no-timestamp\n\n  \
                  # Machine-readable summary, nothing written\n  \
                  tabprep -i housing.csv --no-save --json"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file with a pipeline configuration
    ///
    /// Flags given on the command line override values from the file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the cleaned table is written to
    #[arg(short = 'o', long)]
    save_dir: Option<PathBuf>,

    /// Base name of the written file (without extension)
    #[arg(long)]
    dataset_name: Option<String>,

    /// Do not append a capture timestamp to the file name
    #[arg(long)]
    no_timestamp: bool,

    /// Do not write the cleaned table
    #[arg(long)]
    no_save: bool,

    /// Column that receives a derived bucket column
    #[arg(long)]
    bin_column: Option<String>,

    /// IQR multiplier used for outlier clipping
    #[arg(long)]
    iqr_multiplier: Option<f64>,

    /// Abort when a numeric column has zero variance
    #[arg(long)]
    fail_on_zero_variance: bool,

    /// Write the fitted scaler state as JSON to this path
    #[arg(long)]
    scaler_out: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logging; only the final JSON is printed.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = build_config(&args)?;

    info!("Loading dataset from: {}", args.input.display());
    let data = load_csv(&args.input)?;
    info!("Dataset loaded: {:?}", data.shape());

    let pipeline = Pipeline::builder().config(config).build()?;
    let original_shape = data.shape();

    let result = pipeline.process(data).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    if let Some(path) = &args.scaler_out {
        std::fs::write(path, result.scaler.to_json()?)
            .with_context(|| format!("Writing scaler state to {}", path.display()))?;
        info!("Scaler state written to: {}", path.display());
    }

    if args.json {
        let report = serde_json::json!({
            "input_file": args.input,
            "saved_path": result.saved_path,
            "summary": result.summary,
            "scaler": result.scaler,
            "binning": result.binning,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&result, &args.input, original_shape);
    Ok(())
}

/// Merge the optional config file with command-line overrides.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Reading config {}", path.display()))?;
            PipelineConfig::from_json(&content)
                .with_context(|| format!("Loading config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.save_dir {
        config.save_dir = dir.clone();
    }
    if let Some(name) = &args.dataset_name {
        config.dataset_name = name.clone();
    }
    if let Some(column) = &args.bin_column {
        config.bin_column = column.clone();
    }
    if let Some(k) = args.iqr_multiplier {
        config.iqr_multiplier = k;
    }
    if args.no_timestamp {
        config.timestamp = false;
    }
    if args.no_save {
        config.save = false;
    }
    if args.fail_on_zero_variance {
        config.zero_variance = ZeroVariancePolicy::Fail;
    }

    config.validate()?;
    Ok(config)
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(result: &PipelineResult, input: &Path, original_shape: (usize, usize)) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        input.display(),
        original_shape.0,
        original_shape.1
    );
    match &result.saved_path {
        Some(path) => println!(
            "Output: {} ({} rows x {} columns)",
            path.display(),
            summary.rows_after,
            summary.columns_after
        ),
        None => println!(
            "Output: not saved ({} rows x {} columns)",
            summary.rows_after, summary.columns_after
        ),
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} empty, {} duplicates removed)",
        summary.rows_before,
        summary.rows_after,
        summary.empty_rows_removed,
        summary.duplicates_removed
    );
    println!("  Values imputed: {}", summary.values_imputed());
    println!("  Values clipped: {}", summary.values_clipped());
    println!(
        "  Standardized columns: {} ({} unscaled, {} non-finite)",
        result.scaler.columns.len(),
        result.scaler.unscaled.len(),
        result.scaler.non_finite.len()
    );
    if let Some(binning) = &result.binning {
        println!(
            "  Binned '{}' -> '{}' ({:?}, {} distinct labels)",
            binning.source_column,
            binning.output_column,
            binning.strategy,
            binning.distinct_labels()
        );
    }
    println!();

    if !summary.actions.is_empty() {
        println!("Actions Taken:");
        for action in &summary.actions {
            match &action.details {
                Some(details) => println!(
                    "  - [{}] {}: {} ({})",
                    action.action_type.display_name(),
                    action.target,
                    action.description,
                    details
                ),
                None => println!(
                    "  - [{}] {}: {}",
                    action.action_type.display_name(),
                    action.target,
                    action.description
                ),
            }
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
