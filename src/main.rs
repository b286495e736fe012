//! CLI entry point for the automated analysis pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tabreport::render::ChartRenderer;
use tabreport::{
    AnalysisResult, ColumnScope, EmptyColumnPolicy, ImputeStrategy, ManifestRenderer, Pipeline,
    ReportWriter, RunConfig, SummaryTiming, TableLoader,
};
use tracing::{info, warn};

/// CLI-compatible imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputeStrategy {
    /// Fill with the mean of non-missing values
    Mean,
    /// Fill with the median of non-missing values
    Median,
}

impl From<CliImputeStrategy> for ImputeStrategy {
    fn from(cli: CliImputeStrategy) -> Self {
        match cli {
            CliImputeStrategy::Mean => ImputeStrategy::Mean,
            CliImputeStrategy::Median => ImputeStrategy::Median,
        }
    }
}

/// CLI-compatible policy for entirely-missing numeric columns
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEmptyColumnPolicy {
    /// Exclude the column from the model stages
    Skip,
    /// Abort the run
    Abort,
}

impl From<CliEmptyColumnPolicy> for EmptyColumnPolicy {
    fn from(cli: CliEmptyColumnPolicy) -> Self {
        match cli {
            CliEmptyColumnPolicy::Skip => EmptyColumnPolicy::Skip,
            CliEmptyColumnPolicy::Abort => EmptyColumnPolicy::Abort,
        }
    }
}

/// CLI-compatible column scope enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliColumnScope {
    /// Keep all input columns in the enriched table
    KeepAll,
    /// Narrow the table to numeric columns before the model stages
    NumericOnly,
}

impl From<CliColumnScope> for ColumnScope {
    fn from(cli: CliColumnScope) -> Self {
        match cli {
            CliColumnScope::KeepAll => ColumnScope::KeepAll,
            CliColumnScope::NumericOnly => ColumnScope::NumericOnly,
        }
    }
}

/// CLI-compatible summary timing enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSummaryTiming {
    /// Summarize before narrowing, so dropped columns stay in the report
    Before,
    /// Summarize the narrowed table only
    After,
}

impl From<CliSummaryTiming> for SummaryTiming {
    fn from(cli: CliSummaryTiming) -> Self {
        match cli {
            CliSummaryTiming::Before => SummaryTiming::BeforeNarrowing,
            CliSummaryTiming::After => SummaryTiming::AfterNarrowing,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Automated exploratory analysis and reporting for tabular data",
    long_about = "Analyzes a delimited tabular file and writes an enriched dataset,\n\
                  a chart manifest and a Markdown report.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  OPENAI_API_KEY    API key for the narrative section (optional)\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  tabreport -i data.csv\n\n  \
                  # Custom model configuration\n  \
                  tabreport -i data.csv --contamination 0.1 --clusters 4 --seed 7\n\n  \
                  # Without the narrative section\n  \
                  tabreport -i data.csv --no-ai"
)]
struct Args {
    /// Path to the delimited-text file to analyze
    #[arg(short, long)]
    input: String,

    /// Output directory for the report and artifacts
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Custom base name for the enriched dataset file (without extension)
    #[arg(long)]
    output_name: Option<String>,

    /// Expected fraction of anomalous rows (0.0 - 0.5)
    #[arg(long, default_value = "0.05")]
    contamination: f64,

    /// Number of clusters for the partitioning stage
    #[arg(short = 'k', long, default_value = "3")]
    clusters: usize,

    /// Seed for every random-number source in the run
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Strategy for filling missing numeric values
    #[arg(long, value_enum, default_value = "mean")]
    imputation: CliImputeStrategy,

    /// Policy for numeric columns that are entirely missing
    #[arg(long, value_enum, default_value = "skip")]
    empty_columns: CliEmptyColumnPolicy,

    /// Which columns the enriched table retains
    #[arg(long, value_enum, default_value = "keep-all")]
    scope: CliColumnScope,

    /// Summarize before or after narrowing to numeric columns
    #[arg(long, value_enum, default_value = "before")]
    summary_timing: CliSummaryTiming,

    /// Maximum numeric columns included in distribution/pairwise charts
    #[arg(long, default_value = "3")]
    max_plot_columns: usize,

    /// Skip the narrative section even when an API key is available
    #[arg(long)]
    no_ai: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Output the result record as JSON to stdout instead of the summary
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled entirely so stdout only
/// contains the JSON record.
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
    dotenv().ok();

    // Load; a failed load aborts before anything is written
    let df = TableLoader::load(Path::new(&args.input))?;

    let mut config_builder = RunConfig::builder()
        .contamination(args.contamination)
        .clusters(args.clusters)
        .seed(args.seed)
        .impute_strategy(args.imputation.into())
        .empty_column_policy(args.empty_columns.into())
        .column_scope(args.scope.into())
        .summary_timing(args.summary_timing.into())
        .max_plot_columns(args.max_plot_columns)
        .output_dir(&args.output);
    if let Some(ref name) = args.output_name {
        config_builder = config_builder.output_name(name);
    }
    let config = config_builder.build()?;

    let mut builder = Pipeline::builder().config(config.clone());
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!("[{:>3.0}%] {}", update.progress * 100.0, update.message);
        });
    }
    let pipeline = builder.build()?;

    let mut result = pipeline
        .process(df)
        .map_err(|e| anyhow!("analysis failed: {}", e))?;

    // Success path: write artifacts; boundary failures are logged, the
    // run stays analytically successful
    let output_dir = Path::new(&args.output);
    let dataset_path = save_enriched_table(&mut result.table, &args, &config);

    if let Err(e) = ManifestRenderer.render(&result.table, &result.summary, &result.charts, output_dir)
    {
        warn!("[{}] {}", e.error_code(), e);
    }

    let narrative = fetch_narrative(&args, &result);

    let document = ReportWriter::build(
        &args.input,
        &result.summary,
        &result.charts,
        narrative.as_deref(),
    );
    let report_path = match ReportWriter::new(output_dir).write(&document) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("[{}] {}", e.error_code(), e);
            None
        }
    };

    if args.json {
        let record = serde_json::json!({
            "input": args.input,
            "summary": result.summary,
            "stages": result.stages,
            "charts": result.charts,
            "duration_ms": result.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    print_run_summary(&args, &result, dataset_path.as_deref(), report_path.as_deref());
    Ok(())
}

/// Write the enriched table next to the report.
fn save_enriched_table(df: &mut DataFrame, args: &Args, config: &RunConfig) -> Option<String> {
    let stem = Path::new(&args.input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    let name = config
        .output_name
        .clone()
        .unwrap_or_else(|| format!("{}_enriched", stem));
    let path = config.output_dir.join(format!("{}.csv", name));

    match write_csv(df, &config.output_dir, &path) {
        Ok(()) => {
            info!("Enriched dataset saved: {}", path.display());
            Some(path.display().to_string())
        }
        Err(e) => {
            warn!("Could not save enriched dataset: {}", e);
            None
        }
    }
}

fn write_csv(df: &mut DataFrame, dir: &Path, path: &Path) -> tabreport::error::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(())
}

/// Fetch the narrative section from the configured provider.
#[cfg(feature = "ai")]
fn fetch_narrative(args: &Args, result: &AnalysisResult) -> Option<String> {
    use tabreport::ai::{NarrativeProvider, OpenAiProvider, analysis_digest};

    if args.no_ai {
        return None;
    }

    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            info!("OPENAI_API_KEY not set, skipping the narrative section");
            return None;
        }
    };

    let provider = match OpenAiProvider::new(api_key) {
        Ok(provider) => provider,
        Err(e) => {
            warn!("Could not build narrative provider: {}", e);
            return None;
        }
    };

    let digest = analysis_digest(&result.summary, &result.charts);
    match provider.narrate(&digest) {
        Ok(narrative) => Some(narrative),
        Err(e) => {
            warn!("Narrative generation failed, keeping the template report: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "ai"))]
fn fetch_narrative(args: &Args, _result: &AnalysisResult) -> Option<String> {
    if !args.no_ai {
        info!("Narrative support not compiled in (enable the 'ai' feature)");
    }
    None
}

/// Print a human-readable summary of the run.
///
/// Intentionally `println!`: this is the primary output, visible
/// regardless of log level.
fn print_run_summary(
    args: &Args,
    result: &AnalysisResult,
    dataset_path: Option<&str>,
    report_path: Option<&Path>,
) {
    println!();
    println!("{}", "=".repeat(72));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(72));
    println!();
    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input, result.summary.row_count, result.summary.column_count
    );
    println!(
        "Output: {} ({} rows x {} columns enriched)",
        args.output,
        result.table.height(),
        result.table.width()
    );
    println!("Duration: {}ms", result.duration_ms);
    println!();

    println!("Stages:");
    for record in &result.stages {
        let status = match &record.status {
            tabreport::StageStatus::Completed => "done".to_string(),
            tabreport::StageStatus::Skipped { reason } => format!("skipped ({})", reason),
            tabreport::StageStatus::Failed { error } => format!("FAILED ({})", error),
        };
        println!("  {:<24} {}", record.stage.display_name(), status);
    }
    println!();

    if !result.charts.is_empty() {
        println!("Planned chart artifacts:");
        for chart in &result.charts {
            println!("  - {}", chart.file_name());
        }
        println!();
    }

    if let Some(path) = dataset_path {
        println!("Enriched dataset: {}", path);
    }
    if let Some(path) = report_path {
        println!("Report: {}", path.display());
    }
    println!();
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(72));
}
