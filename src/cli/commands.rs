use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{LoadStrategy, QualityMetrics};
use crate::pipeline::Pipeline;
use crate::readers::read_observations;
use crate::store::{DatabaseConfig, UpsertLoader};
use crate::utils::progress::ProgressReporter;
use crate::writers::{ExportFormat, RecordExporter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            database_url,
            strategy,
            export,
            export_format,
        } => {
            run_pipeline(
                &input,
                cli.config.as_deref(),
                database_url,
                strategy,
                export,
                export_format,
            )
            .await?;
        }

        Commands::Transform {
            input,
            output,
            format,
        } => {
            let (records, metrics) = transform(&input)?;
            print_metrics(&metrics);

            RecordExporter::new().export(&records, &output, format)?;
            println!(
                "Wrote {} records to {}",
                records.len(),
                output.display()
            );
        }

        Commands::Summary { database_url } => {
            let config = resolve_database(cli.config.as_deref(), database_url)?;
            let loader = UpsertLoader::connect(&config).await?;
            let summary = loader.get_data_summary().await?;
            println!("{}", summary.summary());
        }
    }

    Ok(())
}

async fn run_pipeline(
    input: &Path,
    config_file: Option<&Path>,
    database_url: Option<String>,
    strategy: LoadStrategy,
    export: Option<PathBuf>,
    export_format: ExportFormat,
) -> Result<()> {
    let (records, metrics) = transform(input)?;
    print_metrics(&metrics);

    if let Some(path) = &export {
        RecordExporter::new().export(&records, path, export_format)?;
        println!("Exported {} records to {}", records.len(), path.display());
    }

    let config = resolve_database(config_file, database_url)?;
    let loader = UpsertLoader::connect(&config).await?;

    let result = loader.load(&records, strategy).await?;
    println!("\n=== Load Result ===");
    println!("Status: {}", result.status.as_str());
    println!("Records loaded: {}", result.records_loaded);
    println!("Records failed: {}", result.records_failed);
    println!("Duration: {:.2}s", result.load_duration_seconds);
    if let Some(message) = &result.error_message {
        println!("Error: {}", message);
    }

    if result.is_success() {
        loader.load_quality_metrics(&metrics).await?;
        let summary = loader.get_data_summary().await?;
        println!("\n{}", summary.summary());
    }

    Ok(())
}

fn transform(input: &Path) -> Result<(Vec<crate::models::Observation>, QualityMetrics)> {
    println!("Reading observations from {}", input.display());
    let raw = read_observations(input)?;

    let progress = ProgressReporter::new_spinner("Transforming observations...", false);
    let (records, metrics) = Pipeline::new().transform(raw);
    progress.finish_with_message(&format!("Transformed {} records", records.len()));

    Ok((records, metrics))
}

fn resolve_database(
    config_file: Option<&Path>,
    database_url: Option<String>,
) -> Result<DatabaseConfig> {
    match database_url {
        Some(url) => DatabaseConfig::from_url(&url),
        None => Ok(AppConfig::load(config_file)?.database),
    }
}

fn print_metrics(metrics: &QualityMetrics) {
    println!("\n=== Transformation Report ===");
    println!("Records in: {}", metrics.total_records_input);
    println!("Records out: {}", metrics.total_records_output);
    println!(
        "Retention rate: {:.1}%",
        metrics.data_retention_rate * 100.0
    );
    println!(
        "Average quality score: {:.1}/100",
        metrics.average_quality_score
    );
    println!(
        "Missing values: {:.1}%",
        metrics.missing_values_percentage
    );
    println!(
        "Unique cities: {}, countries: {}",
        metrics.unique_cities, metrics.unique_countries
    );
    if let (Some(min), Some(max)) = (metrics.timestamp_min, metrics.timestamp_max) {
        println!("Time range: {} to {}", min, max);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
