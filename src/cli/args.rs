use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::LoadStrategy;
use crate::writers::ExportFormat;

#[derive(Parser)]
#[command(name = "weather-etl")]
#[command(about = "Weather observation transform and load pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transform raw observations and load them into the database
    Run {
        #[arg(short, long, help = "Input JSON file of raw observations")]
        input: PathBuf,

        #[arg(long, help = "Database URL (overrides configuration)")]
        database_url: Option<String>,

        #[arg(short, long, value_enum, default_value = "upsert")]
        strategy: LoadStrategy,

        #[arg(long, help = "Also export transformed records to this path")]
        export: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "csv")]
        export_format: ExportFormat,
    },

    /// Transform raw observations and write them to a file, skipping the database
    Transform {
        #[arg(short, long, help = "Input JSON file of raw observations")]
        input: PathBuf,

        #[arg(short, long, help = "Output file path")]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },

    /// Display aggregate statistics for the stored data
    Summary {
        #[arg(long, help = "Database URL (overrides configuration)")]
        database_url: Option<String>,
    },
}
