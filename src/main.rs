use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use ride_duration::config::DEFAULT_MODEL_PATH;
use ride_duration::{BatchConfig, run_batch};

/// Score one month of FHV rides and write predicted durations
#[derive(Parser, Debug)]
#[command(name = "ride-duration", version, about)]
struct Cli {
    /// Partition year, e.g. 2021
    year: i32,
    /// Partition month, 1-12
    month: u32,
    /// Input location template with {year} and {month} placeholders
    #[arg(long, env = "INPUT_FILE_PATTERN")]
    input_pattern: Option<String>,
    /// Output location template with {year} and {month} placeholders
    #[arg(long, env = "OUTPUT_FILE_PATTERN")]
    output_pattern: Option<String>,
    /// S3-compatible endpoint used for s3:// locations
    #[arg(long, env = "S3_ENDPOINT_URL")]
    s3_endpoint_url: Option<String>,
    /// Model artifact produced by the `train` binary
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
}

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = BatchConfig::default()
        .with_input_pattern(cli.input_pattern)
        .with_output_pattern(cli.output_pattern)
        .with_storage_endpoint(cli.s3_endpoint_url)
        .with_model_path(cli.model);

    let summary = run_batch(&config, cli.year, cli.month).with_context(|| {
        format!("batch scoring failed for {:04}-{:02}", cli.year, cli.month)
    })?;

    info!(
        "Scored {} of {} rides, results in {}",
        summary.rows_scored, summary.rows_read, summary.output
    );
    Ok(())
}
