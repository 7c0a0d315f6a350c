use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::info;
use ride_duration::config::{DEFAULT_DATASET_PATTERN, DEFAULT_MODEL_DIR};
use ride_duration::{PathPattern, TrainingConfig, run_training};

/// Retrain the duration model on the two months before a reference date
#[derive(Parser, Debug)]
#[command(name = "train", version, about)]
struct Cli {
    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Dataset location template with {year} and {month} placeholders
    #[arg(long, default_value = DEFAULT_DATASET_PATTERN)]
    dataset_pattern: String,
    /// Directory the model artifact is written to
    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,
    /// S3-compatible endpoint used for s3:// locations
    #[arg(long, env = "S3_ENDPOINT_URL")]
    s3_endpoint_url: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let config = TrainingConfig {
        dataset_pattern: PathPattern::new(cli.dataset_pattern),
        model_dir: cli.model_dir,
        storage_endpoint: cli.s3_endpoint_url.filter(|e| !e.trim().is_empty()),
        ..TrainingConfig::default()
    };

    let summary =
        run_training(&config, date).with_context(|| format!("retraining failed for {date}"))?;

    info!(
        "Trained on {} rides ({} features), validation RMSE {:.3}, model at {}",
        summary.train_rows,
        summary.n_features,
        summary.validation_rmse,
        summary.model_path.display()
    );
    Ok(())
}
