//! Configuration for batch scoring and retraining runs.
//!
//! The library never reads the process environment. The binaries map
//! `INPUT_FILE_PATTERN`, `OUTPUT_FILE_PATTERN` and `S3_ENDPOINT_URL` onto
//! these structs and pass them in explicitly.

mod pattern;

use std::path::PathBuf;

pub use pattern::PathPattern;

use crate::error::{RideDurationError, Result};
use crate::storage::StorageOptions;

/// Default source of FHV trip records
pub const DEFAULT_INPUT_PATTERN: &str = "https://raw.githubusercontent.com/alexeygrigorev/datasets/master/nyc-tlc/fhv/fhv_tripdata_{year:04d}-{month:02d}.parquet";

/// Default destination for prediction files
///
/// Local, since S3 writes are unsigned. Point `OUTPUT_FILE_PATTERN` at an
/// `s3://` location to upload to a public bucket or an emulator endpoint.
pub const DEFAULT_OUTPUT_PATTERN: &str = "output/taxi_type=fhv/year={year:04d}/month={month:02d}/predictions.parquet";

/// Default location of the local training dataset
pub const DEFAULT_DATASET_PATTERN: &str = "../data/fhv/fhv_tripdata_{year}-{month:02d}.parquet";

/// Default model artifact path for batch scoring
pub const DEFAULT_MODEL_PATH: &str = "model.json";

/// Default directory retrained artifacts are written to
pub const DEFAULT_MODEL_DIR: &str = "./models";

/// Categorical columns used by the FHV duration model
pub const DEFAULT_CATEGORICAL: [&str; 2] = ["PUlocationID", "DOlocationID"];

fn default_categorical() -> Vec<String> {
    DEFAULT_CATEGORICAL.iter().map(ToString::to_string).collect()
}

/// Check a month number before it is used for templating
pub fn validate_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(RideDurationError::config(format!(
            "month must be between 1 and 12, got {month}"
        )))
    }
}

/// Configuration for one batch scoring run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Template for the input file location
    pub input_pattern: PathPattern,
    /// Template for the output file location
    pub output_pattern: PathPattern,
    /// Optional S3-compatible endpoint override
    pub storage_endpoint: Option<String>,
    /// Path to the JSON model artifact
    pub model_path: PathBuf,
    /// Categorical columns fed to the vectorizer
    pub categorical: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_pattern: PathPattern::new(DEFAULT_INPUT_PATTERN),
            output_pattern: PathPattern::new(DEFAULT_OUTPUT_PATTERN),
            storage_endpoint: None,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            categorical: default_categorical(),
        }
    }
}

impl BatchConfig {
    /// Override the input pattern when one is given
    #[must_use]
    pub fn with_input_pattern(mut self, pattern: Option<impl Into<PathPattern>>) -> Self {
        if let Some(pattern) = pattern {
            self.input_pattern = pattern.into();
        }
        self
    }

    /// Override the output pattern when one is given
    #[must_use]
    pub fn with_output_pattern(mut self, pattern: Option<impl Into<PathPattern>>) -> Self {
        if let Some(pattern) = pattern {
            self.output_pattern = pattern.into();
        }
        self
    }

    /// Set the storage endpoint override; blank values count as unset
    #[must_use]
    pub fn with_storage_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.storage_endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Input location for a partition
    pub fn input_path(&self, year: i32, month: u32) -> Result<String> {
        validate_month(month)?;
        self.input_pattern.format(year, month)
    }

    /// Output location for a partition
    pub fn output_path(&self, year: i32, month: u32) -> Result<String> {
        validate_month(month)?;
        self.output_pattern.format(year, month)
    }

    /// Storage options derived from the endpoint override
    #[must_use]
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            endpoint_url: self.storage_endpoint.clone(),
        }
    }
}

/// Configuration for the monthly retraining run
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Template for the monthly dataset files
    pub dataset_pattern: PathPattern,
    /// Directory the artifact is written to
    pub model_dir: PathBuf,
    /// Optional S3-compatible endpoint override for dataset reads
    pub storage_endpoint: Option<String>,
    /// Categorical columns fed to the vectorizer
    pub categorical: Vec<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_pattern: PathPattern::new(DEFAULT_DATASET_PATTERN),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            storage_endpoint: None,
            categorical: default_categorical(),
        }
    }
}

impl TrainingConfig {
    #[must_use]
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            endpoint_url: self.storage_endpoint.clone(),
        }
    }
}
