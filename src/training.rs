//! Monthly retraining of the duration model
//!
//! A run for reference date `D` trains on the partition two months before
//! `D` and validates on the partition one month before it. The artifact is
//! written to `{model_dir}/model-{D}.json`.

use std::path::PathBuf;

use arrow::array::{Array, Float64Array};
use chrono::{Datelike, Months, NaiveDate};
use log::info;

use crate::config::TrainingConfig;
use crate::error::{RideDurationError, Result};
use crate::features::{DictVectorizer, table_to_dicts};
use crate::io::read_ride_table;
use crate::model::{LinearRegression, ModelArtifact, rmse};
use crate::prepare::prepare;
use crate::schema::DURATION_COLUMN;
use crate::storage::Location;
use crate::table::RideTable;

/// A (year, month) data partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub year: i32,
    pub month: u32,
}

impl Partition {
    fn months_before(date: NaiveDate, months: u32) -> Result<Self> {
        let shifted = date
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| RideDurationError::config(format!("cannot go {months} months back from {date}")))?;
        Ok(Self {
            year: shifted.year(),
            month: shifted.month(),
        })
    }
}

/// Which partitions a retraining run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingPlan {
    pub date: NaiveDate,
    pub train: Partition,
    pub validation: Partition,
}

impl TrainingPlan {
    pub fn for_date(date: NaiveDate) -> Result<Self> {
        Ok(Self {
            date,
            train: Partition::months_before(date, 2)?,
            validation: Partition::months_before(date, 1)?,
        })
    }
}

/// Outcome of a retraining run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub plan: TrainingPlan,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub n_features: usize,
    pub train_rmse: f64,
    pub validation_rmse: f64,
    pub model_path: PathBuf,
}

fn durations(table: &RideTable) -> Result<Vec<f64>> {
    let batch = table.batch();
    let idx = batch
        .schema()
        .index_of(DURATION_COLUMN)
        .map_err(|_| RideDurationError::MissingColumn(DURATION_COLUMN.to_string()))?;
    let column = batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| RideDurationError::ColumnType {
            column: DURATION_COLUMN.to_string(),
            data_type: batch.column(idx).data_type().to_string(),
        })?;
    Ok(column.values().to_vec())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn load_partition(config: &TrainingConfig, partition: Partition, label: &str) -> Result<RideTable> {
    let path = config.dataset_pattern.format(partition.year, partition.month)?;
    info!("{label} path: {path}");
    let table = read_ride_table(&Location::parse(&path)?, &config.storage_options())?;
    let prepared = prepare(&table, &config.categorical)?;
    Ok(prepared)
}

/// Fit a vectorizer and regressor on a prepared table
pub fn train_model<S: AsRef<str>>(table: &RideTable, categorical: &[S]) -> Result<(ModelArtifact, f64)> {
    let dicts = table_to_dicts(table, categorical)?;
    let y = durations(table)?;
    let (vectorizer, x) = DictVectorizer::fit_transform(&dicts);
    info!("The shape of the training matrix is ({}, {})", x.n_rows(), x.n_features);
    info!("The DictVectorizer has {} features", vectorizer.n_features());

    let regressor = LinearRegression::fit(&x, &y)?;
    let y_pred = regressor.predict(&x)?.to_vec();
    let train_rmse = rmse(&y, &y_pred)?;
    info!("The RMSE of training is: {train_rmse}");

    Ok((
        ModelArtifact {
            vectorizer,
            regressor,
        },
        train_rmse,
    ))
}

/// Evaluate an artifact on a prepared table
pub fn evaluate<S: AsRef<str>>(artifact: &ModelArtifact, table: &RideTable, categorical: &[S]) -> Result<f64> {
    let dicts = table_to_dicts(table, categorical)?;
    let y = durations(table)?;
    let y_pred = artifact.predict(&dicts)?.to_vec();
    rmse(&y, &y_pred)
}

/// Retrain the model for a reference date and save the artifact
pub fn run_training(config: &TrainingConfig, date: NaiveDate) -> Result<TrainingSummary> {
    let plan = TrainingPlan::for_date(date)?;
    info!(
        "{date}: training on {:04}-{:02}, validating on {:04}-{:02}",
        plan.train.year, plan.train.month, plan.validation.year, plan.validation.month
    );

    let train = load_partition(config, plan.train, "train")?;
    info!("The mean duration of training is {}", mean(&durations(&train)?));
    let validation = load_partition(config, plan.validation, "validation")?;
    info!("The mean duration of validation is {}", mean(&durations(&validation)?));

    let (artifact, train_rmse) = train_model(&train, &config.categorical)?;
    let validation_rmse = evaluate(&artifact, &validation, &config.categorical)?;
    info!("The RMSE of validation is: {validation_rmse}");

    let model_path = config.model_dir.join(format!("model-{date}.json"));
    artifact.save(&model_path)?;
    info!("Saved model to {}", model_path.display());

    Ok(TrainingSummary {
        plan,
        train_rows: train.num_rows(),
        validation_rows: validation.num_rows(),
        n_features: artifact.vectorizer.n_features(),
        train_rmse,
        validation_rmse,
        model_path,
    })
}
