//! Batch scoring for one (year, month) partition

use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{BatchConfig, validate_month};
use crate::error::{RideDurationError, Result};
use crate::features::table_to_dicts;
use crate::io::{read_ride_table, write_predictions};
use crate::model::ModelArtifact;
use crate::prepare::prepare;
use crate::storage::Location;
use crate::table::RideTable;
use crate::utils::log_operation_complete;

/// One row of the prediction output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub ride_id: String,
    pub predicted_duration: f64,
}

/// What a batch run did
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub input: String,
    pub output: String,
    pub rows_read: usize,
    pub rows_scored: usize,
    pub mean_predicted_duration: Option<f64>,
}

/// Ride identifiers `{year:04}/{month:02}_{row_index}` for every row of a table
#[must_use]
pub fn ride_ids(table: &RideTable, year: i32, month: u32) -> Vec<String> {
    table
        .row_index()
        .values()
        .iter()
        .map(|idx| format!("{year:04}/{month:02}_{idx}"))
        .collect()
}

/// Score an already loaded table with a model artifact
pub fn score_table<S: AsRef<str>>(
    table: &RideTable,
    categorical: &[S],
    artifact: &ModelArtifact,
    year: i32,
    month: u32,
) -> Result<Vec<PredictionRow>> {
    let prepared = prepare(table, categorical)?;
    let dicts = table_to_dicts(&prepared, categorical)?;
    let predictions = artifact.predict(&dicts)?;

    Ok(ride_ids(&prepared, year, month)
        .into_iter()
        .zip(predictions.iter())
        .map(|(ride_id, &predicted_duration)| PredictionRow {
            ride_id,
            predicted_duration,
        })
        .collect())
}

/// Run the batch job: read, prepare, predict, write
///
/// All-or-nothing: any failure aborts the run before the output is written.
pub fn run_batch(config: &BatchConfig, year: i32, month: u32) -> Result<BatchSummary> {
    validate_month(month)?;
    let start = Instant::now();
    let input = config.input_path(year, month)?;
    let output = config.output_path(year, month)?;
    let options = config.storage_options();
    info!("Scoring rides for {year:04}-{month:02}: {input} -> {output}");

    let artifact = ModelArtifact::load(&config.model_path)?;
    if config.categorical.is_empty() {
        return Err(RideDurationError::config("no categorical columns configured"));
    }

    let input_location = Location::parse(&input)?;
    let output_location = Location::parse(&output)?;

    let table = read_ride_table(&input_location, &options)?;
    let rows = score_table(&table, &config.categorical, &artifact, year, month)?;

    let mean_predicted_duration = if rows.is_empty() {
        None
    } else {
        Some(rows.iter().map(|r| r.predicted_duration).sum::<f64>() / rows.len() as f64)
    };
    match mean_predicted_duration {
        Some(mean) => info!("predicted mean duration: {mean}"),
        None => info!("no rides survived preparation; writing an empty prediction file"),
    }

    write_predictions(&rows, &output_location, &options)?;
    log_operation_complete("scored", &input_location, rows.len(), Some(start.elapsed()));

    Ok(BatchSummary {
        input,
        output,
        rows_read: table.num_rows(),
        rows_scored: rows.len(),
        mean_predicted_duration,
    })
}
