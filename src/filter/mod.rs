//! Row filtering for ride record batches
//!
//! Filters are expressed as boolean masks and applied to every column with
//! the Arrow `filter` kernel, which keeps the relative order of rows.

use arrow::array::{ArrayRef, BooleanArray, Float64Array};
use arrow::compute::filter as arrow_filter;
use arrow::record_batch::RecordBatch;

use crate::error::{RideDurationError, Result};

/// Filter a record batch based on a boolean mask
///
/// Null mask entries drop the row.
///
/// # Errors
/// Returns an error if the mask length doesn't match the batch or filtering fails
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(RideDurationError::Arrow(
            arrow::error::ArrowError::InvalidArgumentError(format!(
                "Mask length ({}) doesn't match batch row count ({})",
                mask.len(),
                batch.num_rows()
            )),
        ));
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, mask))
        .collect::<std::result::Result<_, _>>()?;

    Ok(RecordBatch::try_new(batch.schema(), filtered_columns)?)
}

/// Inclusive range of accepted ride durations in minutes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationRange {
    pub min_minutes: f64,
    pub max_minutes: f64,
}

impl Default for DurationRange {
    fn default() -> Self {
        Self {
            min_minutes: 1.0,
            max_minutes: 60.0,
        }
    }
}

impl DurationRange {
    #[must_use]
    pub fn contains(&self, minutes: f64) -> bool {
        minutes >= self.min_minutes && minutes <= self.max_minutes
    }

    /// Build a keep-mask over a duration column. Null durations are dropped.
    #[must_use]
    pub fn mask(&self, durations: &Float64Array) -> BooleanArray {
        durations
            .iter()
            .map(|d| Some(d.is_some_and(|minutes| self.contains(minutes))))
            .collect()
    }
}
