//! Ride record tables with an explicit positional row index
//!
//! The row index is assigned once, when the table is loaded, and travels
//! with every row through filtering. Ride identifiers are derived from it.

use arrow::array::{Array, UInt64Array};
use arrow::compute::{concat_batches, filter as arrow_filter};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{RideDurationError, Result};
use crate::filter::filter_record_batch;

/// An in-memory table of ride records
#[derive(Debug, Clone, PartialEq)]
pub struct RideTable {
    batch: RecordBatch,
    row_index: UInt64Array,
}

impl RideTable {
    /// Wrap a batch, assigning row indices `0..n`
    #[must_use]
    pub fn new(batch: RecordBatch) -> Self {
        let row_index = UInt64Array::from_iter_values(0..batch.num_rows() as u64);
        Self { batch, row_index }
    }

    /// Concatenate the batches of one file into a single table in file order
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self::new(batch))
    }

    /// Wrap a batch together with an existing row index
    ///
    /// # Errors
    /// Returns an error if the index length doesn't match the batch or contains nulls
    pub fn with_row_index(batch: RecordBatch, row_index: UInt64Array) -> Result<Self> {
        if row_index.len() != batch.num_rows() {
            return Err(RideDurationError::config(format!(
                "row index has {} entries but the batch has {} rows",
                row_index.len(),
                batch.num_rows()
            )));
        }
        if row_index.null_count() > 0 {
            return Err(RideDurationError::config("row index must not contain nulls"));
        }
        Ok(Self { batch, row_index })
    }

    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    #[must_use]
    pub fn row_index(&self) -> &UInt64Array {
        &self.row_index
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Keep the rows where `mask` is true, filtering the index alongside
    pub fn filter(&self, mask: &arrow::array::BooleanArray) -> Result<Self> {
        let batch = filter_record_batch(&self.batch, mask)?;
        let filtered = arrow_filter(&self.row_index, mask)?;
        let row_index = filtered
            .as_any()
            .downcast_ref::<UInt64Array>()
            .cloned()
            .ok_or_else(|| RideDurationError::config("row index lost its type while filtering"))?;
        Ok(Self { batch, row_index })
    }

    /// Replace the batch, keeping the row index
    pub(crate) fn replace_batch(&self, batch: RecordBatch) -> Result<Self> {
        Self::with_row_index(batch, self.row_index.clone())
    }
}
