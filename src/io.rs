//! Parquet input and output for ride tables and predictions

use std::fmt::Display;

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::batch::PredictionRow;
use crate::error::Result;
use crate::schema::{prediction_fields, prediction_schema};
use crate::storage::{Location, StorageOptions, read_bytes, write_bytes};
use crate::table::RideTable;
use crate::utils::log_warning;

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Read a whole Parquet object into a ride table
///
/// Row indices are assigned in file order, starting at zero.
pub fn read_ride_table(location: &Location, options: &StorageOptions) -> Result<RideTable> {
    let data = read_bytes(location, options)?;
    let table = decode_ride_table(data)?;
    if table.is_empty() {
        log_warning("Input file contains no rows", Some(location as &dyn Display));
    }
    Ok(table)
}

/// Decode Parquet bytes into a ride table
pub fn decode_ride_table(data: Bytes) -> Result<RideTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let schema = builder.schema().clone();
    let reader = builder.with_batch_size(DEFAULT_BATCH_SIZE).build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    RideTable::from_batches(schema, &batches)
}

/// Encode a record batch as an uncompressed Parquet file
pub fn encode_batch(batch: &RecordBatch) -> Result<Bytes> {
    let props = WriterProperties::builder()
        .set_compression(Compression::UNCOMPRESSED)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(Bytes::from(buffer))
}

/// Convert prediction rows to a two-column record batch
pub fn predictions_to_batch(rows: &[PredictionRow]) -> Result<RecordBatch> {
    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(prediction_schema()));
    }
    Ok(serde_arrow::to_record_batch(&prediction_fields(), &rows)?)
}

/// Decode a prediction file back into rows
pub fn decode_predictions(data: Bytes) -> Result<Vec<PredictionRow>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let reader = builder.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let decoded: Vec<PredictionRow> = serde_arrow::from_record_batch(&batch)?;
        rows.extend(decoded);
    }
    Ok(rows)
}

/// Write prediction rows as Parquet with exactly `ride_id` and `predicted_duration`
pub fn write_predictions(
    rows: &[PredictionRow],
    location: &Location,
    options: &StorageOptions,
) -> Result<()> {
    let batch = predictions_to_batch(rows)?;
    let data = encode_batch(&batch)?;
    write_bytes(location, options, data)
}

/// Read a prediction file from storage
pub fn read_predictions(location: &Location, options: &StorageOptions) -> Result<Vec<PredictionRow>> {
    decode_predictions(read_bytes(location, options)?)
}

/// Write a ride table's batch as Parquet, without its row index
pub fn write_ride_table(table: &RideTable, location: &Location, options: &StorageOptions) -> Result<()> {
    let data = encode_batch(table.batch())?;
    write_bytes(location, options, data)
}
