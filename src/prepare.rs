//! Trip record preparation
//!
//! [`prepare`] is the single transform between a raw ride table and the
//! feature vectorizer. It derives the ride duration in minutes, keeps only
//! rides lasting between 1 and 60 minutes (inclusive), and rewrites every
//! categorical column as canonical integer strings, with `"-1"` standing in
//! for missing values. The input table is left untouched.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, AsArray, Float64Array, OffsetSizeTrait, PrimitiveArray,
    StringArray, UInt64Array,
};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, Schema,
    TimeUnit, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{RideDurationError, Result};
use crate::filter::DurationRange;
use crate::schema::{DROPOFF_COLUMN, DURATION_COLUMN, PICKUP_COLUMN, resolve_column};
use crate::table::RideTable;

/// Value written for missing categorical entries
pub const MISSING_CATEGORY: i64 = -1;

/// Prepare a ride table for feature encoding
///
/// # Arguments
/// * `table` - Raw ride records with pickup/dropoff timestamps
/// * `categorical` - Names of the categorical location columns
///
/// # Returns
/// A new table holding only rides with `1 <= duration <= 60`, in their
/// original order and with their original row indices, a `duration`
/// column, and the categorical columns re-encoded as non-null strings
///
/// # Errors
/// * `Config` if `categorical` is empty
/// * `MissingColumn` if a timestamp or categorical column is absent
/// * `ColumnType` if a column has a type that cannot be interpreted
/// * `Categorical` if a surviving categorical value is not integer-like
pub fn prepare<S: AsRef<str>>(table: &RideTable, categorical: &[S]) -> Result<RideTable> {
    if categorical.is_empty() {
        return Err(RideDurationError::config(
            "at least one categorical column is required",
        ));
    }

    let schema = table.schema();
    let (pickup_idx, pickup_name) = resolve_column(&schema, PICKUP_COLUMN)?;
    let (dropoff_idx, dropoff_name) = resolve_column(&schema, DROPOFF_COLUMN)?;
    let categorical_columns = categorical
        .iter()
        .map(|name| resolve_column(&schema, name.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let batch = table.batch();
    let pickup = timestamp_nanos(batch.column(pickup_idx), &pickup_name)?;
    let dropoff = timestamp_nanos(batch.column(dropoff_idx), &dropoff_name)?;
    let durations = duration_minutes(&pickup, &dropoff);

    let range = DurationRange::default();
    let mask = range.mask(&durations);
    let kept = table.filter(&mask)?;
    let kept_durations = arrow::compute::filter(&durations, &mask)?;
    debug!(
        "Duration filter kept {} of {} rides",
        kept.num_rows(),
        table.num_rows()
    );

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = kept.batch().columns().to_vec();

    for (idx, name) in &categorical_columns {
        let encoded = encode_categorical(&columns[*idx], name, kept.row_index())?;
        columns[*idx] = Arc::new(encoded);
        fields[*idx] = Field::new(name.clone(), DataType::Utf8, false);
    }

    let duration_field = Field::new(DURATION_COLUMN, DataType::Float64, false);
    match schema.index_of(DURATION_COLUMN) {
        Ok(idx) => {
            fields[idx] = duration_field;
            columns[idx] = kept_durations;
        }
        Err(_) => {
            fields.push(duration_field);
            columns.push(kept_durations);
        }
    }

    let prepared = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    kept.replace_batch(prepared)
}

/// Ride duration in minutes for every row; null where either timestamp is null
fn duration_minutes(pickup: &[Option<i128>], dropoff: &[Option<i128>]) -> Float64Array {
    pickup
        .iter()
        .zip(dropoff)
        .map(|(start, end)| match (start, end) {
            (Some(start), Some(end)) => Some((end - start) as f64 / 1e9 / 60.0),
            _ => None,
        })
        .collect()
}

/// Read a timestamp column of any unit as nanoseconds since the epoch
fn timestamp_nanos(array: &ArrayRef, column: &str) -> Result<Vec<Option<i128>>> {
    fn scaled<T: ArrowPrimitiveType<Native = i64>>(
        array: &PrimitiveArray<T>,
        factor: i128,
    ) -> Vec<Option<i128>> {
        array.iter().map(|v| v.map(|v| i128::from(v) * factor)).collect()
    }

    match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            Ok(scaled(array.as_primitive::<TimestampSecondType>(), 1_000_000_000))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            Ok(scaled(array.as_primitive::<TimestampMillisecondType>(), 1_000_000))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            Ok(scaled(array.as_primitive::<TimestampMicrosecondType>(), 1_000))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            Ok(scaled(array.as_primitive::<TimestampNanosecondType>(), 1))
        }
        other => Err(RideDurationError::ColumnType {
            column: column.to_string(),
            data_type: other.to_string(),
        }),
    }
}

/// Re-encode a categorical column as canonical integer strings
fn encode_categorical(
    array: &ArrayRef,
    column: &str,
    row_index: &UInt64Array,
) -> Result<StringArray> {
    let encoded: StringArray = match array.data_type() {
        DataType::Null => (0..array.len())
            .map(|_| Some(MISSING_CATEGORY.to_string()))
            .collect(),
        DataType::Int8 => encode_integers(array.as_primitive::<Int8Type>()),
        DataType::Int16 => encode_integers(array.as_primitive::<Int16Type>()),
        DataType::Int32 => encode_integers(array.as_primitive::<Int32Type>()),
        DataType::Int64 => encode_integers(array.as_primitive::<Int64Type>()),
        DataType::UInt8 => encode_integers(array.as_primitive::<UInt8Type>()),
        DataType::UInt16 => encode_integers(array.as_primitive::<UInt16Type>()),
        DataType::UInt32 => encode_integers(array.as_primitive::<UInt32Type>()),
        DataType::UInt64 => encode_integers(array.as_primitive::<UInt64Type>()),
        DataType::Float32 => encode_floats(
            array.as_primitive::<Float32Type>().iter().map(|v| v.map(f64::from)),
            column,
            row_index,
        )?,
        DataType::Float64 => {
            encode_floats(array.as_primitive::<Float64Type>().iter(), column, row_index)?
        }
        DataType::Utf8 => encode_strings(array.as_string::<i32>(), column, row_index)?,
        DataType::LargeUtf8 => encode_strings(array.as_string::<i64>(), column, row_index)?,
        DataType::Dictionary(_, value_type)
            if matches!(value_type.as_ref(), DataType::Utf8 | DataType::LargeUtf8) =>
        {
            let decoded = cast(array, &DataType::Utf8)?;
            encode_strings(decoded.as_string::<i32>(), column, row_index)?
        }
        other => {
            return Err(RideDurationError::ColumnType {
                column: column.to_string(),
                data_type: other.to_string(),
            });
        }
    };
    Ok(encoded)
}

fn encode_integers<T>(array: &PrimitiveArray<T>) -> StringArray
where
    T: ArrowPrimitiveType,
    T::Native: ToString,
{
    array
        .iter()
        .map(|v| {
            Some(match v {
                Some(v) => v.to_string(),
                None => MISSING_CATEGORY.to_string(),
            })
        })
        .collect()
}

fn encode_floats(
    values: impl Iterator<Item = Option<f64>>,
    column: &str,
    row_index: &UInt64Array,
) -> Result<StringArray> {
    values
        .enumerate()
        .map(|(pos, v)| match v {
            None => Ok(Some(MISSING_CATEGORY.to_string())),
            Some(v) if v.is_nan() => Ok(Some(MISSING_CATEGORY.to_string())),
            Some(v) if v.is_finite() && v.trunc() >= i64::MIN as f64 && v.trunc() < i64::MAX as f64 => {
                Ok(Some((v.trunc() as i64).to_string()))
            }
            Some(v) => Err(categorical_error(column, row_index, pos, v.to_string())),
        })
        .collect()
}

fn encode_strings<O: OffsetSizeTrait>(
    array: &arrow::array::GenericStringArray<O>,
    column: &str,
    row_index: &UInt64Array,
) -> Result<StringArray> {
    array
        .iter()
        .enumerate()
        .map(|(pos, v)| match v {
            None => Ok(Some(MISSING_CATEGORY.to_string())),
            Some(text) => text
                .trim()
                .parse::<i64>()
                .map(|n| Some(n.to_string()))
                .map_err(|_| categorical_error(column, row_index, pos, text.to_string())),
        })
        .collect()
}

fn categorical_error(
    column: &str,
    row_index: &UInt64Array,
    pos: usize,
    value: String,
) -> RideDurationError {
    RideDurationError::Categorical {
        column: column.to_string(),
        row: row_index.value(pos) as usize,
        value,
    }
}
