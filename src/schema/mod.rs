//! Column names and schemas for ride records and predictions

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};

use crate::error::{RideDurationError, Result};

/// Pickup timestamp column
pub const PICKUP_COLUMN: &str = "pickup_datetime";

/// Dropoff timestamp column. The FHV files spell it `dropOff_datetime`,
/// which [`resolve_column`] accepts through its case-insensitive fallback.
pub const DROPOFF_COLUMN: &str = "dropoff_datetime";

/// Derived ride length in minutes
pub const DURATION_COLUMN: &str = "duration";

/// Synthesized ride identifier in the output table
pub const RIDE_ID_COLUMN: &str = "ride_id";

/// Model output in the output table
pub const PREDICTED_DURATION_COLUMN: &str = "predicted_duration";

/// Find a column by name, falling back to an ASCII case-insensitive match
///
/// # Returns
/// The column index and the name as spelled in the schema
///
/// # Errors
/// Returns `MissingColumn` if no column matches
pub fn resolve_column(schema: &Schema, name: &str) -> Result<(usize, String)> {
    if let Ok(idx) = schema.index_of(name) {
        return Ok((idx, name.to_string()));
    }

    schema
        .fields()
        .iter()
        .position(|f| f.name().eq_ignore_ascii_case(name))
        .map(|idx| (idx, schema.field(idx).name().clone()))
        .ok_or_else(|| RideDurationError::MissingColumn(name.to_string()))
}

/// Fields of the prediction output table
#[must_use]
pub fn prediction_fields() -> Vec<FieldRef> {
    vec![
        Arc::new(Field::new(RIDE_ID_COLUMN, DataType::Utf8, false)),
        Arc::new(Field::new(PREDICTED_DURATION_COLUMN, DataType::Float64, false)),
    ]
}

/// Arrow schema of the prediction output table
#[must_use]
pub fn prediction_schema() -> SchemaRef {
    Arc::new(Schema::new(prediction_fields()))
}
