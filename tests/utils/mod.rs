use std::path::Path;
use std::sync::Arc;

use arrow::array::{Int64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use ride_duration::io::write_ride_table;
use ride_duration::{Location, RecordBatch, Result, RideTable, StorageOptions};

/// One raw trip as it appears in an FHV file
#[derive(Debug, Clone, Copy)]
pub struct Trip {
    pub pu: Option<i64>,
    pub do_: Option<i64>,
    pub pickup: NaiveDateTime,
    pub dropoff: NaiveDateTime,
}

impl Trip {
    /// Trip starting at `pickup` lasting `minutes`
    #[must_use]
    pub fn lasting(pu: Option<i64>, do_: Option<i64>, pickup: NaiveDateTime, minutes: i64) -> Self {
        Self {
            pu,
            do_,
            pickup,
            dropoff: pickup + Duration::minutes(minutes),
        }
    }
}

#[must_use]
pub fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .unwrap()
}

/// Raw FHV schema, with the dataset's `dropOff_datetime` spelling
#[must_use]
pub fn trip_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("PUlocationID", DataType::Int64, true),
        Field::new("DOlocationID", DataType::Int64, true),
        Field::new(
            "pickup_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
        Field::new(
            "dropOff_datetime",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
    ]))
}

#[must_use]
pub fn trip_batch(trips: &[Trip]) -> RecordBatch {
    let pu: Int64Array = trips.iter().map(|t| t.pu).collect();
    let do_: Int64Array = trips.iter().map(|t| t.do_).collect();
    let pickup: TimestampMicrosecondArray = trips
        .iter()
        .map(|t| Some(t.pickup.and_utc().timestamp_micros()))
        .collect();
    let dropoff: TimestampMicrosecondArray = trips
        .iter()
        .map(|t| Some(t.dropoff.and_utc().timestamp_micros()))
        .collect();
    RecordBatch::try_new(
        trip_schema(),
        vec![
            Arc::new(pu),
            Arc::new(do_),
            Arc::new(pickup),
            Arc::new(dropoff),
        ],
    )
    .unwrap()
}

/// The four-trip January 2021 sample: two rides survive preparation
#[must_use]
pub fn sample_trips() -> Vec<Trip> {
    vec![
        Trip {
            pu: None,
            do_: None,
            pickup: dt(2021, 1, 1, 1, 2, 0),
            dropoff: dt(2021, 1, 1, 1, 10, 0),
        },
        Trip {
            pu: Some(1),
            do_: Some(1),
            pickup: dt(2021, 1, 1, 1, 2, 0),
            dropoff: dt(2021, 1, 1, 1, 10, 0),
        },
        Trip {
            pu: Some(1),
            do_: Some(1),
            pickup: dt(2021, 1, 1, 1, 2, 0),
            dropoff: dt(2021, 1, 1, 1, 2, 50),
        },
        Trip {
            pu: Some(1),
            do_: Some(1),
            pickup: dt(2021, 1, 1, 1, 2, 0),
            dropoff: dt(2021, 1, 1, 2, 2, 1),
        },
    ]
}

/// Write trips as a local Parquet file
pub fn write_trips(path: &Path, trips: &[Trip]) -> Result<()> {
    let location = Location::parse(&path.to_string_lossy())?;
    write_ride_table(
        &RideTable::new(trip_batch(trips)),
        &location,
        &StorageOptions::default(),
    )
}
