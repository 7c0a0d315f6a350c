//! Batch ride-duration scoring for FHV trip records stored as Parquet.
//!
//! Raw trip files are read into a [`RideTable`], cleaned by [`prepare`],
//! vectorized and scored by a [`ModelArtifact`], and written back out as a
//! two-column prediction file.

pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod filter;
pub mod io;
pub mod model;
pub mod prepare;
pub mod schema;
pub mod storage;
pub mod table;
pub mod training;
pub mod utils;

// Re-export the most common types for easier use
pub use batch::{BatchSummary, PredictionRow, ride_ids, run_batch, score_table};
pub use config::{BatchConfig, PathPattern, TrainingConfig};
pub use error::{RideDurationError, Result};
pub use features::{DictVectorizer, FeatureDict, FeatureValue};
pub use model::{LinearRegression, ModelArtifact};
pub use prepare::prepare;
pub use storage::{Location, StorageOptions};
pub use table::RideTable;
pub use training::{TrainingPlan, TrainingSummary, run_training};

// Arrow types
pub use arrow::record_batch::RecordBatch;
