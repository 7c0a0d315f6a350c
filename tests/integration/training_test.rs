use chrono::NaiveDate;
use ride_duration::features::{FeatureDict, FeatureValue};
use ride_duration::{ModelArtifact, PathPattern, RideDurationError, TrainingConfig, run_training};

use crate::utils::{Trip, dt, write_trips};

/// Durations follow `5 + 2 * PU + DO` minutes exactly
fn month_of_trips(year: i32, month: u32) -> Vec<Trip> {
    let mut trips = Vec::new();
    for day in 1..=5 {
        for pu in 1..=6 {
            for do_ in 1..=3 {
                let start = dt(year, month, day, 9, 0, 0);
                trips.push(Trip::lasting(Some(pu), Some(do_), start, 5 + 2 * pu + do_));
            }
        }
    }
    // Dropped by the duration filter
    trips.push(Trip::lasting(Some(1), Some(1), dt(year, month, 6, 9, 0, 0), 240));
    trips
}

#[test]
fn test_training_fits_two_month_window() {
    let dir = tempfile::tempdir().unwrap();
    for (year, month) in [(2021, 6), (2021, 7)] {
        write_trips(
            &dir.path().join(format!("data/fhv_tripdata_{year}-{month:02}.parquet")),
            &month_of_trips(year, month),
        )
        .unwrap();
    }
    let config = TrainingConfig {
        dataset_pattern: PathPattern::new(format!(
            "{}/data/fhv_tripdata_{{year}}-{{month:02d}}.parquet",
            dir.path().display()
        )),
        model_dir: dir.path().join("models"),
        ..TrainingConfig::default()
    };

    let date = NaiveDate::from_ymd_opt(2021, 8, 15).unwrap();
    let summary = run_training(&config, date).unwrap();

    assert_eq!(summary.plan.train.month, 6);
    assert_eq!(summary.plan.validation.month, 7);
    assert_eq!(summary.train_rows, 90);
    assert_eq!(summary.validation_rows, 90);
    assert_eq!(summary.n_features, 9);
    assert!(summary.train_rmse < 1e-3);
    assert!(summary.validation_rmse < 1e-3);
    assert_eq!(summary.model_path, dir.path().join("models/model-2021-08-15.json"));

    let artifact = ModelArtifact::load(&summary.model_path).unwrap();
    let ride = FeatureDict::from([
        ("PUlocationID".to_string(), FeatureValue::from("4")),
        ("DOlocationID".to_string(), FeatureValue::from("2")),
    ]);
    let predicted = artifact.predict(&[ride]).unwrap();
    assert!((predicted[0] - 15.0).abs() < 1e-3);
}

#[test]
fn test_training_missing_partition_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig {
        dataset_pattern: PathPattern::new(format!(
            "{}/data/fhv_tripdata_{{year}}-{{month:02d}}.parquet",
            dir.path().display()
        )),
        model_dir: dir.path().join("models"),
        ..TrainingConfig::default()
    };

    let date = NaiveDate::from_ymd_opt(2021, 8, 15).unwrap();
    assert!(run_training(&config, date).is_err());
    assert!(!dir.path().join("models").exists());
}

#[test]
fn test_training_empty_validation_month_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_trips(
        &dir.path().join("data/fhv_tripdata_2021-06.parquet"),
        &month_of_trips(2021, 6),
    )
    .unwrap();
    // Every July ride is longer than an hour
    let july = vec![Trip::lasting(Some(1), Some(1), dt(2021, 7, 1, 9, 0, 0), 180)];
    write_trips(&dir.path().join("data/fhv_tripdata_2021-07.parquet"), &july).unwrap();
    let config = TrainingConfig {
        dataset_pattern: PathPattern::new(format!(
            "{}/data/fhv_tripdata_{{year}}-{{month:02d}}.parquet",
            dir.path().display()
        )),
        model_dir: dir.path().join("models"),
        ..TrainingConfig::default()
    };

    let date = NaiveDate::from_ymd_opt(2021, 8, 15).unwrap();
    assert!(matches!(
        run_training(&config, date),
        Err(RideDurationError::Model(_))
    ));
    assert!(!dir.path().join("models").exists());
}
