use std::path::Path;

use ndarray::Array1;
use ride_duration::features::{FeatureDict, FeatureValue};
use ride_duration::io::read_predictions;
use ride_duration::{
    BatchConfig, DictVectorizer, LinearRegression, Location, ModelArtifact, RideDurationError,
    StorageOptions, run_batch,
};

use crate::utils::{Trip, dt, sample_trips, write_trips};

/// Artifact with a fixed weight per one-hot location feature
fn fixed_artifact() -> ModelArtifact {
    let dicts: Vec<FeatureDict> = ["-1", "1"]
        .iter()
        .map(|v| {
            FeatureDict::from([
                ("DOlocationID".to_string(), FeatureValue::from(*v)),
                ("PUlocationID".to_string(), FeatureValue::from(*v)),
            ])
        })
        .collect();
    let vectorizer = DictVectorizer::fit(&dicts);
    assert_eq!(
        vectorizer.feature_names(),
        [
            "DOlocationID=-1",
            "DOlocationID=1",
            "PUlocationID=-1",
            "PUlocationID=1"
        ]
    );
    ModelArtifact {
        vectorizer,
        regressor: LinearRegression {
            coef: Array1::from(vec![1.0, 2.0, 3.0, 4.0]),
            intercept: 10.0,
        },
    }
}

fn config_in(dir: &Path) -> BatchConfig {
    let model_path = dir.join("model.json");
    fixed_artifact().save(&model_path).unwrap();
    BatchConfig::default()
        .with_input_pattern(Some(format!(
            "{}/in/fhv_tripdata_{{year:04d}}-{{month:02d}}.parquet",
            dir.display()
        )))
        .with_output_pattern(Some(format!(
            "{}/out/year={{year:04d}}/month={{month:02d}}/predictions.parquet",
            dir.display()
        )))
        .with_model_path(model_path)
}

fn output_rows(dir: &Path) -> Vec<ride_duration::PredictionRow> {
    let location = Location::parse(
        &dir.join("out/year=2021/month=01/predictions.parquet")
            .to_string_lossy(),
    )
    .unwrap();
    read_predictions(&location, &StorageOptions::default()).unwrap()
}

#[test]
fn test_batch_scores_sample_month() {
    let dir = tempfile::tempdir().unwrap();
    write_trips(
        &dir.path().join("in/fhv_tripdata_2021-01.parquet"),
        &sample_trips(),
    )
    .unwrap();

    let summary = run_batch(&config_in(dir.path()), 2021, 1).unwrap();
    assert_eq!(summary.rows_read, 4);
    assert_eq!(summary.rows_scored, 2);
    assert!(summary.output.ends_with("out/year=2021/month=01/predictions.parquet"));

    let rows = output_rows(dir.path());
    let ids: Vec<_> = rows.iter().map(|r| r.ride_id.as_str()).collect();
    assert_eq!(ids, vec!["2021/01_0", "2021/01_1"]);
    // 10 + DO=-1 + PU=-1, then 10 + DO=1 + PU=1
    assert!((rows[0].predicted_duration - 14.0).abs() < 1e-9);
    assert!((rows[1].predicted_duration - 16.0).abs() < 1e-9);
    assert_eq!(summary.mean_predicted_duration, Some(15.0));
}

#[test]
fn test_batch_ride_ids_skip_dropped_rows() {
    let dir = tempfile::tempdir().unwrap();
    let start = dt(2021, 1, 3, 8, 0, 0);
    let trips = vec![
        Trip::lasting(Some(1), Some(1), start, 0),
        Trip::lasting(Some(1), Some(1), start, 12),
        Trip::lasting(Some(1), Some(1), start, 90),
        Trip::lasting(None, Some(1), start, 30),
    ];
    write_trips(&dir.path().join("in/fhv_tripdata_2021-01.parquet"), &trips).unwrap();

    run_batch(&config_in(dir.path()), 2021, 1).unwrap();

    let rows = output_rows(dir.path());
    let ids: Vec<_> = rows.iter().map(|r| r.ride_id.as_str()).collect();
    assert_eq!(ids, vec!["2021/01_1", "2021/01_3"]);
    // Unseen feature combinations still score: PU=-1 with DO=1
    assert!((rows[1].predicted_duration - 15.0).abs() < 1e-9);
}

#[test]
fn test_batch_writes_empty_output_when_nothing_survives() {
    let dir = tempfile::tempdir().unwrap();
    let start = dt(2021, 1, 3, 8, 0, 0);
    let trips = vec![Trip::lasting(Some(1), Some(1), start, 120)];
    write_trips(&dir.path().join("in/fhv_tripdata_2021-01.parquet"), &trips).unwrap();

    let summary = run_batch(&config_in(dir.path()), 2021, 1).unwrap();
    assert_eq!(summary.rows_scored, 0);
    assert_eq!(summary.mean_predicted_duration, None);
    assert!(output_rows(dir.path()).is_empty());
}

#[test]
fn test_batch_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let result = run_batch(&config_in(dir.path()), 2021, 1);

    assert!(matches!(result, Err(RideDurationError::Io(_))));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_batch_rejects_invalid_month() {
    let dir = tempfile::tempdir().unwrap();
    let result = run_batch(&config_in(dir.path()), 2021, 13);
    assert!(matches!(result, Err(RideDurationError::Config(_))));
}

#[test]
fn test_batch_missing_model() {
    let dir = tempfile::tempdir().unwrap();
    write_trips(
        &dir.path().join("in/fhv_tripdata_2021-01.parquet"),
        &sample_trips(),
    )
    .unwrap();
    let config = config_in(dir.path()).with_model_path(dir.path().join("absent.json"));

    assert!(matches!(
        run_batch(&config, 2021, 1),
        Err(RideDurationError::Model(_))
    ));
}
