//! Dictionary feature vectorization
//!
//! Each ride becomes a map from column name to value. String values are
//! one-hot encoded as `name=value` features, numeric values are kept under
//! the column name. The vocabulary is sorted by feature name, and features
//! not seen during fitting are ignored at transform time.

use std::collections::{BTreeMap, BTreeSet};

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{RideDurationError, Result};
use crate::schema::resolve_column;
use crate::table::RideTable;

/// One feature value of a ride
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Str(String),
    Num(f64),
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

/// Features of one ride keyed by column name
pub type FeatureDict = BTreeMap<String, FeatureValue>;

/// Sparse feature rows: `(feature index, value)` pairs per ride
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    pub n_features: usize,
    pub rows: Vec<Vec<(usize, f64)>>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Learns a feature vocabulary from feature dicts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DictVectorizer {
    feature_names: Vec<String>,
    vocabulary: BTreeMap<String, usize>,
}

fn feature_name(key: &str, value: &FeatureValue) -> String {
    match value {
        FeatureValue::Str(s) => format!("{key}={s}"),
        FeatureValue::Num(_) => key.to_string(),
    }
}

fn feature_value(value: &FeatureValue) -> f64 {
    match value {
        FeatureValue::Str(_) => 1.0,
        FeatureValue::Num(n) => *n,
    }
}

impl DictVectorizer {
    /// Learn the sorted vocabulary of all features present in `dicts`
    #[must_use]
    pub fn fit(dicts: &[FeatureDict]) -> Self {
        let names: BTreeSet<String> = dicts
            .iter()
            .flat_map(|d| d.iter().map(|(k, v)| feature_name(k, v)))
            .collect();
        let feature_names = names.into_iter().collect_vec();
        let vocabulary = feature_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            feature_names,
            vocabulary,
        }
    }

    /// Map dicts onto the learned vocabulary
    #[must_use]
    pub fn transform(&self, dicts: &[FeatureDict]) -> FeatureMatrix {
        let rows = dicts
            .iter()
            .map(|d| {
                d.iter()
                    .filter_map(|(k, v)| {
                        self.vocabulary
                            .get(&feature_name(k, v))
                            .map(|&idx| (idx, feature_value(v)))
                    })
                    .sorted_by_key(|(idx, _)| *idx)
                    .collect_vec()
            })
            .collect();
        FeatureMatrix {
            n_features: self.feature_names.len(),
            rows,
        }
    }

    pub fn fit_transform(dicts: &[FeatureDict]) -> (Self, FeatureMatrix) {
        let vectorizer = Self::fit(dicts);
        let matrix = vectorizer.transform(dicts);
        (vectorizer, matrix)
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Extract feature dicts for the given columns of a prepared table
///
/// String columns become string features; integer and float columns become
/// numeric features. Null entries are left out of the dict.
pub fn table_to_dicts<S: AsRef<str>>(table: &RideTable, columns: &[S]) -> Result<Vec<FeatureDict>> {
    let batch = table.batch();
    let mut dicts = vec![FeatureDict::new(); batch.num_rows()];

    for column in columns {
        let (idx, name) = resolve_column(&batch.schema(), column.as_ref())?;
        let array = batch.column(idx);
        match array.data_type() {
            DataType::Utf8 => {
                for (dict, v) in dicts.iter_mut().zip(array.as_string::<i32>().iter()) {
                    if let Some(v) = v {
                        dict.insert(name.clone(), FeatureValue::from(v));
                    }
                }
            }
            DataType::Int64 => {
                for (dict, v) in dicts.iter_mut().zip(array.as_primitive::<Int64Type>().iter()) {
                    if let Some(v) = v {
                        dict.insert(name.clone(), FeatureValue::Num(v as f64));
                    }
                }
            }
            DataType::Float64 => {
                for (dict, v) in dicts.iter_mut().zip(array.as_primitive::<Float64Type>().iter()) {
                    if let Some(v) = v {
                        dict.insert(name.clone(), FeatureValue::Num(v));
                    }
                }
            }
            other => {
                return Err(RideDurationError::ColumnType {
                    column: name,
                    data_type: other.to_string(),
                });
            }
        }
    }

    Ok(dicts)
}
