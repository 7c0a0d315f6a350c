//! Linear duration model and its on-disk artifact

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{RideDurationError, Result};
use crate::features::{DictVectorizer, FeatureDict, FeatureMatrix};

/// Ridge term added to feature diagonals so collinear one-hot columns stay solvable
pub const DEFAULT_RIDGE: f64 = 1e-6;

/// Ordinary least squares with an unpenalized intercept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coef: Array1<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit by solving the normal equations `(XᵀX + λI) w = Xᵀy`
    ///
    /// The intercept is the last unknown and is not regularized.
    pub fn fit(x: &FeatureMatrix, y: &[f64]) -> Result<Self> {
        Self::fit_with_ridge(x, y, DEFAULT_RIDGE)
    }

    pub fn fit_with_ridge(x: &FeatureMatrix, y: &[f64], ridge: f64) -> Result<Self> {
        if x.n_rows() == 0 {
            return Err(RideDurationError::model("cannot fit on an empty training set"));
        }
        if x.n_rows() != y.len() {
            return Err(RideDurationError::model(format!(
                "feature matrix has {} rows but target has {} values",
                x.n_rows(),
                y.len()
            )));
        }

        let d = x.n_features;
        let bias = d;
        let mut gram = Array2::<f64>::zeros((d + 1, d + 1));
        let mut rhs = Array1::<f64>::zeros(d + 1);

        for (row, &target) in x.rows.iter().zip(y) {
            for &(i, vi) in row {
                for &(j, vj) in row {
                    gram[[i, j]] += vi * vj;
                }
                gram[[i, bias]] += vi;
                gram[[bias, i]] += vi;
                rhs[i] += vi * target;
            }
            gram[[bias, bias]] += 1.0;
            rhs[bias] += target;
        }
        for i in 0..d {
            gram[[i, i]] += ridge;
        }

        let solution = solve(gram, rhs)?;
        Ok(Self {
            coef: solution.slice(ndarray::s![..d]).to_owned(),
            intercept: solution[bias],
        })
    }

    /// Predict one value per feature row
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>> {
        if x.n_features != self.coef.len() {
            return Err(RideDurationError::model(format!(
                "model expects {} features, got {}",
                self.coef.len(),
                x.n_features
            )));
        }
        Ok(x.rows
            .iter()
            .map(|row| {
                self.intercept + row.iter().map(|&(i, v)| self.coef[i] * v).sum::<f64>()
            })
            .collect())
    }
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&r1, &r2| a[[r1, col]].abs().total_cmp(&a[[r2, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(RideDurationError::model(
                "normal equation matrix is singular; cannot solve for weights",
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

/// Root mean squared error
///
/// # Errors
/// Returns a model error for empty input or mismatched lengths
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    if y_true.is_empty() {
        return Err(RideDurationError::model("cannot compute RMSE of an empty sample"));
    }
    if y_true.len() != y_pred.len() {
        return Err(RideDurationError::model(format!(
            "RMSE needs equal lengths, got {} targets and {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    let sse: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok((sse / y_true.len() as f64).sqrt())
}

/// Vectorizer and regressor stored together, loaded once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub vectorizer: DictVectorizer,
    pub regressor: LinearRegression,
}

impl ModelArtifact {
    /// Load an artifact from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| {
            RideDurationError::model(format!("failed to read model {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Save the artifact as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Vectorize feature dicts and predict durations
    pub fn predict(&self, dicts: &[FeatureDict]) -> Result<Array1<f64>> {
        let x = self.vectorizer.transform(dicts);
        self.regressor.predict(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureValue;

    fn location_dicts(values: &[&str]) -> Vec<FeatureDict> {
        values
            .iter()
            .map(|v| FeatureDict::from([("PUlocationID".to_string(), FeatureValue::from(*v))]))
            .collect()
    }

    #[test]
    fn test_fit_numeric_line() {
        let dicts: Vec<FeatureDict> = (0..10)
            .map(|i| FeatureDict::from([("x".to_string(), FeatureValue::Num(f64::from(i)))]))
            .collect();
        let y: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * f64::from(i)).collect();
        let (_, x) = DictVectorizer::fit_transform(&dicts);

        let model = LinearRegression::fit(&x, &y).unwrap();
        assert!((model.coef[0] - 2.0).abs() < 1e-4);
        assert!((model.intercept - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_collinear_one_hot() {
        let dicts = location_dicts(&["a", "a", "b", "b", "b"]);
        let y = [10.0, 10.0, 20.0, 20.0, 20.0];
        let (vectorizer, x) = DictVectorizer::fit_transform(&dicts);

        let model = LinearRegression::fit(&x, &y).unwrap();
        let artifact = ModelArtifact {
            vectorizer,
            regressor: model,
        };
        let predictions = artifact.predict(&location_dicts(&["a", "b"])).unwrap();
        assert!((predictions[0] - 10.0).abs() < 1e-3);
        assert!((predictions[1] - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_rejects_bad_shapes() {
        let empty = FeatureMatrix::default();
        assert!(LinearRegression::fit(&empty, &[]).is_err());

        let (_, x) = DictVectorizer::fit_transform(&location_dicts(&["a"]));
        assert!(LinearRegression::fit(&x, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_predict_feature_count_mismatch() {
        let model = LinearRegression {
            coef: Array1::from(vec![1.0, 2.0]),
            intercept: 0.0,
        };
        let x = FeatureMatrix {
            n_features: 3,
            rows: vec![vec![(0, 1.0)]],
        };
        assert!(model.predict(&x).is_err());
    }

    #[test]
    fn test_rmse() {
        assert_eq!(rmse(&[1.0, 2.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert!((rmse(&[0.0, 0.0], &[3.0, 4.0]).unwrap() - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rmse_rejects_empty_and_mismatched() {
        assert!(matches!(rmse(&[], &[]), Err(RideDurationError::Model(_))));
        assert!(matches!(
            rmse(&[1.0, 2.0], &[1.0]),
            Err(RideDurationError::Model(_))
        ));
    }

    #[test]
    fn test_artifact_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/model.json");
        let (vectorizer, x) = DictVectorizer::fit_transform(&location_dicts(&["a", "b"]));
        let regressor = LinearRegression::fit(&x, &[5.0, 7.0]).unwrap();
        let artifact = ModelArtifact {
            vectorizer,
            regressor,
        };

        artifact.save(&path).unwrap();
        assert_eq!(ModelArtifact::load(&path).unwrap(), artifact);
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelArtifact::load(&dir.path().join("absent.json")),
            Err(RideDurationError::Model(_))
        ));
    }
}
