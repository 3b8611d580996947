//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the column mean and `s` the population standard deviation
//! (ddof = 0) of the data the scaler was fitted on.
//!
//! # Example
//! ```
//! use diabetes_logreg::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//! use ndarray::array;
//!
//! let data = array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]];
//! let fitted = StandardScaler::new().fit(&data).unwrap();
//! let scaled = fitted.transform(&data).unwrap();
//! let restored = fitted.inverse_transform(&scaled).unwrap();
//! assert!((restored[[2, 1]] - 3.0).abs() < 1e-12);
//! ```

use crate::error::{PipelineError, Result};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// What to do with a feature whose standard deviation is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstantColumnPolicy {
    /// Divide by 1 instead; the column is only centered.
    #[default]
    UnitVariance,
    /// Fail the fit with [`PipelineError::DegenerateColumn`].
    Reject,
}

/// Configuration for StandardScaler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// If true, center the data before scaling.
    pub with_mean: bool,
    /// If true, scale the data to unit variance.
    pub with_std: bool,
    /// Handling of zero-variance features.
    pub constant_columns: ConstantColumnPolicy,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
            constant_columns: ConstantColumnPolicy::UnitVariance,
        }
    }
}

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StandardScalerParams {
    pub config: StandardScalerConfig,
    /// Mean of each feature (zeros if `with_mean` is false).
    pub mean: Vec<f64>,
    /// Scale of each feature (ones if `with_std` is false).
    pub std: Vec<f64>,
    pub n_features: usize,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    config: StandardScalerConfig,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }

    /// Set the zero-variance policy.
    pub fn constant_columns(mut self, policy: ConstantColumnPolicy) -> Self {
        self.config.constant_columns = policy;
        self
    }
}

/// A constant column can come out of the mean/variance arithmetic with a few
/// ulps of noise. The bound is relative to the column's own variance and mean,
/// so a small but genuinely varying column is not degenerate.
fn is_degenerate(std: f64, mean: f64, n_samples: usize) -> bool {
    let n = n_samples as f64;
    let var = std * std;
    var <= n * f64::EPSILON * var + (n * mean * f64::EPSILON).powi(2)
}

impl Transformer for StandardScaler {
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Array2<f64>) -> Result<FittedStandardScaler> {
        let (rows, cols) = data.dim();
        if rows == 0 {
            return Err(PipelineError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let column_mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::EmptyData("no rows to average".to_string()))?;

        let mean = if self.config.with_mean {
            column_mean.clone()
        } else {
            Array1::zeros(cols)
        };

        let std = if self.config.with_std {
            let raw = data.std_axis(Axis(0), 0.0);
            let mut adjusted = Array1::ones(cols);
            for (j, (&s, &m)) in raw.iter().zip(column_mean.iter()).enumerate() {
                if !is_degenerate(s, m, rows) {
                    adjusted[j] = s;
                    continue;
                }
                match self.config.constant_columns {
                    ConstantColumnPolicy::Reject => {
                        return Err(PipelineError::DegenerateColumn { column: j })
                    }
                    ConstantColumnPolicy::UnitVariance => {
                        log::warn!("Feature column {j} has zero variance; scaling by 1");
                    }
                }
            }
            adjusted
        } else {
            Array1::ones(cols)
        };

        Ok(FittedStandardScaler {
            config: self.config.clone(),
            mean,
            std,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    config: StandardScalerConfig,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    /// Mean of each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Standard deviation of each feature, with zero-variance columns at 1.
    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    fn check_width(&self, data: &Array2<f64>) -> Result<()> {
        if data.ncols() != self.mean.len() {
            return Err(PipelineError::shape(
                format!("{} features", self.mean.len()),
                format!("{} features", data.ncols()),
            ));
        }
        Ok(())
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Params = StandardScalerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;
        let mut result = data.clone();
        if self.config.with_mean {
            result -= &self.mean;
        }
        if self.config.with_std {
            result /= &self.std;
        }
        Ok(result)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;
        let mut result = data.clone();
        if self.config.with_std {
            result *= &self.std;
        }
        if self.config.with_mean {
            result += &self.mean;
        }
        Ok(result)
    }

    fn extract_params(&self) -> StandardScalerParams {
        StandardScalerParams {
            config: self.config.clone(),
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
            n_features: self.mean.len(),
        }
    }

    fn from_params(params: StandardScalerParams) -> Result<Self> {
        if params.mean.len() != params.n_features || params.std.len() != params.n_features {
            return Err(PipelineError::shape(
                format!("{} means and stds", params.n_features),
                format!("{} means, {} stds", params.mean.len(), params.std.len()),
            ));
        }
        Ok(Self {
            config: params.config,
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data() -> Array2<f64> {
        array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]]
    }

    #[test]
    fn test_standard_scaler_fit() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let mean = fitted.mean();
        assert!((mean[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((mean[1] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_transform_zero_mean_unit_std() {
        let data = create_test_data();
        let transformed = StandardScaler::new().fit_transform(&data).unwrap();

        let mean = transformed.mean_axis(Axis(0)).unwrap();
        let std = transformed.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-12, "mean[{j}] = {}", mean[j]);
            assert!((std[j] - 1.0).abs() < 1e-12, "std[{j}] = {}", std[j]);
        }
    }

    #[test]
    fn test_standard_scaler_inverse_transform() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let recovered = fitted
            .inverse_transform(&fitted.transform(&data).unwrap())
            .unwrap();
        for (o, r) in data.iter().zip(recovered.iter()) {
            assert!((o - r).abs() < 1e-12);
        }
    }

    #[test]
    fn test_standard_scaler_constant_feature() {
        let data = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        assert_eq!(fitted.std()[0], 1.0);
        assert!((fitted.mean()[0] - 5.0).abs() < 1e-12);

        let transformed = fitted.transform(&data).unwrap();
        assert!(transformed.iter().all(|v| v.is_finite()));
        assert!(transformed.column(0).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_standard_scaler_constant_fractional_feature() {
        let data = array![[0.1, 1.0], [0.1, 2.0], [0.1, 4.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        assert_eq!(fitted.std()[0], 1.0);
    }

    #[test]
    fn test_standard_scaler_tiny_variance_feature() {
        let data = array![[1e-20, 1.0], [2e-20, 2.0], [3e-20, 3.0]];
        let fitted = StandardScaler::new()
            .constant_columns(ConstantColumnPolicy::Reject)
            .fit(&data)
            .unwrap();
        let expected = (2.0f64 / 3.0).sqrt() * 1e-20;
        assert!((fitted.std()[0] - expected).abs() < 1e-30);

        let transformed = fitted.transform(&data).unwrap();
        let std = transformed.std_axis(Axis(0), 0.0);
        assert!((std[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_standard_scaler_is_degenerate_bound() {
        assert!(is_degenerate(0.0, 5.0, 3));
        assert!(is_degenerate(1e-17, 0.1, 3));
        assert!(!is_degenerate(8.2e-21, 2e-20, 3));
        assert!(!is_degenerate(0.5, 1e6, 768));
    }

    #[test]
    fn test_standard_scaler_reject_constant_feature() {
        let data = array![[1.0, 7.0], [2.0, 7.0]];
        let result = StandardScaler::new()
            .constant_columns(ConstantColumnPolicy::Reject)
            .fit(&data);
        assert!(matches!(
            result,
            Err(PipelineError::DegenerateColumn { column: 1 })
        ));
    }

    #[test]
    fn test_standard_scaler_without_mean() {
        let fitted = StandardScaler::new()
            .with_mean(false)
            .fit(&create_test_data())
            .unwrap();
        assert!(fitted.mean().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_standard_scaler_without_std() {
        let fitted = StandardScaler::new()
            .with_std(false)
            .fit(&create_test_data())
            .unwrap();
        assert!(fitted.std().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_standard_scaler_feature_mismatch() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let wrong = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            fitted.transform(&wrong),
            Err(PipelineError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            fitted.inverse_transform(&wrong),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_standard_scaler_empty_data() {
        let data = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            StandardScaler::new().fit(&data),
            Err(PipelineError::EmptyData(_))
        ));
    }

    #[test]
    fn test_standard_scaler_params_roundtrip() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let restored = FittedStandardScaler::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored.n_features_in(), 2);
        assert_eq!(
            fitted.transform(&data).unwrap(),
            restored.transform(&data).unwrap()
        );
    }

    #[test]
    fn test_standard_scaler_save_load_file() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.bin");
        fitted.save_to_file(&path).unwrap();
        let loaded = FittedStandardScaler::load_from_file(&path).unwrap();

        assert_eq!(loaded.mean(), fitted.mean());
        assert_eq!(loaded.std(), fitted.std());
    }
}
