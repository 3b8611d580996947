//! Run configuration.
//!
//! [`TrainConfig`] is the single place every knob of a training run lives.
//! The binary fills it from command-line flags; library callers and tests
//! build it from [`TrainConfig::default`] and struct update syntax.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Public copy of the Pima Indians diabetes dataset.
pub const DEFAULT_SOURCE: &str = "https://github.com/eaamankwah/foree/raw/main/diabetes.csv";

/// Name of the label column.
pub const LABEL_COLUMN: &str = "Outcome";

/// Where the feature scaler learns its statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingMode {
    /// Fit on the full feature matrix before splitting. Test rows leak into
    /// the scaling statistics.
    #[default]
    Global,
    /// Fit on the training partition only and apply to both partitions.
    TrainOnly,
}

/// Configuration of a single training run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Inverse of regularization strength. Smaller values regularize harder.
    pub c: f64,
    /// Maximum number of optimizer iterations.
    pub max_iter: usize,
    /// URL or filesystem path of the CSV dataset.
    pub source: String,
    /// Directory receiving the model artifact.
    pub output_dir: PathBuf,
    /// File name of the model artifact inside `output_dir`.
    pub model_file: String,
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    /// Gradient tolerance for convergence.
    pub tol: f64,
    /// Where the scaler is fitted.
    pub scaling: ScalingMode,
    /// Optional JSON-lines file receiving logged metrics.
    pub metrics_file: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            source: DEFAULT_SOURCE.to_string(),
            output_dir: PathBuf::from("outputs"),
            model_file: "model.joblib".to_string(),
            test_size: 0.2,
            seed: 1,
            tol: 1e-4,
            scaling: ScalingMode::Global,
            metrics_file: None,
        }
    }
}

impl TrainConfig {
    /// Check hyperparameters before any work is done.
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "C must be a positive finite number, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "tol must be a positive finite number, got {}",
                self.tol
            )));
        }
        if self.model_file.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "model_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Full path of the model artifact.
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.model_file)
    }
}
