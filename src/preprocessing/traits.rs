//! Core traits for preprocessing transformers.
//!
//! - [`Transformer`]: unfitted, carries hyperparameters, learns from data.
//! - [`FittedTransformer`]: learned state, transforms data, serializes.

use crate::error::{PipelineError, Result};
use crate::serialization::SerializableParams;
use ndarray::Array2;
use std::path::Path;

/// An unfitted transformer with hyperparameters.
pub trait Transformer: Clone {
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer;

    /// Learn parameters (e.g. mean and std for a standard scaler) from `data`.
    ///
    /// # Errors
    /// Empty data or a data layout the transformer cannot learn from.
    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted>;

    /// Fit and transform in one step.
    fn fit_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(data)?.transform(data)
    }
}

/// A fitted transformer ready for inference.
///
/// `extract_params` followed by `from_params` reproduces the transformer.
pub trait FittedTransformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>>;

    /// Reverse the transformation.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>>;

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Number of features seen during fit.
    fn n_features_in(&self) -> usize;

    /// Save the learned parameters to a file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a fitted transformer from a file written by [`Self::save_to_file`].
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}
