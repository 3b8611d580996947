//! Models with compile-time training state.
//!
//! A model is generic over a state marker: [`Unfitted`] models implement
//! [`TrainableModel`] and are driven by the trainer; [`Fitted`] models
//! implement [`InferenceModel`] and can be evaluated and persisted.

pub mod logistic;
pub mod state;

pub use logistic::{LogisticModel, LogisticParams, LogisticRegression, LogisticRegressionModel};
pub use state::{Fitted, Unfitted};

use crate::error::{PipelineError, Result};
use crate::serialization::SerializableParams;
use ndarray::{Array1, Array2, ArrayView1};
use std::path::Path;

/// Arithmetic on parameter sets, as needed by optimizers and line search.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, factor: f64) -> Self;
    /// Inner product over all parameters.
    fn dot(&self, other: &Self) -> f64;
    /// Largest absolute component; the convergence criterion.
    fn max_abs(&self) -> f64;
}

/// Training-time interface.
pub trait TrainableModel {
    type Params: ParamOps;
    type Output;

    /// Raw model output (logits) for every row of `x`.
    fn forward(&self, x: &Array2<f64>) -> Array1<f64>;

    /// Gradient w.r.t. parameters given the gradient w.r.t. the outputs.
    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> Self::Params;

    /// Second-order term w.r.t. parameters given per-row output curvature.
    /// Rows and columns follow the parameter layout (weights, then bias).
    fn curvature(&self, x: &Array2<f64>, output_curvature: &Array1<f64>) -> Array2<f64>;

    fn n_features(&self) -> usize;

    fn params(&self) -> &Self::Params;

    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Inference-time interface of a fitted model.
pub trait InferenceModel {
    type ParamsRepr: SerializableParams;

    /// Predicted class for a single sample.
    fn predict(&self, input: ArrayView1<f64>) -> f64;

    /// Predicted class for every row.
    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>>;

    fn n_features(&self) -> usize;

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self>
    where
        Self: Sized;

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::ParamsRepr::from_bytes(&bytes)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}
