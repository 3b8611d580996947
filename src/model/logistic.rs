//! Binary logistic regression.
//!
//! - [`LogisticRegression`] = `LogisticModel<Unfitted>`: driven by the trainer.
//! - [`LogisticRegressionModel`] = `LogisticModel<Fitted>`: predicts and serializes.
//!
//! The model computes logits `z = X·w + b`; the positive class is predicted
//! when `z > 0`, i.e. when `σ(z) > 0.5`.

pub use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use crate::error::{PipelineError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Trainable parameters: one weight per feature plus an intercept.
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LogisticParams {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
        }
    }

    /// Flatten to `[w_0, …, w_{d-1}, b]`.
    pub fn to_flat(&self) -> Array1<f64> {
        let mut flat = Array1::zeros(self.weights.len() + 1);
        flat.slice_mut(s![..self.weights.len()]).assign(&self.weights);
        flat[self.weights.len()] = self.bias;
        flat
    }

    /// Inverse of [`Self::to_flat`]; `flat` must hold at least the bias.
    pub fn from_flat(flat: &Array1<f64>) -> Self {
        let d = flat.len().saturating_sub(1);
        Self {
            weights: flat.slice(s![..d]).to_owned(),
            bias: flat.get(d).copied().unwrap_or(0.0),
        }
    }
}

impl ParamOps for LogisticParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            weights: &self.weights * factor,
            bias: self.bias * factor,
        }
    }

    fn dot(&self, other: &Self) -> f64 {
        self.weights.dot(&other.weights) + self.bias * other.bias
    }

    fn max_abs(&self) -> f64 {
        self.weights
            .iter()
            .fold(self.bias.abs(), |acc, w| acc.max(w.abs()))
    }
}

/// On-disk form of a fitted model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializableLogisticParams {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub feature_names: Vec<String>,
}

/// Logistic sigmoid, evaluated without overflow for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// A logistic regression model with its training state in the type.
#[derive(Clone, Debug)]
pub struct LogisticModel<S> {
    params: LogisticParams,
    feature_names: Vec<String>,
    _state: PhantomData<S>,
}

/// Unfitted logistic regression, the trainer's input.
pub type LogisticRegression = LogisticModel<Unfitted>;

/// Fitted logistic regression, the trainer's output.
pub type LogisticRegressionModel = LogisticModel<Fitted>;

impl<S> LogisticModel<S> {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl LogisticModel<Unfitted> {
    /// Zero-initialized model over `n_features` inputs.
    pub fn new(n_features: usize) -> Self {
        Self {
            params: LogisticParams::zeros(n_features),
            feature_names: (0..n_features).map(|i| format!("x{i}")).collect(),
            _state: PhantomData,
        }
    }

    /// Warm start from explicit parameters.
    pub fn from_params(params: LogisticParams) -> Self {
        let n = params.weights.len();
        Self {
            params,
            feature_names: (0..n).map(|i| format!("x{i}")).collect(),
            _state: PhantomData,
        }
    }

    /// Attach column names; carried through to the fitted model.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        if names.len() == self.params.weights.len() {
            self.feature_names = names;
        } else {
            log::warn!(
                "Ignoring {} feature names for a model with {} features",
                names.len(),
                self.params.weights.len()
            );
        }
        self
    }
}

impl LogisticModel<Fitted> {
    pub fn new(params: LogisticParams, feature_names: Vec<String>) -> Self {
        Self {
            params,
            feature_names,
            _state: PhantomData,
        }
    }

    pub fn params(&self) -> &LogisticParams {
        &self.params
    }

    fn check_width(&self, input: &Array2<f64>) -> Result<()> {
        if input.ncols() != self.params.weights.len() {
            return Err(PipelineError::shape(
                format!("{} features", self.params.weights.len()),
                format!("{} features", input.ncols()),
            ));
        }
        Ok(())
    }

    /// Logits `X·w + b`.
    pub fn decision_function(&self, input: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_width(input)?;
        Ok(input.dot(&self.params.weights) + self.params.bias)
    }

    /// Probability of the positive class for every row.
    pub fn predict_proba(&self, input: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(input)?.mapv(sigmoid))
    }
}

impl InferenceModel for LogisticModel<Fitted> {
    type ParamsRepr = SerializableLogisticParams;

    fn predict(&self, input: ArrayView1<f64>) -> f64 {
        let z = self.params.weights.dot(&input) + self.params.bias;
        if z > 0.0 {
            1.0
        } else {
            0.0
        }
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .decision_function(input)?
            .mapv(|z| if z > 0.0 { 1.0 } else { 0.0 }))
    }

    fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    fn extract_params(&self) -> SerializableLogisticParams {
        SerializableLogisticParams {
            weights: self.params.weights.to_vec(),
            bias: self.params.bias,
            feature_names: self.feature_names.clone(),
        }
    }

    fn from_params(params: SerializableLogisticParams) -> Result<Self> {
        if params.feature_names.len() != params.weights.len() {
            return Err(PipelineError::shape(
                format!("{} feature names", params.weights.len()),
                format!("{} feature names", params.feature_names.len()),
            ));
        }
        Ok(Self::new(
            LogisticParams {
                weights: Array1::from(params.weights),
                bias: params.bias,
            },
            params.feature_names,
        ))
    }
}

/// Forward pass `X·w + b`; backward pass `∇w = Xᵀ·g`, `∇b = Σg`.
impl TrainableModel for LogisticModel<Unfitted> {
    type Params = LogisticParams;
    type Output = LogisticModel<Fitted>;

    fn forward(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.params.weights) + self.params.bias
    }

    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> LogisticParams {
        LogisticParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum(),
        }
    }

    fn curvature(&self, x: &Array2<f64>, output_curvature: &Array1<f64>) -> Array2<f64> {
        let d = x.ncols();
        let weighted = x * &output_curvature.view().insert_axis(Axis(1));
        let cross = weighted.sum_axis(Axis(0));

        let mut h = Array2::zeros((d + 1, d + 1));
        h.slice_mut(s![..d, ..d]).assign(&weighted.t().dot(x));
        h.slice_mut(s![..d, d]).assign(&cross);
        h.slice_mut(s![d, ..d]).assign(&cross);
        h[[d, d]] = output_curvature.sum();
        h
    }

    fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    fn params(&self) -> &LogisticParams {
        &self.params
    }

    fn update_params(&mut self, new_params: &LogisticParams) {
        self.params = new_params.clone();
    }

    fn into_fitted(self) -> LogisticModel<Fitted> {
        LogisticModel::<Fitted>::new(self.params, self.feature_names)
    }
}
