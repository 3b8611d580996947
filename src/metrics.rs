//! Classification metrics over a held-out partition.

use crate::error::{PipelineError, Result};
use crate::model::InferenceModel;
use ndarray::{Array1, Array2};
use serde::Serialize;

/// Fraction of rows whose predicted class equals the label.
///
/// # Errors
/// - [`PipelineError::EmptyData`] if `x` has no rows
/// - [`PipelineError::ShapeMismatch`] if `x` and `y` disagree on rows or
///   `x` has the wrong width for `model`
pub fn accuracy<M: InferenceModel>(model: &M, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
    let predictions = predict_checked(model, x, y)?;
    let correct = predictions
        .iter()
        .zip(y.iter())
        .filter(|(pred, actual)| pred == actual)
        .count();
    Ok(correct as f64 / y.len() as f64)
}

fn predict_checked<M: InferenceModel>(
    model: &M,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<Array1<f64>> {
    if x.nrows() == 0 {
        return Err(PipelineError::EmptyData("no evaluation rows".to_string()));
    }
    if x.nrows() != y.len() {
        return Err(PipelineError::shape(
            format!("{} labels", x.nrows()),
            format!("{} labels", y.len()),
        ));
    }
    model.predict_batch(x)
}

/// Binary confusion counts, positive class = 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predictions: &Array1<f64>, actual: &Array1<f64>) -> Self {
        let mut cm = Self::default();
        for (&pred, &label) in predictions.iter().zip(actual.iter()) {
            match (pred == 1.0, label == 1.0) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (true, false) => cm.fp += 1,
                (false, true) => cm.fn_ += 1,
            }
        }
        cm
    }

    /// Evaluate `model` on `x` and tabulate against `y`.
    pub fn evaluate<M: InferenceModel>(model: &M, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let predictions = predict_checked(model, x, y)?;
        Ok(Self::from_predictions(&predictions, y))
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.tp + self.tn) as f64 / self.total() as f64
        }
    }

    pub fn precision(&self) -> f64 {
        if self.tp + self.fp == 0 {
            0.0
        } else {
            self.tp as f64 / (self.tp + self.fp) as f64
        }
    }

    pub fn recall(&self) -> f64 {
        if self.tp + self.fn_ == 0 {
            0.0
        } else {
            self.tp as f64 / (self.tp + self.fn_) as f64
        }
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}
