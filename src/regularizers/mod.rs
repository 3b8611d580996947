use crate::model::logistic::{LogisticParams, LogisticRegression};
use crate::model::TrainableModel;
use ndarray::Array1;

/// Weight penalty added to the data loss.
///
/// All quantities are on the same per-sample scale as a mean loss, so the
/// trainer can add them to [`crate::loss::Loss`] outputs directly.
pub trait Regularizer<M: TrainableModel> {
    /// Penalty value and its gradient w.r.t. the parameters.
    fn penalty_grad(&self, model: &M, n_samples: usize) -> (f64, M::Params);

    /// Diagonal of the penalty's second derivative, in parameter layout.
    fn curvature(&self, model: &M, n_samples: usize) -> Array1<f64>;
}

/// L2 penalty parameterized by the inverse strength `C`:
///
/// ```text
/// R(w) = ‖w‖² / (2·C·n)
/// ```
///
/// Together with a mean cross-entropy this is the usual `C`-parameterized
/// logistic regression objective divided by `n`. The intercept is not penalized.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    c: f64,
}

impl L2 {
    /// `c` must be positive; smaller values regularize harder.
    pub fn new(c: f64) -> Self {
        Self { c }
    }

    pub fn inverse_strength(&self) -> f64 {
        self.c
    }

    fn coefficient(&self, n_samples: usize) -> f64 {
        1.0 / (self.c * n_samples.max(1) as f64)
    }
}

impl Regularizer<LogisticRegression> for L2 {
    fn penalty_grad(&self, model: &LogisticRegression, n_samples: usize) -> (f64, LogisticParams) {
        let k = self.coefficient(n_samples);
        let w = &model.params().weights;
        let penalty = 0.5 * k * w.dot(w);
        let grad = LogisticParams {
            weights: w * k,
            bias: 0.0,
        };
        (penalty, grad)
    }

    fn curvature(&self, model: &LogisticRegression, n_samples: usize) -> Array1<f64> {
        let d = TrainableModel::n_features(model);
        let mut diag = Array1::from_elem(d + 1, self.coefficient(n_samples));
        diag[d] = 0.0;
        diag
    }
}

/// No penalty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegularizer;

impl Regularizer<LogisticRegression> for NoRegularizer {
    fn penalty_grad(&self, model: &LogisticRegression, _n_samples: usize) -> (f64, LogisticParams) {
        (0.0, LogisticParams::zeros(TrainableModel::n_features(model)))
    }

    fn curvature(&self, model: &LogisticRegression, _n_samples: usize) -> Array1<f64> {
        Array1::zeros(TrainableModel::n_features(model) + 1)
    }
}
