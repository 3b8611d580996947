//! Full-batch training loop.
//!
//! [`Trainer`] is immutable once built and owns the loss, the optimizer and
//! the regularizer. `fit` consumes an unfitted model and returns the fitted
//! one together with a [`FitReport`]. Running out of iterations is not an
//! error: the last iterate is returned and a warning is logged.

use crate::error::{PipelineError, Result};
use crate::loss::Loss;
use crate::model::{ParamOps, TrainableModel};
use crate::optimizer::Optimizer;
use crate::regularizers::Regularizer;
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::marker::PhantomData;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;
/// Step halvings tried before the line search gives up.
const MAX_BACKTRACKS: usize = 30;

/// Outcome of a call to [`Trainer::fit`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FitReport {
    /// Optimizer steps taken.
    pub n_iter: usize,
    /// Whether the gradient tolerance was met.
    pub converged: bool,
    /// Regularized objective at the returned parameters.
    pub final_loss: f64,
}

pub struct Trainer<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    pub(crate) max_iter: usize,
    pub(crate) tol: f64,
    pub(crate) line_search: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<M>,
}

pub struct TrainerBuilder<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    max_iter: usize,
    tol: f64,
    line_search: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, R> TrainerBuilder<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            max_iter: 100,
            tol: 1e-4,
            line_search: true,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Convergence threshold on the largest absolute gradient component.
    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Backtracking (Armijo) line search on each proposed step. On by default.
    pub fn line_search(mut self, enabled: bool) -> Self {
        self.line_search = enabled;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, R> {
        Trainer {
            max_iter: self.max_iter,
            tol: self.tol,
            line_search: self.line_search,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, R> Trainer<L, O, M, R>
where
    L: Loss,
    M: TrainableModel + Clone,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }

    /// Fit `model` on features `x` and binary labels `y`.
    ///
    /// # Errors
    /// - [`PipelineError::InvalidParameter`] if `max_iter` is zero
    /// - [`PipelineError::EmptyData`] if `x` has no rows
    /// - [`PipelineError::ShapeMismatch`] if `x` and `y` disagree on rows, or
    ///   `x` has a different width than the model
    /// - [`PipelineError::NonBinaryLabel`] for a label outside {0, 1}
    pub fn fit(
        &self,
        mut model: M,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(M::Output, FitReport)> {
        self.validate(&model, x, y)?;

        let mut objective = self.objective(&model, x, y);
        log::debug!("Initial objective = {objective:.6}");

        let mut n_iter = 0;
        let mut converged = false;
        while n_iter < self.max_iter {
            let grads = self.gradient(&model, x, y);
            let grad_max = grads.max_abs();
            if grad_max <= self.tol {
                converged = true;
                break;
            }

            let hessian = if self.optimizer.needs_hessian() {
                Some(self.hessian(&model, x, y))
            } else {
                None
            };
            let current = model.params().clone();
            let proposal = self.optimizer.step(&current, &grads, hessian.as_ref());

            let accepted = if self.line_search {
                self.backtrack(&model, x, y, &current, &grads, proposal, objective)
            } else {
                let value = self.objective_at(&model, x, y, &proposal);
                Some((proposal, value))
            };
            n_iter += 1;

            let Some((next, value)) = accepted else {
                log::debug!("Iteration {n_iter}: line search found no decrease, stopping");
                break;
            };
            model.update_params(&next);
            objective = value;
            log::debug!("Iteration {n_iter}: objective = {objective:.6}, max|grad| = {grad_max:.3e}");
        }

        if !converged {
            converged = self.gradient(&model, x, y).max_abs() <= self.tol;
        }
        if !converged {
            log::warn!(
                "ConvergenceWarning: optimizer did not converge in {} iterations; \
                 increase max_iter or scale the data",
                self.max_iter
            );
        }

        let report = FitReport {
            n_iter,
            converged,
            final_loss: objective,
        };
        log::info!(
            "Fit finished: n_iter = {}, converged = {}, loss = {:.6}",
            report.n_iter,
            report.converged,
            report.final_loss
        );
        Ok((model.into_fitted(), report))
    }

    fn validate(&self, model: &M, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.max_iter == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if x.nrows() == 0 {
            return Err(PipelineError::EmptyData("no training rows".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(PipelineError::shape(
                format!("{} labels", x.nrows()),
                format!("{} labels", y.len()),
            ));
        }
        if x.ncols() != model.n_features() {
            return Err(PipelineError::shape(
                format!("{} features", model.n_features()),
                format!("{} features", x.ncols()),
            ));
        }
        if let Some((row, value)) = y
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| *v != 0.0 && *v != 1.0)
        {
            return Err(PipelineError::NonBinaryLabel { row, value });
        }
        Ok(())
    }

    /// Data loss plus penalty.
    fn objective(&self, model: &M, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
        let preds = model.forward(x);
        let (penalty, _) = self.regularizer.penalty_grad(model, x.nrows());
        self.loss_fn.loss(&preds, y) + penalty
    }

    fn objective_at(&self, model: &M, x: &Array2<f64>, y: &Array1<f64>, params: &M::Params) -> f64 {
        let mut candidate = model.clone();
        candidate.update_params(params);
        self.objective(&candidate, x, y)
    }

    fn gradient(&self, model: &M, x: &Array2<f64>, y: &Array1<f64>) -> M::Params {
        let preds = model.forward(x);
        let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, y);
        let (_, reg_grad) = self.regularizer.penalty_grad(model, x.nrows());
        model.backward(x, &grad_preds).add(&reg_grad)
    }

    fn hessian(&self, model: &M, x: &Array2<f64>, y: &Array1<f64>) -> Array2<f64> {
        let preds = model.forward(x);
        let curv = self.loss_fn.curvature_wrt_prediction(&preds, y);
        let mut h = model.curvature(x, &curv);
        let reg_diag = self.regularizer.curvature(model, x.nrows());
        h.diag_mut().zip_mut_with(&reg_diag, |h, r| *h += r);
        h
    }

    /// Shrink the move from `current` towards `proposal` until the Armijo
    /// condition holds. A non-descent proposal is replaced by the negative
    /// gradient.
    #[allow(clippy::too_many_arguments)]
    fn backtrack(
        &self,
        model: &M,
        x: &Array2<f64>,
        y: &Array1<f64>,
        current: &M::Params,
        grads: &M::Params,
        proposal: M::Params,
        objective: f64,
    ) -> Option<(M::Params, f64)> {
        let mut direction = proposal.add(&current.scale(-1.0));
        let mut slope = grads.dot(&direction);
        if !(slope < 0.0) {
            direction = grads.scale(-1.0);
            slope = grads.dot(&direction);
        }

        let mut t = 1.0;
        for _ in 0..=MAX_BACKTRACKS {
            let candidate = current.add(&direction.scale(t));
            let value = self.objective_at(model, x, y, &candidate);
            if value.is_finite() && value <= objective + ARMIJO_C1 * t * slope {
                return Some((candidate, value));
            }
            t *= 0.5;
        }
        None
    }
}
