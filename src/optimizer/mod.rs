use crate::model::logistic::LogisticParams;
use crate::model::ParamOps;
use faer::linalg::solvers::Solve;
use faer::{Mat, Side};
use ndarray::{Array1, Array2};

/// Parameter update rule.
///
/// Training logic (`Trainer`) is decoupled from the update rule: the trainer
/// computes gradients (and, when asked for, the Hessian of the objective),
/// the optimizer proposes new parameters, and the trainer's line search
/// decides how much of the proposed move to take.
///
/// # Type Parameters
/// * `P`: model parameters type (e.g., [`LogisticParams`])
pub trait Optimizer<P> {
    /// Whether [`Optimizer::step`] reads the Hessian. When false the trainer
    /// skips building it and passes `None`.
    fn needs_hessian(&self) -> bool {
        false
    }

    /// Propose updated parameters. Does not mutate inputs.
    fn step(&self, params: &P, gradients: &P, hessian: Option<&Array2<f64>>) -> P;
}

/// Full-batch gradient descent: `θ ← θ - η · ∇J(θ)`.
#[derive(Clone, Copy, Debug)]
pub struct GradientDescent {
    lr: f64,
}

impl GradientDescent {
    /// `lr`: learning rate (positive, typically 1e-3 .. 1).
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for GradientDescent {
    fn step(&self, params: &P, gradients: &P, _hessian: Option<&Array2<f64>>) -> P {
        params.add(&gradients.scale(-self.lr))
    }
}

/// Newton's method: `θ ← θ - H⁻¹ · ∇J(θ)`.
///
/// The system is solved by Cholesky factorization. If the Hessian is not
/// positive definite (or missing), the step degrades to a unit gradient step.
#[derive(Clone, Copy, Debug)]
pub struct Newton {
    /// Added to the Hessian diagonal before factorizing.
    jitter: f64,
}

impl Default for Newton {
    fn default() -> Self {
        Self { jitter: 1e-10 }
    }
}

impl Newton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }
}

impl Optimizer<LogisticParams> for Newton {
    fn needs_hessian(&self) -> bool {
        true
    }

    fn step(
        &self,
        params: &LogisticParams,
        gradients: &LogisticParams,
        hessian: Option<&Array2<f64>>,
    ) -> LogisticParams {
        let newton_direction = hessian.and_then(|h| {
            let mut h = h.clone();
            h.diag_mut().mapv_inplace(|v| v + self.jitter);
            cholesky_solve(&h, &gradients.to_flat())
        });
        match newton_direction {
            Some(delta) => params.add(&LogisticParams::from_flat(&delta).scale(-1.0)),
            None => {
                log::debug!("Hessian not positive definite; taking a gradient step");
                params.add(&gradients.scale(-1.0))
            }
        }
    }
}

/// Solve `A·x = b` for symmetric positive definite `A` via an LLᵀ
/// factorization of the lower triangle.
///
/// Returns `None` when `A` is not square of matching size, the factorization
/// fails (a non-positive pivot), or the solution is not finite.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    if a.dim() != (n, n) {
        return None;
    }

    let h = Mat::from_fn(n, n, |i, j| a[[i, j]]);
    let llt = h.as_ref().llt(Side::Lower).ok()?;
    let rhs = Mat::from_fn(n, 1, |i, _| b[i]);
    let solution = llt.solve(&rhs);

    let x = Array1::from_shape_fn(n, |i| solution[(i, 0)]);
    x.iter().all(|v| v.is_finite()).then_some(x)
}
