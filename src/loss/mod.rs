use crate::model::logistic::sigmoid;
use ndarray::Array1;

/// A twice-differentiable loss over model outputs.
///
/// The trainer needs the scalar value (line search, logging), the gradient
/// w.r.t. each prediction (passed to `model.backward()`), and the per-row
/// curvature (passed to `model.curvature()` for second-order steps).
pub trait Loss {
    /// Mean loss over all rows.
    fn loss(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> f64;

    /// ∂L/∂pred for each row.
    fn grad_wrt_prediction(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> Array1<f64>;

    /// ∂²L/∂pred² for each row.
    fn curvature_wrt_prediction(
        &self,
        prediction: &Array1<f64>,
        target: &Array1<f64>,
    ) -> Array1<f64>;
}

/// Binary cross-entropy on logits (numerically stable).
///
/// Computes `L = mean(max(z,0) - z*t + log(1 + exp(-|z|)))`, which equals
/// `-(t*log σ(z) + (1-t)*log(1-σ(z)))` averaged over rows.
///
/// Gradient: `(σ(z) - t) / n`. Curvature: `σ(z)(1 - σ(z)) / n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BCEWithLogitsLoss;

impl Loss for BCEWithLogitsLoss {
    fn loss(&self, logits: &Array1<f64>, targets: &Array1<f64>) -> f64 {
        let n = logits.len();
        if n == 0 {
            return 0.0;
        }
        let total: f64 = logits
            .iter()
            .zip(targets.iter())
            .map(|(&z, &t)| z.max(0.0) - z * t + (-z.abs()).exp().ln_1p())
            .sum();
        total / n as f64
    }

    fn grad_wrt_prediction(&self, logits: &Array1<f64>, targets: &Array1<f64>) -> Array1<f64> {
        let inv_n = 1.0 / logits.len().max(1) as f64;
        (logits.mapv(sigmoid) - targets) * inv_n
    }

    fn curvature_wrt_prediction(
        &self,
        logits: &Array1<f64>,
        _targets: &Array1<f64>,
    ) -> Array1<f64> {
        let inv_n = 1.0 / logits.len().max(1) as f64;
        logits.mapv(|z| {
            let p = sigmoid(z);
            p * (1.0 - p) * inv_n
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bce_with_logits_loss() {
        let logits = array![0.0, 2.0, -2.0];
        let targets = array![1.0, 1.0, 0.0];

        let loss_val = BCEWithLogitsLoss.loss(&logits, &targets);
        // (ln 2 + 2·ln(1 + e^-2)) / 3
        let expected = (2f64.ln() + 2.0 * (1.0 + (-2f64).exp()).ln()) / 3.0;
        assert!((loss_val - expected).abs() < 1e-12);

        let grad = BCEWithLogitsLoss.grad_wrt_prediction(&logits, &targets);
        let sig = [0.5, sigmoid(2.0), sigmoid(-2.0)];
        for ((g, s), t) in grad.iter().zip(sig.iter()).zip(targets.iter()) {
            assert!((g - (s - t) / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bce_curvature() {
        let logits = array![0.0, 3.0];
        let targets = array![0.0, 1.0];
        let curv = BCEWithLogitsLoss.curvature_wrt_prediction(&logits, &targets);
        assert!((curv[0] - 0.125).abs() < 1e-12);
        let p = sigmoid(3.0);
        assert!((curv[1] - p * (1.0 - p) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bce_numerical_stability() {
        let logits = array![100.0, -100.0, 800.0];
        let targets = array![1.0, 0.0, 0.0];

        let loss_val = BCEWithLogitsLoss.loss(&logits, &targets);
        assert!(loss_val.is_finite());

        let grad = BCEWithLogitsLoss.grad_wrt_prediction(&logits, &targets);
        assert!(grad.iter().all(|g| g.is_finite()));
        let curv = BCEWithLogitsLoss.curvature_wrt_prediction(&logits, &targets);
        assert!(curv.iter().all(|c| c.is_finite() && *c >= 0.0));
    }

    #[test]
    fn test_bce_gradient_matches_finite_difference() {
        let targets = array![1.0, 0.0];
        let logits = array![0.3, -0.7];
        let grad = BCEWithLogitsLoss.grad_wrt_prediction(&logits, &targets);
        let eps = 1e-6;
        for i in 0..2 {
            let mut up = logits.clone();
            up[i] += eps;
            let mut down = logits.clone();
            down[i] -= eps;
            let numeric = (BCEWithLogitsLoss.loss(&up, &targets)
                - BCEWithLogitsLoss.loss(&down, &targets))
                / (2.0 * eps);
            assert!((numeric - grad[i]).abs() < 1e-6);
        }
    }
}
