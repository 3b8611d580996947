//! Seeded train/test partitioning.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row partition of a feature matrix and its labels.
#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Row indices of each partition, in the order rows are taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Compute partition indices for `n_samples` rows.
///
/// `n_test = ceil(test_size * n_samples)`; the rest go to training. The rows
/// are shuffled by a `StdRng` seeded with `seed`, and the first `n_test`
/// shuffled indices form the test set.
pub fn split_indices(n_samples: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "test_size must lie in (0, 1), got {test_size}"
        )));
    }
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::InvalidParameter(format!(
            "test_size {test_size} on {n_samples} samples leaves an empty partition"
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: permutation,
    })
}

/// Partition `x` and `y` into train and test rows, keeping them aligned.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<Split> {
    if x.nrows() != y.len() {
        return Err(PipelineError::shape(
            format!("{} labels", x.nrows()),
            format!("{} labels", y.len()),
        ));
    }
    let indices = split_indices(x.nrows(), test_size, seed)?;
    log::info!(
        "Split {} rows into {} train / {} test (seed {})",
        x.nrows(),
        indices.train.len(),
        indices.test.len(),
        seed
    );

    Ok(Split {
        x_train: x.select(Axis(0), &indices.train),
        x_test: x.select(Axis(0), &indices.test),
        y_train: y.select(Axis(0), &indices.train),
        y_test: y.select(Axis(0), &indices.test),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;
    use std::collections::HashSet;

    fn data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array::from_shape_fn((n, 2), |(i, j)| (i * 10 + j) as f64);
        let y = Array::from_shape_fn(n, |i| i as f64);
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let indices = split_indices(768, 0.2, 1).unwrap();
        assert_eq!(indices.test.len(), 154);
        assert_eq!(indices.train.len(), 614);
    }

    #[test]
    fn test_split_disjoint_and_complete() {
        for seed in [0, 1, 42, 12345] {
            let indices = split_indices(101, 0.2, seed).unwrap();
            let train: HashSet<_> = indices.train.iter().copied().collect();
            let test: HashSet<_> = indices.test.iter().copied().collect();
            assert!(train.is_disjoint(&test));
            assert_eq!(train.len() + test.len(), 101);
            assert_eq!(train.union(&test).count(), 101);
        }
    }

    #[test]
    fn test_split_deterministic_for_seed() {
        let a = split_indices(50, 0.2, 7).unwrap();
        let b = split_indices(50, 0.2, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_keeps_rows_aligned() {
        let (x, y) = data(20);
        let split = train_test_split(&x, &y, 0.25, 3).unwrap();
        for (row, label) in split.x_test.rows().into_iter().zip(split.y_test.iter()) {
            // Row i holds [10 i, 10 i + 1] and label i.
            assert_eq!(row[0], label * 10.0);
            assert_eq!(row[1], label * 10.0 + 1.0);
        }
        assert_eq!(split.x_train.nrows(), 15);
        assert_eq!(split.y_train.len(), 15);
    }

    #[test]
    fn test_split_shape_mismatch() {
        let (x, _) = data(10);
        let y = Array1::zeros(9);
        assert!(matches!(
            train_test_split(&x, &y, 0.2, 1),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_split_rejects_degenerate_sizes() {
        assert!(split_indices(1, 0.2, 1).is_err());
        assert!(split_indices(0, 0.2, 1).is_err());
        assert!(split_indices(10, 0.0, 1).is_err());
        assert!(split_indices(10, 1.0, 1).is_err());
    }
}
