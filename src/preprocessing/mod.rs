//! Data preparation between loading and training.
//!
//! - [`cleaning`]: drop incomplete rows, sentinel-fill, split off the label
//! - [`scaling`]: [`StandardScaler`] z-score normalization
//! - [`split`]: seeded train/test partition
//!
//! Transformers follow a fitted/unfitted split: a [`Transformer`] holds
//! hyperparameters, `fit` produces a [`FittedTransformer`] that holds the
//! learned state and can be saved and reloaded.

pub mod cleaning;
pub mod scaling;
pub mod split;
pub mod traits;

pub use cleaning::{clean_data, clean_data1, MISSING_SENTINEL};
pub use scaling::{
    ConstantColumnPolicy, FittedStandardScaler, StandardScaler, StandardScalerConfig,
    StandardScalerParams,
};
pub use split::{split_indices, train_test_split, Split, SplitIndices};
pub use traits::{FittedTransformer, Transformer};
