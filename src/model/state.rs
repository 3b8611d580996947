/// Marker: the model is **not yet trained**.
///
/// Training methods (`Trainer::fit`) take an `Unfitted` model; prediction is
/// not available until the model is converted to [`Fitted`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Unfitted;

/// Marker: the model has been **fully trained**.
///
/// A `Fitted` model carries only inference parameters: no optimizer state,
/// no regularization strength, no iteration limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fitted;
