//! End-to-end training run.
//!
//! Load → clean → scale → split → train → evaluate → report → persist.
//! Every stage receives its input from the previous one; nothing is kept
//! in global state.

use crate::config::{ScalingMode, TrainConfig};
use crate::dataset::{load, DataSource, FeatureMatrix, Labels, Tabular};
use crate::error::{PipelineError, Result};
use crate::loss::BCEWithLogitsLoss;
use crate::metrics::{self, ConfusionMatrix};
use crate::model::LogisticRegression;
use crate::optimizer::Newton;
use crate::preprocessing::{
    clean_data, clean_data1, train_test_split, FittedTransformer, Split, StandardScaler,
    Transformer,
};
use crate::regularizers::L2;
use crate::serialization::persist_model;
use crate::tracking::{report, MetricsRecord, MetricsSink, Run};
use crate::trainer::{FitReport, Trainer};
use serde::Serialize;
use std::path::PathBuf;

/// What a completed run produced.
#[derive(Clone, Debug, Serialize)]
pub struct TrainingSummary {
    /// Test-set accuracy in [0, 1].
    pub accuracy: f64,
    pub fit: FitReport,
    pub confusion: ConfusionMatrix,
    pub rows_loaded: usize,
    pub rows_kept: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub model_path: PathBuf,
}

/// Execute one training run, logging metrics to `tracker`.
pub fn run<S: MetricsSink>(config: &TrainConfig, tracker: &mut Run<S>) -> Result<TrainingSummary> {
    config.validate()?;

    let source = DataSource::parse(&config.source);
    log::info!("Loading dataset from {source}");
    let raw = load(&source)?;
    let rows_loaded = raw.n_rows();

    let frame = clean_data(&raw)?;
    let rows_kept = frame.n_rows();
    let (features, labels) = clean_data1(frame)?;
    if features.n_samples() == 0 {
        return Err(PipelineError::EmptyData(format!(
            "all {rows_loaded} rows were dropped during cleaning"
        )));
    }

    let split = scale_and_split(config, &features, &labels)?;

    let model = LogisticRegression::new(features.n_features())
        .with_feature_names(features.names.clone());
    let trainer = Trainer::builder(BCEWithLogitsLoss, Newton::new(), L2::new(config.c))
        .max_iter(config.max_iter)
        .tol(config.tol)
        .build();
    let (fitted, fit) = trainer.fit(model, &split.x_train, &split.y_train)?;

    let accuracy = metrics::accuracy(&fitted, &split.x_test, &split.y_test)?;
    let confusion = ConfusionMatrix::evaluate(&fitted, &split.x_test, &split.y_test)?;
    log::info!(
        "Test accuracy = {:.4} (precision {:.4}, recall {:.4}, {:?})",
        accuracy,
        confusion.precision(),
        confusion.recall(),
        confusion
    );

    report(
        tracker,
        &MetricsRecord {
            strength: config.c,
            max_iter: config.max_iter,
            accuracy,
        },
    )?;

    let model_path = persist_model(&fitted, &config.output_dir, &config.model_file)?;

    Ok(TrainingSummary {
        accuracy,
        fit,
        confusion,
        rows_loaded,
        rows_kept,
        n_train: split.y_train.len(),
        n_test: split.y_test.len(),
        model_path,
    })
}

/// Standardize features and partition rows according to `config.scaling`.
fn scale_and_split(config: &TrainConfig, features: &FeatureMatrix, labels: &Labels) -> Result<Split> {
    let scaler = StandardScaler::new();
    match config.scaling {
        ScalingMode::Global => {
            let scaled = scaler.fit_transform(&features.values)?;
            train_test_split(&scaled, labels, config.test_size, config.seed)
        }
        ScalingMode::TrainOnly => {
            let mut split =
                train_test_split(&features.values, labels, config.test_size, config.seed)?;
            let fitted = scaler.fit(&split.x_train)?;
            split.x_train = fitted.transform(&split.x_train)?;
            split.x_test = fitted.transform(&split.x_test)?;
            Ok(split)
        }
    }
}
