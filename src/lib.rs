//! Logistic regression training pipeline for the Pima Indians diabetes data.
//!
//! A run loads the CSV, cleans it, standardizes the eight clinical features,
//! holds out a seeded test partition, fits an L2-regularized logistic
//! regression, reports accuracy, and persists the fitted model.
//!
//! ```no_run
//! use diabetes_logreg::{pipeline, MemorySink, Run, TrainConfig};
//!
//! let config = TrainConfig { c: 0.5, max_iter: 200, ..TrainConfig::default() };
//! let mut run = Run::start(MemorySink::new())?;
//! let summary = pipeline::run(&config, &mut run)?;
//! println!("accuracy = {:.3}", summary.accuracy);
//! run.complete()?;
//! # Ok::<(), diabetes_logreg::PipelineError>(())
//! ```
//!
//! The building blocks are usable on their own: models carry their training
//! state in the type ([`model::LogisticRegression`] vs
//! [`model::LogisticRegressionModel`]), and [`trainer::Trainer`] combines a
//! [`loss::Loss`], an [`optimizer::Optimizer`] and a
//! [`regularizers::Regularizer`].

pub mod config;
pub mod dataset;
pub mod error;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod pipeline;
pub mod preprocessing;
pub mod regularizers;
pub mod serialization;
pub mod tracking;
pub mod trainer;

pub use config::{ScalingMode, TrainConfig};
pub use error::{PipelineError, Result};
pub use pipeline::TrainingSummary;
pub use tracking::{ConsoleSink, JsonLinesSink, MemorySink, MetricValue, MetricsSink, Run};
pub use trainer::{FitReport, Trainer};
