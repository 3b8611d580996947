//! `train`: fit the diabetes classifier and write `outputs/model.joblib`.

use anyhow::Context;
use clap::Parser;
use diabetes_logreg::config::DEFAULT_SOURCE;
use diabetes_logreg::{
    pipeline, ConsoleSink, JsonLinesSink, MetricsSink, Run, ScalingMode, TrainConfig,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "train", about = "Train a logistic regression classifier on the diabetes dataset")]
struct Cli {
    /// Inverse of regularization strength. Smaller values cause stronger regularization.
    #[arg(long = "C", default_value_t = 1.0)]
    c: f64,

    /// Maximum number of iterations to converge.
    #[arg(long = "max_iter", default_value_t = 100)]
    max_iter: usize,

    /// URL or path of the CSV dataset.
    #[arg(long, env = "DIABETES_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// Directory receiving the model artifact.
    #[arg(long, env = "DIABETES_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Also append metrics as JSON lines to this file.
    #[arg(long, env = "DIABETES_METRICS_FILE")]
    metrics_file: Option<PathBuf>,

    /// Fraction of rows held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Seed of the train/test shuffle.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Gradient tolerance for convergence.
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,

    /// Fit the scaler on the training partition only.
    #[arg(long)]
    fit_scaler_on_train: bool,
}

impl Cli {
    fn into_config(self) -> TrainConfig {
        TrainConfig {
            c: self.c,
            max_iter: self.max_iter,
            source: self.source,
            output_dir: self.output_dir,
            test_size: self.test_size,
            seed: self.seed,
            tol: self.tol,
            scaling: if self.fit_scaler_on_train {
                ScalingMode::TrainOnly
            } else {
                ScalingMode::Global
            },
            metrics_file: self.metrics_file,
            ..TrainConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    log::info!("Configuration: {}", serde_json::to_string(&config)?);

    let sink: Box<dyn MetricsSink> = match &config.metrics_file {
        Some(path) => Box::new(
            JsonLinesSink::create(path)
                .with_context(|| format!("opening metrics file {}", path.display()))?,
        ),
        None => Box::new(ConsoleSink::default()),
    };
    let mut run = Run::start(sink)?;

    let summary = pipeline::run(&config, &mut run).context("training run failed")?;
    run.complete()?;

    log::info!(
        "Accuracy {:.4} after {} iterations; model written to {}",
        summary.accuracy,
        summary.fit.n_iter,
        summary.model_path.display()
    );
    Ok(())
}
