//! Run tracking: an explicit run context and pluggable metric sinks.
//!
//! A [`Run`] is created once at process start, passed to the pipeline, and
//! completed at teardown. Every metric goes through its [`MetricsSink`].

use crate::error::{PipelineError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const METRIC_STRENGTH: &str = "Regularization Strength:";
pub const METRIC_MAX_ITER: &str = "Max iterations:";
pub const METRIC_ACCURACY: &str = "Accuracy";

/// A logged metric value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Int(i64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Int(v) => write!(f, "{v}"),
        }
    }
}

/// Destination of logged metrics.
pub trait MetricsSink {
    /// Called once by [`Run::start`] before any metric.
    fn open(&mut self, _run_id: &Uuid) -> Result<()> {
        Ok(())
    }

    fn log_metric(&mut self, name: &str, value: MetricValue) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn open(&mut self, run_id: &Uuid) -> Result<()> {
        (**self).open(run_id)
    }

    fn log_metric(&mut self, name: &str, value: MetricValue) -> Result<()> {
        (**self).log_metric(name, value)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Writes metrics to the log at `info` level.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    run_id: Option<Uuid>,
}

impl MetricsSink for ConsoleSink {
    fn open(&mut self, run_id: &Uuid) -> Result<()> {
        self.run_id = Some(*run_id);
        Ok(())
    }

    fn log_metric(&mut self, name: &str, value: MetricValue) -> Result<()> {
        match &self.run_id {
            Some(id) => log::info!("[run {id}] {name} {value}"),
            None => log::info!("{name} {value}"),
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct MetricLine<'a> {
    run_id: Option<&'a Uuid>,
    timestamp: String,
    name: &'a str,
    value: MetricValue,
}

/// Appends one JSON object per metric to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    run_id: Option<Uuid>,
}

impl JsonLinesSink {
    /// Create (or truncate) `path`. The parent directory must exist.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            PipelineError::MetricsSink(format!("cannot create {}: {e}", path.display()))
        })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            run_id: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonLinesSink {
    fn open(&mut self, run_id: &Uuid) -> Result<()> {
        self.run_id = Some(*run_id);
        Ok(())
    }

    fn log_metric(&mut self, name: &str, value: MetricValue) -> Result<()> {
        let line = MetricLine {
            run_id: self.run_id.as_ref(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            name,
            value,
        };
        serde_json::to_writer(&mut self.writer, &line)
            .map_err(|e| PipelineError::MetricsSink(format!("{}: {e}", self.path.display())))?;
        writeln!(self.writer)
            .map_err(|e| PipelineError::MetricsSink(format!("{}: {e}", self.path.display())))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| PipelineError::MetricsSink(format!("{}: {e}", self.path.display())))
    }
}

/// Keeps metrics in memory, in logging order.
#[derive(Debug, Default)]
pub struct MemorySink {
    metrics: Vec<(String, MetricValue)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &[(String, MetricValue)] {
        &self.metrics
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

impl MetricsSink for MemorySink {
    fn log_metric(&mut self, name: &str, value: MetricValue) -> Result<()> {
        self.metrics.push((name.to_string(), value));
        Ok(())
    }
}

/// Context of a single training run.
pub struct Run<S: MetricsSink> {
    id: Uuid,
    started_at: DateTime<Utc>,
    sink: S,
    logged: usize,
}

impl<S: MetricsSink> Run<S> {
    /// Open a new run with a fresh id.
    pub fn start(mut sink: S) -> Result<Self> {
        let id = Uuid::new_v4();
        sink.open(&id)?;
        log::info!("Started run {id}");
        Ok(Self {
            id,
            started_at: Utc::now(),
            sink,
            logged: 0,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of metrics logged so far.
    pub fn logged(&self) -> usize {
        self.logged
    }

    pub fn log(&mut self, name: &str, value: MetricValue) -> Result<()> {
        self.sink.log_metric(name, value)?;
        self.logged += 1;
        Ok(())
    }

    /// Flush the sink and hand it back.
    pub fn complete(mut self) -> Result<S> {
        self.sink.flush()?;
        let elapsed = Utc::now() - self.started_at;
        log::info!(
            "Completed run {} ({} metrics, {} ms)",
            self.id,
            self.logged,
            elapsed.num_milliseconds()
        );
        Ok(self.sink)
    }
}

/// The three values a training run reports.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub strength: f64,
    pub max_iter: usize,
    pub accuracy: f64,
}

/// Log the run's hyperparameters and test accuracy, in that order.
pub fn report<S: MetricsSink>(run: &mut Run<S>, record: &MetricsRecord) -> Result<()> {
    let max_iter = i64::try_from(record.max_iter)
        .map_err(|_| PipelineError::InvalidParameter(format!("max_iter {}", record.max_iter)))?;
    run.log(METRIC_STRENGTH, MetricValue::Float(record.strength))?;
    run.log(METRIC_MAX_ITER, MetricValue::Int(max_iter))?;
    run.log(METRIC_ACCURACY, MetricValue::Float(record.accuracy))
}
