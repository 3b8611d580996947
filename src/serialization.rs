//! Serialization of fitted parameters and the model artifact.
//!
//! Parameter types are plain numerical data (`Vec<f64>`, scalars, names) with
//! serde derives; [`SerializableParams`] turns any of them into bytes with
//! bincode. [`persist_model`] is the pipeline's persister: it writes the
//! fitted model instance, never a bare type tag.

use crate::error::Result;
use crate::model::logistic::LogisticRegressionModel;
use crate::model::InferenceModel;
use std::error::Error;
use std::path::{Path, PathBuf};

/// A parameter representation that can be serialized to and from bytes.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    fn to_bytes(&self) -> std::result::Result<Vec<u8>, Self::Error>;

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> std::result::Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Write a fitted model to `dir/file_name`, creating `dir` if needed.
///
/// Creating an existing directory is not an error. The write is not atomic:
/// a crash mid-write can leave a partial file.
pub fn persist_model(
    model: &LogisticRegressionModel,
    dir: impl AsRef<Path>,
    file_name: &str,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    model.save_to_file(&path)?;
    log::info!("Saved fitted model to {}", path.display());
    Ok(path)
}

/// Read back a model written by [`persist_model`].
pub fn load_model(path: impl AsRef<Path>) -> Result<LogisticRegressionModel> {
    LogisticRegressionModel::load_from_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::logistic::LogisticParams;
    use ndarray::array;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        weights: Vec<f64>,
        bias: f64,
    }

    #[test]
    fn test_blanket_params_roundtrip() {
        let sample = Sample {
            weights: vec![0.5, -1.25],
            bias: 3.0,
        };
        let bytes = sample.to_bytes().unwrap();
        assert_eq!(Sample::from_bytes(&bytes).unwrap(), sample);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Sample::from_bytes(&[0x01]).is_err());
    }

    #[test]
    fn test_persist_model_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("outputs");
        let model = LogisticRegressionModel::new(
            LogisticParams {
                weights: array![0.4, -0.2],
                bias: 0.1,
            },
            vec!["Glucose".to_string(), "BMI".to_string()],
        );

        let path = persist_model(&model, &dir, "model.joblib").unwrap();
        assert_eq!(path, dir.join("model.joblib"));
        assert!(path.is_file());

        // Second write into the existing directory succeeds.
        persist_model(&model, &dir, "model.joblib").unwrap();
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.params().weights, model.params().weights);
        assert_eq!(loaded.params().bias, model.params().bias);
        assert_eq!(loaded.feature_names(), model.feature_names());
    }
}
