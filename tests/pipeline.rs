use diabetes_logreg::metrics::accuracy;
use diabetes_logreg::model::InferenceModel;
use diabetes_logreg::serialization::load_model;
use diabetes_logreg::tracking::{METRIC_ACCURACY, METRIC_MAX_ITER, METRIC_STRENGTH};
use diabetes_logreg::{pipeline, JsonLinesSink, MemorySink, MetricValue, Run, ScalingMode, TrainConfig};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: [&str; 9] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
    "Outcome",
];

/// 768 rows shaped like the diabetes table; the label depends on glucose, BMI and age.
fn synthetic_rows(constant_insulin: bool) -> Vec<[f64; 9]> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..768)
        .map(|_| {
            let pregnancies = rng.gen_range(0..14) as f64;
            let glucose = rng.gen_range(60.0..200.0_f64).round();
            let pressure = rng.gen_range(40.0..110.0_f64).round();
            let skin = rng.gen_range(0.0..50.0_f64).round();
            let insulin = if constant_insulin {
                0.0
            } else {
                rng.gen_range(0.0..300.0_f64).round()
            };
            let bmi = (rng.gen_range(18.0..50.0_f64) * 10.0).round() / 10.0;
            let pedigree = (rng.gen_range(0.08..2.4_f64) * 1000.0).round() / 1000.0;
            let age = rng.gen_range(21..80) as f64;
            let score = 0.04 * (glucose - 120.0) + 0.08 * (bmi - 32.0) + 0.03 * (age - 33.0);
            let noise = rng.gen_range(-1.5..1.5);
            let outcome = if score + noise > 0.0 { 1.0 } else { 0.0 };
            [
                pregnancies,
                glucose,
                pressure,
                skin,
                insulin,
                bmi,
                pedigree,
                age,
                outcome,
            ]
        })
        .collect()
}

fn write_csv(dir: &Path, rows: &[[f64; 9]]) -> PathBuf {
    let path = dir.join("diabetes.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER.join(",")).unwrap();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{}", cells.join(",")).unwrap();
    }
    path
}

fn config(dir: &Path, source: &Path) -> TrainConfig {
    TrainConfig {
        source: source.display().to_string(),
        output_dir: dir.join("outputs"),
        ..TrainConfig::default()
    }
}

fn train(config: &TrainConfig) -> (pipeline::TrainingSummary, MemorySink) {
    let mut run = Run::start(MemorySink::new()).unwrap();
    let summary = pipeline::run(config, &mut run).unwrap();
    (summary, run.complete().unwrap())
}

fn output_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_end_to_end_default_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(false));
    let config = config(dir.path(), &source);

    let (summary, sink) = train(&config);

    assert_eq!(summary.rows_loaded, 768);
    assert_eq!(summary.rows_kept, 768);
    assert_eq!(summary.n_test, 154);
    assert_eq!(summary.n_train, 614);
    assert!((0.0..=1.0).contains(&summary.accuracy));
    assert!(summary.accuracy > 0.6);
    assert!(summary.fit.converged);

    assert_eq!(output_files(&dir.path().join("outputs")), ["model.joblib"]);
    assert_eq!(summary.model_path, dir.path().join("outputs").join("model.joblib"));

    assert_eq!(sink.metrics().len(), 3);
    assert_eq!(sink.get(METRIC_STRENGTH), Some(MetricValue::Float(1.0)));
    assert_eq!(sink.get(METRIC_MAX_ITER), Some(MetricValue::Int(100)));
    assert_eq!(sink.get(METRIC_ACCURACY), Some(MetricValue::Float(summary.accuracy)));
}

#[test]
fn test_persisted_model_is_the_fitted_instance() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(false));
    let (summary, _) = train(&config(dir.path(), &source));

    let model = load_model(&summary.model_path).unwrap();
    assert_eq!(model.n_features(), 8);
    assert_eq!(model.feature_names(), &HEADER[..8]);
    // Glucose drives the synthetic label.
    assert!(model.params().weights[1] > 0.0);

    let x = Array2::from_shape_vec((2, 8), vec![0.0; 16]).unwrap();
    let y = Array1::from(vec![0.0, 0.0]);
    assert!((0.0..=1.0).contains(&accuracy(&model, &x, &y).unwrap()));
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(false));
    let config = config(dir.path(), &source);

    let (first, _) = train(&config);
    let (second, _) = train(&config);

    assert_eq!(first.accuracy, second.accuracy);
    assert_eq!(first.fit, second.fit);
    assert_eq!(output_files(&dir.path().join("outputs")), ["model.joblib"]);
}

#[test]
fn test_constant_feature_column() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(true));
    let (summary, _) = train(&config(dir.path(), &source));

    assert!(summary.accuracy.is_finite());
    assert!(summary.fit.final_loss.is_finite());
    let model = load_model(&summary.model_path).unwrap();
    assert!(model.params().weights.iter().all(|w| w.is_finite()));
}

#[test]
fn test_single_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(false));
    let config = TrainConfig {
        max_iter: 1,
        ..config(dir.path(), &source)
    };
    let (summary, sink) = train(&config);

    assert_eq!(summary.fit.n_iter, 1);
    assert!(!summary.fit.converged);
    assert!((0.0..=1.0).contains(&summary.accuracy));
    assert!(summary.model_path.exists());
    assert_eq!(sink.get(METRIC_MAX_ITER), Some(MetricValue::Int(1)));
}

#[test]
fn test_rows_with_missing_values_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(false));
    let mut text = std::fs::read_to_string(&source).unwrap();
    text.push_str("1,,70,20,0,30.1,0.5,40,0\n");
    text.push_str("2,inf,70,20,0,30.1,0.5,40,1\n");
    std::fs::write(&source, text).unwrap();

    let (summary, _) = train(&config(dir.path(), &source));
    assert_eq!(summary.rows_loaded, 770);
    assert_eq!(summary.rows_kept, 768);
}

#[test]
fn test_train_only_scaling_and_json_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_csv(dir.path(), &synthetic_rows(false));
    let metrics_path = dir.path().join("metrics.jsonl");
    let config = TrainConfig {
        c: 0.1,
        scaling: ScalingMode::TrainOnly,
        metrics_file: Some(metrics_path.clone()),
        ..config(dir.path(), &source)
    };

    let mut run = Run::start(JsonLinesSink::create(&metrics_path).unwrap()).unwrap();
    let summary = pipeline::run(&config, &mut run).unwrap();
    run.complete().unwrap();

    assert!((0.0..=1.0).contains(&summary.accuracy));
    let lines = std::fs::read_to_string(&metrics_path).unwrap();
    assert_eq!(lines.lines().count(), 3);
    assert!(lines.contains("\"Regularization Strength:\""));
}
