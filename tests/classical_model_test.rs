//! Classical pipeline against a real tree ensemble
//!
//! Trains a tiny GBDT in-process (test fixture only), saves it in gbdt-rs
//! JSON format and checks it loads and scores through both the library and
//! the binary.

use std::path::Path;
use std::process::Command;

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;

use fragma::classical::{vectorize, GbdtPipeline, LabelMap, PipelineFormat, VECTOR_LEN};
use fragma::error::ModelError;
use fragma::{ClassicalPredictor, FeatureExtractor, FeatureRecord, FRAGMENT_LABEL, NOT_FRAGMENT_LABEL};

const FRAGMENTS: &[&str] = &[
    "because it was raining",
    "running down the street",
    "after the long meeting",
    "which surprised everyone",
    "although tired",
    "while waiting",
];

const SENTENCES: &[&str] = &[
    "She can sing.",
    "The dog barked at the mailman.",
    "We left early because it was raining.",
    "They will arrive tomorrow.",
    "He confessed everything to the police.",
    "I have finished my homework.",
];

fn fixture_model() -> GBDT {
    let mut cfg = Config::new();
    cfg.set_feature_size(VECTOR_LEN);
    cfg.set_max_depth(3);
    cfg.set_iterations(20);
    cfg.set_shrinkage(0.3);
    cfg.set_loss("LogLikelyhood");
    cfg.set_debug(false);
    cfg.set_min_leaf_size(1);

    let extractor = FeatureExtractor::shared();
    let mut data: Vec<Data> = FRAGMENTS
        .iter()
        .map(|t| (t, 1.0f32))
        .chain(SENTENCES.iter().map(|t| (t, -1.0f32)))
        .map(|(text, label)| {
            let record = FeatureRecord::from_text(text, extractor);
            Data::new_training_data(vectorize(&record), 1.0, label, None)
        })
        .collect();

    let mut model = GBDT::new(&cfg);
    model.fit(&mut data);
    model
}

fn save_fixture(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("fragma_ml.json");
    fixture_model()
        .save_model(path.to_str().unwrap())
        .expect("save model");
    path
}

#[test]
fn test_pipeline_loads_and_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_fixture(dir.path());

    let pipeline = GbdtPipeline::load(&path, PipelineFormat::Gbdt, LabelMap::default()).unwrap();
    let extractor = FeatureExtractor::shared();
    for text in FRAGMENTS.iter().chain(SENTENCES) {
        let prob = pipeline
            .probability(&FeatureRecord::from_text(text, extractor))
            .unwrap();
        assert!((0.0..=1.0).contains(&prob), "{text}: {prob}");
    }

    let predictor = ClassicalPredictor::new(pipeline);
    let label = predictor.predict("Because it was raining.").unwrap();
    assert!(label == FRAGMENT_LABEL || label == NOT_FRAGMENT_LABEL, "{label}");
    // Pure function of the input
    assert_eq!(label, predictor.predict("Because it was raining.").unwrap());
}

#[test]
fn test_custom_labels_are_used() {
    let labels = LabelMap {
        positive: "FRAG".into(),
        negative: "FULL".into(),
        threshold: 0.5,
    };
    let predictor = ClassicalPredictor::new(GbdtPipeline::from_trained(fixture_model(), labels));
    let label = predictor.predict("while waiting").unwrap();
    assert!(label == "FRAG" || label == "FULL", "{label}");
}

#[test]
fn test_binary_classifies_with_trained_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_fixture(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_fragma"))
        .args(["classify", "--ml-model"])
        .arg(&path)
        .arg("Because it was raining.")
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("FRAGMA_ML_MODEL")
        .output()
        .expect("Failed to run fragma");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    let label = stdout.trim();
    assert!(label == FRAGMENT_LABEL || label == NOT_FRAGMENT_LABEL, "{label}");
}

/// A model trained on a wider input than the pipeline produces, split on f75
fn wide_model() -> GBDT {
    let width = 80;
    let mut cfg = Config::new();
    cfg.set_feature_size(width);
    cfg.set_max_depth(2);
    cfg.set_iterations(3);
    cfg.set_loss("LogLikelyhood");
    cfg.set_debug(false);
    cfg.set_min_leaf_size(1);

    let mut data: Vec<Data> = (0..8)
        .map(|i| {
            let mut feature = vec![0.0f32; width];
            let label = if i % 2 == 0 { 1.0 } else { -1.0 };
            feature[75] = label;
            Data::new_training_data(feature, 1.0, label, None)
        })
        .collect();

    let mut model = GBDT::new(&cfg);
    model.fit(&mut data);
    model
}

#[test]
fn test_model_for_wrong_input_width_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.json");
    wide_model()
        .save_model(path.to_str().unwrap())
        .expect("save model");

    let err = GbdtPipeline::load(&path, PipelineFormat::Gbdt, LabelMap::default())
        .err()
        .expect("wide model must be rejected");
    assert!(matches!(err, ModelError::MalformedArtifact { .. }), "{err}");
    assert!(err.to_string().contains("wide.json"));

    // Fails at startup, never at predict time
    let output = Command::new(env!("CARGO_BIN_EXE_fragma"))
        .args(["classify", "--ml-model"])
        .arg(&path)
        .arg("Because it was raining.")
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("FRAGMA_ML_MODEL")
        .output()
        .expect("Failed to run fragma");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
    assert!(stderr.contains("Malformed"), "stderr: {stderr}");
}

#[test]
fn test_binary_reads_xgboost_dump_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("fragma_ml.dump"),
        "0.0\n\
[{\"nodeid\": 0, \"depth\": 0, \"split\": \"f13\", \"split_condition\": 0.5, \
\"yes\": 1, \"no\": 2, \"missing\": 1, \
\"children\": [{\"nodeid\": 1, \"leaf\": -2.0}, {\"nodeid\": 2, \"leaf\": 2.0}]}]\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("fragma.toml"),
        "[classical]\nmodel = \"fragma_ml.dump\"\nformat = \"xgboost\"\n",
    )
    .unwrap();

    let classify = |text: &str| {
        let output = Command::new(env!("CARGO_BIN_EXE_fragma"))
            .args(["classify", text])
            .current_dir(dir.path())
            .env("HOME", dir.path())
            .env("XDG_CONFIG_HOME", dir.path().join(".config"))
            .env_remove("FRAGMA_ML_MODEL")
            .output()
            .expect("Failed to run fragma");
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        assert!(output.status.success(), "stderr: {stderr}");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    };

    assert_eq!(classify("So, this is great."), FRAGMENT_LABEL);
    assert_eq!(classify("This is so great."), NOT_FRAGMENT_LABEL);
}
