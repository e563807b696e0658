//! GBDT-backed classical pipeline
//!
//! Wraps the `gbdt` crate to provide:
//! - Model loading from gbdt-rs native JSON or XGBoost JSON dump format
//! - Shape checks against `VECTOR_LEN` so a mismatched ensemble fails at load
//! - Record vectorization (feature flags + hashed bag of words)
//! - Probability to label mapping
//!
//! Note: the gbdt crate internally uses `f32` (`ValueType`); probabilities are
//! widened to `f64` at the crate boundary.

use std::io::Cursor;
use std::path::Path;

use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use super::record::FeatureRecord;
use super::Pipeline;
use crate::error::{read_artifact, ModelError, ModelResult};
use crate::features::NUM_FEATURES;
use crate::{FRAGMENT_LABEL, NOT_FRAGMENT_LABEL};

const ARTIFACT_KIND: &str = "classical model";

/// Number of hashed word buckets appended after the feature flags.
pub const TEXT_BUCKETS: usize = 32;

/// Length of the vector fed to the tree ensemble.
pub const VECTOR_LEN: usize = NUM_FEATURES + TEXT_BUCKETS;

// ---------------------------------------------------------------------------
// Vectorization
// ---------------------------------------------------------------------------

/// Turn a record into the model's input vector.
///
/// Layout:
///   0..17   : feature flags (1.0 / 0.0) in schema order
///  17..49   : lowercase word frequencies hashed into `TEXT_BUCKETS` buckets
pub fn vectorize(record: &FeatureRecord) -> Vec<f32> {
    let mut values = Vec::with_capacity(VECTOR_LEN);
    values.extend(
        record
            .features()
            .iter()
            .map(|(_, set)| if set { 1.0 } else { 0.0 }),
    );

    let lower = record.text().to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut buckets = [0.0f32; TEXT_BUCKETS];
    if !words.is_empty() {
        let weight = 1.0 / words.len() as f32;
        for word in &words {
            let bucket = (xxh3_64(word.as_bytes()) % TEXT_BUCKETS as u64) as usize;
            buckets[bucket] += weight;
        }
    }
    values.extend_from_slice(&buckets);

    values
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// On-disk format of the tree ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineFormat {
    /// gbdt-rs native JSON (serde-serialized `GBDT`)
    #[default]
    Gbdt,
    /// XGBoost dump with a `binary:logistic` objective: the base score alone
    /// on the first line, then the JSON array of trees
    Xgboost,
}

/// Maps a fragment probability to an output label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    pub positive: String,
    pub negative: String,
    pub threshold: f64,
}

impl LabelMap {
    pub fn label(&self, probability: f64) -> &str {
        if probability >= self.threshold {
            &self.positive
        } else {
            &self.negative
        }
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self {
            positive: FRAGMENT_LABEL.to_string(),
            negative: NOT_FRAGMENT_LABEL.to_string(),
            threshold: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Thin wrapper around `gbdt::gradient_boost::GBDT` implementing [`Pipeline`].
pub struct GbdtPipeline {
    model: GBDT,
    labels: LabelMap,
}

impl GbdtPipeline {
    /// Load a model from disk in the given format.
    pub fn load(path: &Path, format: PipelineFormat, labels: LabelMap) -> ModelResult<Self> {
        let json = read_artifact(ARTIFACT_KIND, path)?;
        let pipeline = match format {
            PipelineFormat::Gbdt => Self::from_json(&json, labels),
            PipelineFormat::Xgboost => Self::from_xgboost_json(&json, labels),
        }
        .map_err(|e| e.at_path(path))?;

        debug!("Loaded {:?} classical model from {}", format, path.display());
        Ok(pipeline)
    }

    /// Load a model from a gbdt-rs native JSON string.
    pub fn from_json(json: &str, labels: LabelMap) -> ModelResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| invalid(format!("failed to parse GBDT JSON: {e}")))?;
        check_feature_size(&value)?;
        check_trees(&value)?;
        let model: GBDT = serde_json::from_value(value)
            .map_err(|e| invalid(format!("failed to parse GBDT JSON: {e}")))?;
        Ok(Self { model, labels })
    }

    /// Load a model from an XGBoost dump string.
    ///
    /// The first line holds the base score; the rest is the JSON tree array.
    pub fn from_xgboost_json(json: &str, labels: LabelMap) -> ModelResult<Self> {
        let reader = std::io::BufReader::new(Cursor::new(json));
        let model = GBDT::from_xgboost_reader(reader, "binary:logistic")
            .map_err(|e| invalid(format!("failed to parse XGBoost dump: {e}")))?;
        let value = serde_json::to_value(&model)
            .map_err(|e| invalid(format!("failed to inspect XGBoost model: {e}")))?;
        check_trees(&value)?;
        Ok(Self { model, labels })
    }

    /// Wrap an already-trained `GBDT` instance.
    pub fn from_trained(model: GBDT, labels: LabelMap) -> Self {
        Self { model, labels }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Probability that the record is a fragment.
    pub fn probability(&self, record: &FeatureRecord) -> ModelResult<f64> {
        let data = vec![Data::new_test_data(vectorize(record), None)];
        let preds = self.model.predict(&data);
        let prob = preds
            .first()
            .copied()
            .ok_or_else(|| ModelError::Scoring("GBDT returned no prediction".into()))?;
        if !prob.is_finite() {
            return Err(ModelError::Scoring(format!(
                "GBDT returned non-finite probability {prob}"
            )));
        }
        Ok(prob as f64)
    }
}

fn invalid(reason: String) -> ModelError {
    ModelError::InvalidArtifact {
        kind: ARTIFACT_KIND,
        reason,
    }
}

/// Native models record the input width they were trained on.
fn check_feature_size(model: &serde_json::Value) -> ModelResult<()> {
    let feature_size = model["conf"]["feature_size"]
        .as_u64()
        .ok_or_else(|| invalid("missing conf.feature_size".into()))?;
    if feature_size != VECTOR_LEN as u64 {
        return Err(invalid(format!(
            "model expects {feature_size} input values, pipeline produces {VECTOR_LEN}"
        )));
    }
    Ok(())
}

/// Walk a serialized `GBDT` and reject anything `GBDT::predict` would
/// panic on: a tree count that disagrees with `conf.iterations`, an empty
/// tree, or a split on an index outside the input vector.
fn check_trees(model: &serde_json::Value) -> ModelResult<()> {
    let trees = model["trees"]
        .as_array()
        .ok_or_else(|| invalid("missing trees".into()))?;
    let iterations = model["conf"]["iterations"]
        .as_u64()
        .ok_or_else(|| invalid("missing conf.iterations".into()))?;
    if iterations != trees.len() as u64 {
        return Err(invalid(format!(
            "conf.iterations is {iterations} but the model has {} trees",
            trees.len()
        )));
    }

    for (t, tree) in trees.iter().enumerate() {
        let nodes = tree["tree"]["tree"]
            .as_array()
            .ok_or_else(|| invalid(format!("tree {t} has no node list")))?;
        if nodes.is_empty() {
            return Err(invalid(format!("tree {t} is empty")));
        }
        for node in nodes {
            let value = &node["value"];
            if value["is_leaf"].as_bool().unwrap_or(false) {
                continue;
            }
            let index = value["feature_index"]
                .as_u64()
                .ok_or_else(|| invalid(format!("tree {t} has a split without a feature index")))?;
            if index >= VECTOR_LEN as u64 {
                return Err(invalid(format!(
                    "tree {t} splits on feature {index}, input has {VECTOR_LEN} values"
                )));
            }
        }
    }
    Ok(())
}

impl Pipeline for GbdtPipeline {
    fn predict(&self, record: &FeatureRecord) -> ModelResult<String> {
        let prob = self.probability(record)?;
        debug!(probability = prob, "classical model scored record");
        Ok(self.labels.label(prob).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;

    fn record(text: &str) -> FeatureRecord {
        FeatureRecord::from_text(text, FeatureExtractor::shared())
    }

    /// One split on `has_starter` (index 13); texts with a starter go right.
    const STARTER_DUMP: &str = r#"0.0
[{"nodeid": 0, "depth": 0, "split": "f13", "split_condition": 0.5,
  "yes": 1, "no": 2, "missing": 1,
  "children": [{"nodeid": 1, "leaf": -2.0}, {"nodeid": 2, "leaf": 2.0}]}]
"#;

    /// The starter dump re-encoded as a gbdt-rs native model.
    fn native_value() -> serde_json::Value {
        let pipeline = GbdtPipeline::from_xgboost_json(STARTER_DUMP, LabelMap::default()).unwrap();
        let mut value = serde_json::to_value(&pipeline.model).unwrap();
        value["conf"]["feature_size"] = serde_json::json!(VECTOR_LEN);
        value
    }

    fn reason(err: ModelError) -> String {
        match err {
            ModelError::InvalidArtifact { reason, .. } => reason,
            other => panic!("expected InvalidArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_vector_layout() {
        let v = vectorize(&record("Because it was raining."));
        assert_eq!(v.len(), VECTOR_LEN);
        // has_auxiliary is the first flag
        assert_eq!(v[0], 1.0);
        // has_question_mark
        assert_eq!(v[2], 0.0);
        let bucket_mass: f32 = v[NUM_FEATURES..].iter().sum();
        assert!((bucket_mass - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_vector_is_zero() {
        let v = vectorize(&record(""));
        assert_eq!(v.len(), VECTOR_LEN);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_word_buckets_ignore_case() {
        let a = vectorize(&record("rain rain"));
        let b = vectorize(&record("RAIN Rain"));
        assert_eq!(a[NUM_FEATURES..], b[NUM_FEATURES..]);
    }

    #[test]
    fn test_label_threshold() {
        let labels = LabelMap::default();
        assert_eq!(labels.label(0.5), FRAGMENT_LABEL);
        assert_eq!(labels.label(0.49), NOT_FRAGMENT_LABEL);

        let strict = LabelMap {
            threshold: 0.9,
            ..LabelMap::default()
        };
        assert_eq!(strict.label(0.8), NOT_FRAGMENT_LABEL);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = GbdtPipeline::from_json("{not json", LabelMap::default())
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::InvalidArtifact { .. }));
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let err = GbdtPipeline::load(
            Path::new("/nonexistent/fragma_ml.json"),
            PipelineFormat::Gbdt,
            LabelMap::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ModelError::MissingArtifact { .. }));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "[]").unwrap();
        let err = GbdtPipeline::load(&path, PipelineFormat::Gbdt, LabelMap::default())
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::MalformedArtifact { .. }));
        assert!(err.to_string().contains("model.json"));
    }

    #[test]
    fn test_xgboost_dump_scores_both_branches() {
        let pipeline = GbdtPipeline::from_xgboost_json(STARTER_DUMP, LabelMap::default()).unwrap();

        let starter = pipeline.probability(&record("So, this is great.")).unwrap();
        let plain = pipeline.probability(&record("This is so great.")).unwrap();
        assert!((starter - 0.8808).abs() < 1e-3, "{starter}");
        assert!((plain - 0.1192).abs() < 1e-3, "{plain}");

        assert_eq!(pipeline.predict(&record("So, this is great.")).unwrap(), FRAGMENT_LABEL);
        assert_eq!(
            pipeline.predict(&record("This is so great.")).unwrap(),
            NOT_FRAGMENT_LABEL
        );
    }

    #[test]
    fn test_xgboost_dump_needs_base_score_line() {
        let trees_only = STARTER_DUMP.split_once('\n').unwrap().1;
        let err = GbdtPipeline::from_xgboost_json(trees_only, LabelMap::default())
            .err()
            .unwrap();
        assert!(reason(err).contains("XGBoost"));
    }

    #[test]
    fn test_xgboost_split_outside_vector_is_rejected() {
        let wide = STARTER_DUMP.replace("\"f13\"", "\"f99\"");
        let err = GbdtPipeline::from_xgboost_json(&wide, LabelMap::default())
            .err()
            .unwrap();
        assert!(reason(err).contains("feature 99"));
    }

    #[test]
    fn test_native_model_loads_and_scores() {
        let pipeline =
            GbdtPipeline::from_json(&native_value().to_string(), LabelMap::default()).unwrap();
        assert_eq!(pipeline.predict(&record("So, this is great.")).unwrap(), FRAGMENT_LABEL);
        assert_eq!(
            pipeline.predict(&record("This is so great.")).unwrap(),
            NOT_FRAGMENT_LABEL
        );
    }

    #[test]
    fn test_native_split_outside_vector_is_rejected() {
        let mut value = native_value();
        value["trees"][0]["tree"]["tree"][0]["value"]["feature_index"] = serde_json::json!(75);
        let err = GbdtPipeline::from_json(&value.to_string(), LabelMap::default())
            .err()
            .unwrap();
        assert!(reason(err).contains("feature 75"));
    }

    #[test]
    fn test_native_feature_size_mismatch_is_rejected() {
        let mut value = native_value();
        value["conf"]["feature_size"] = serde_json::json!(80);
        let err = GbdtPipeline::from_json(&value.to_string(), LabelMap::default())
            .err()
            .unwrap();
        assert!(reason(err).contains("80 input values"));
    }

    #[test]
    fn test_native_iteration_mismatch_is_rejected() {
        let mut value = native_value();
        value["conf"]["iterations"] = serde_json::json!(3);
        let err = GbdtPipeline::from_json(&value.to_string(), LabelMap::default())
            .err()
            .unwrap();
        assert!(reason(err).contains("conf.iterations is 3"));
    }

    #[test]
    fn test_xgboost_file_loads_through_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.dump");
        std::fs::write(&path, STARTER_DUMP).unwrap();
        let pipeline =
            GbdtPipeline::load(&path, PipelineFormat::Xgboost, LabelMap::default()).unwrap();
        assert_eq!(pipeline.predict(&record("So, this is great.")).unwrap(), FRAGMENT_LABEL);

        // The same file is not a native model
        let err = GbdtPipeline::load(&path, PipelineFormat::Gbdt, LabelMap::default())
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::MalformedArtifact { .. }));
    }
}
