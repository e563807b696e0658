//! Classical feature-engineered fragment classifier
//!
//! Architecture: text → FeatureExtractor (17 flags) → FeatureRecord → Pipeline → label
//!
//! The pipeline is an externally trained artifact; this module only owns the
//! record schema and the call into the scoring collaborator.

mod gbdt_pipeline;
mod record;

pub use gbdt_pipeline::{vectorize, GbdtPipeline, LabelMap, PipelineFormat, TEXT_BUCKETS, VECTOR_LEN};
pub use record::{FeatureRecord, RecordValue, NUM_COLUMNS, RECORD_COLUMNS, TEXT_COLUMN};

use tracing::debug;

use crate::config::ClassicalConfig;
use crate::error::ModelResult;
use crate::features::FeatureExtractor;

/// Scoring collaborator: maps a one-row record to a label.
pub trait Pipeline: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> ModelResult<String>;
}

/// Classical predictor: feature extraction plus a pre-trained pipeline
pub struct ClassicalPredictor {
    extractor: &'static FeatureExtractor,
    pipeline: Box<dyn Pipeline>,
}

impl ClassicalPredictor {
    pub fn new(pipeline: impl Pipeline + 'static) -> Self {
        Self {
            extractor: FeatureExtractor::shared(),
            pipeline: Box::new(pipeline),
        }
    }

    /// Load the configured GBDT pipeline. Fails if the artifact is absent
    /// or malformed.
    pub fn from_config(config: &ClassicalConfig) -> ModelResult<Self> {
        let pipeline = GbdtPipeline::load(&config.model, config.format, config.label_map())?;
        Ok(Self::new(pipeline))
    }

    /// Build the record the pipeline will see for `text`.
    pub fn record(&self, text: &str) -> FeatureRecord {
        FeatureRecord::from_text(text, self.extractor)
    }

    pub fn predict(&self, text: &str) -> ModelResult<String> {
        let record = self.record(text);
        debug!(
            features_set = record.features().count_set(),
            "classical predictor built record"
        );
        self.pipeline.predict(&record)
    }
}
