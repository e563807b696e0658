//! fragma - sentence fragment classification
//!
//! Classifies a sentence as "Fragment" or "Not a Fragment" with either a
//! classical feature-engineered pipeline or a neural sequence model, both
//! loaded from pre-trained artifacts.

pub mod classical;
pub mod config;
pub mod context;
pub mod error;
pub mod features;
pub mod sequence;

pub use classical::{ClassicalPredictor, FeatureRecord, Pipeline};
pub use config::AppConfig;
pub use context::{ModelContext, ModelKind};
pub use error::{ModelError, ModelResult};
pub use features::{extract_features, Feature, FeatureExtractor, FeatureSet, FEATURE_NAMES};
pub use sequence::{format_prediction, SequenceModel, SequencePredictor, Tokenizer};

pub const FRAGMENT_LABEL: &str = "Fragment";
pub const NOT_FRAGMENT_LABEL: &str = "Not a Fragment";
