//! Neural sequence fragment classifier
//!
//! Architecture: text → Tokenizer (fixed-length ids) → SequenceModel (score)
//! → `"<label> (<score>)"`
//!
//! Without configured artifacts the predictor runs in placeholder mode and
//! answers every request with a fixed message.

mod model;
mod tokenizer;

pub use model::EmbeddingBagModel;
pub use tokenizer::{VocabTokenizer, OOV_ID, PAD_ID};

use std::path::Path;

use tracing::{debug, warn};

use crate::config::SequenceConfig;
use crate::error::{ModelError, ModelResult};
use crate::{FRAGMENT_LABEL, NOT_FRAGMENT_LABEL};

/// Response returned when no sequence model is configured.
pub const PLACEHOLDER_RESPONSE: &str = "This is a placeholder DL model response.";

/// Scores strictly above this are labelled as fragments.
pub const FRAGMENT_THRESHOLD: f32 = 0.5;

/// Turns text into a fixed-length id sequence.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Length of every sequence returned by `encode`.
    fn sequence_len(&self) -> usize;
}

/// Scores an encoded sequence; the result must lie in [0, 1].
pub trait SequenceModel: Send + Sync {
    fn infer(&self, sequence: &[u32]) -> ModelResult<f32>;
}

/// Render a score as `"<label> (<score to 2 decimals>)"`.
pub fn format_prediction(score: f32) -> ModelResult<String> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(ModelError::InvalidScore(score));
    }
    let label = if score > FRAGMENT_THRESHOLD {
        FRAGMENT_LABEL
    } else {
        NOT_FRAGMENT_LABEL
    };
    Ok(format!("{label} ({score:.2})"))
}

enum Backend {
    Placeholder,
    Model {
        tokenizer: Box<dyn Tokenizer>,
        model: Box<dyn SequenceModel>,
    },
}

pub struct SequencePredictor {
    backend: Backend,
}

impl SequencePredictor {
    pub fn new(tokenizer: impl Tokenizer + 'static, model: impl SequenceModel + 'static) -> Self {
        Self {
            backend: Backend::Model {
                tokenizer: Box::new(tokenizer),
                model: Box::new(model),
            },
        }
    }

    pub fn placeholder() -> Self {
        Self {
            backend: Backend::Placeholder,
        }
    }

    /// Load tokenizer and model artifacts and check they agree.
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> ModelResult<Self> {
        let tokenizer = VocabTokenizer::load(tokenizer_path)?;
        let model = EmbeddingBagModel::load(model_path)?;

        if tokenizer.vocab_size() > model.vocab_size() {
            return Err(ModelError::MalformedArtifact {
                kind: "sequence model",
                path: model_path.to_path_buf(),
                reason: format!(
                    "embedding table has {} rows but tokenizer emits ids up to {}",
                    model.vocab_size(),
                    tokenizer.vocab_size() - 1
                ),
            });
        }

        debug!(
            "Loaded sequence model from {} (vocab={}, dim={}, hidden={})",
            model_path.display(),
            model.vocab_size(),
            model.embedding_dim(),
            model.hidden_size()
        );
        Ok(Self::new(tokenizer, model))
    }

    /// Build from configuration; no artifacts configured means placeholder mode.
    pub fn from_config(config: &SequenceConfig) -> ModelResult<Self> {
        match (&config.model, &config.tokenizer) {
            (Some(model), Some(tokenizer)) => Self::load(model, tokenizer),
            _ => {
                warn!("No sequence model configured, using placeholder responses");
                Ok(Self::placeholder())
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.backend, Backend::Placeholder)
    }

    /// Raw model score, or `None` in placeholder mode.
    pub fn score(&self, text: &str) -> ModelResult<Option<f32>> {
        match &self.backend {
            Backend::Placeholder => Ok(None),
            Backend::Model { tokenizer, model } => {
                let sequence = tokenizer.encode(text);
                debug_assert_eq!(sequence.len(), tokenizer.sequence_len());
                let score = model.infer(&sequence)?;
                debug!(score, "sequence model scored text");
                Ok(Some(score))
            }
        }
    }

    pub fn predict(&self, text: &str) -> ModelResult<String> {
        match self.score(text)? {
            Some(score) => format_prediction(score),
            None => Ok(PLACEHOLDER_RESPONSE.to_string()),
        }
    }
}
