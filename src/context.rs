//! Immutable model context shared by every request
//!
//! Both predictors are loaded once at startup; a missing or malformed
//! artifact aborts construction so the process never starts half-loaded.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::classical::ClassicalPredictor;
use crate::config::AppConfig;
use crate::error::ModelResult;
use crate::sequence::SequencePredictor;

/// Which predictor a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Classical,
    Sequence,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Classical, ModelKind::Sequence];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Classical => "classical",
            ModelKind::Sequence => "sequence",
        }
    }

    /// Tab caption in the UI shell.
    pub fn tab_title(self) -> &'static str {
        match self {
            ModelKind::Classical => "Classical ML",
            ModelKind::Sequence => "Deep Learning",
        }
    }

    pub fn form_title(self) -> &'static str {
        match self {
            ModelKind::Classical => "Fragment ML Classifier",
            ModelKind::Sequence => "Fragment DL Classifier",
        }
    }

    pub fn description(self) -> Option<&'static str> {
        match self {
            ModelKind::Classical => {
                Some("Automatically extracts punctuation and verb features to predict.")
            }
            ModelKind::Sequence => None,
        }
    }

    pub fn input_label(self) -> &'static str {
        match self {
            ModelKind::Classical => "Enter a sentence",
            ModelKind::Sequence => "Enter text",
        }
    }

    pub fn output_label(self) -> &'static str {
        match self {
            ModelKind::Classical => "Prediction",
            ModelKind::Sequence => "DL Model Prediction",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classical" | "ml" => Ok(ModelKind::Classical),
            "sequence" | "dl" => Ok(ModelKind::Sequence),
            other => Err(format!("unknown model '{other}' (expected classical or sequence)")),
        }
    }
}

/// Read-only holder of both predictors.
pub struct ModelContext {
    classical: ClassicalPredictor,
    sequence: SequencePredictor,
}

impl ModelContext {
    pub fn new(classical: ClassicalPredictor, sequence: SequencePredictor) -> Self {
        Self {
            classical,
            sequence,
        }
    }

    /// Load every configured artifact.
    pub fn load(config: &AppConfig) -> ModelResult<Self> {
        let classical = ClassicalPredictor::from_config(&config.classical)?;
        info!("Loaded classical model from {}", config.classical.model.display());

        let sequence = SequencePredictor::from_config(&config.sequence)?;
        if !sequence.is_placeholder() {
            info!("Loaded sequence model");
        }

        Ok(Self::new(classical, sequence))
    }

    pub fn classical(&self) -> &ClassicalPredictor {
        &self.classical
    }

    pub fn sequence(&self) -> &SequencePredictor {
        &self.sequence
    }

    /// Route `text` to the selected predictor.
    pub fn predict(&self, kind: ModelKind, text: &str) -> ModelResult<String> {
        match kind {
            ModelKind::Classical => self.classical.predict(text),
            ModelKind::Sequence => self.sequence.predict(text),
        }
    }
}
