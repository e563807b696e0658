//! Embedding-bag sequence classifier
//!
//! Architecture: ids → mean(embedding rows, padding skipped) → Linear(hidden)
//! → ReLU → Linear(1) → Sigmoid. Pure Rust, weights loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::tokenizer::PAD_ID;
use super::SequenceModel;
use crate::error::{read_artifact, ModelError, ModelResult};

const ARTIFACT_KIND: &str = "sequence model";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingBagModel {
    /// Embedding table [vocab_size x dim]
    embeddings: Vec<Vec<f32>>,
    /// Hidden layer weights [hidden_size x dim]
    w1: Vec<Vec<f32>>,
    /// Hidden layer bias [hidden_size]
    b1: Vec<f32>,
    /// Output weights [hidden_size]
    w2: Vec<f32>,
    /// Output bias
    b2: f32,
}

impl EmbeddingBagModel {
    pub fn with_weights(
        embeddings: Vec<Vec<f32>>,
        w1: Vec<Vec<f32>>,
        b1: Vec<f32>,
        w2: Vec<f32>,
        b2: f32,
    ) -> ModelResult<Self> {
        let model = Self {
            embeddings,
            w1,
            b1,
            w2,
            b2,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> ModelResult<Self> {
        let json = read_artifact(ARTIFACT_KIND, path)?;
        Self::from_json(&json).map_err(|e| e.at_path(path))
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        let model: Self = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn vocab_size(&self) -> usize {
        self.embeddings.len()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embeddings.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn hidden_size(&self) -> usize {
        self.w1.len()
    }

    fn validate(&self) -> ModelResult<()> {
        let dim = self.embedding_dim();
        if dim == 0 {
            return Err(invalid("embedding table is empty".into()));
        }
        if self.embeddings.iter().any(|row| row.len() != dim) {
            return Err(invalid("embedding rows have inconsistent width".into()));
        }
        if self.w1.is_empty() {
            return Err(invalid("hidden layer is empty".into()));
        }
        if self.w1.iter().any(|row| row.len() != dim) {
            return Err(invalid(format!("w1 rows must have width {dim}")));
        }
        if self.b1.len() != self.hidden_size() || self.w2.len() != self.hidden_size() {
            return Err(invalid(format!(
                "b1 and w2 must have length {}",
                self.hidden_size()
            )));
        }
        Ok(())
    }

    /// Mean of the embedding rows of all non-padding ids.
    fn pool(&self, sequence: &[u32]) -> ModelResult<Vec<f32>> {
        let mut pooled = vec![0.0f32; self.embedding_dim()];
        let mut count = 0usize;
        for &id in sequence.iter().filter(|&&id| id != PAD_ID) {
            let row = self.embeddings.get(id as usize).ok_or_else(|| {
                ModelError::Scoring(format!(
                    "token id {id} outside embedding table of {} rows",
                    self.vocab_size()
                ))
            })?;
            for (p, &x) in pooled.iter_mut().zip(row) {
                *p += x;
            }
            count += 1;
        }
        if count > 0 {
            let scale = 1.0 / count as f32;
            pooled.iter_mut().for_each(|p| *p *= scale);
        }
        Ok(pooled)
    }
}

fn invalid(reason: String) -> ModelError {
    ModelError::InvalidArtifact {
        kind: ARTIFACT_KIND,
        reason,
    }
}

impl SequenceModel for EmbeddingBagModel {
    fn infer(&self, sequence: &[u32]) -> ModelResult<f32> {
        let x = self.pool(sequence)?;

        // Layer 1: Linear + ReLU
        let hidden: Vec<f32> = self
            .w1
            .iter()
            .zip(&self.b1)
            .map(|(row, &bias)| {
                let sum: f32 = row.iter().zip(&x).map(|(w, v)| w * v).sum::<f32>() + bias;
                sum.max(0.0)
            })
            .collect();

        // Layer 2: Linear + Sigmoid
        let logit: f32 = self
            .w2
            .iter()
            .zip(&hidden)
            .map(|(w, h)| w * h)
            .sum::<f32>()
            + self.b2;

        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}
