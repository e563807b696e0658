//! Word-level vocabulary tokenizer
//!
//! Encodes text into a fixed-length id sequence. Id 0 is padding and id 1
//! is the out-of-vocabulary token; vocabulary ids start at 2.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Tokenizer;
use crate::error::{read_artifact, ModelError, ModelResult};

const ARTIFACT_KIND: &str = "tokenizer";

pub const PAD_ID: u32 = 0;
pub const OOV_ID: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabTokenizer {
    /// Lowercased word → id
    vocab: HashMap<String, u32>,
    /// Output sequence length (truncate or pad)
    max_len: usize,
}

impl VocabTokenizer {
    pub fn new(vocab: HashMap<String, u32>, max_len: usize) -> ModelResult<Self> {
        let tokenizer = Self { vocab, max_len };
        tokenizer.validate()?;
        Ok(tokenizer)
    }

    pub fn load(path: &Path) -> ModelResult<Self> {
        let json = read_artifact(ARTIFACT_KIND, path)?;
        Self::from_json(&json).map_err(|e| e.at_path(path))
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        let tokenizer: Self =
            serde_json::from_str(json).map_err(|e| ModelError::InvalidArtifact {
                kind: ARTIFACT_KIND,
                reason: e.to_string(),
            })?;
        tokenizer.validate()?;
        Ok(tokenizer)
    }

    fn validate(&self) -> ModelResult<()> {
        if self.max_len == 0 {
            return Err(ModelError::InvalidArtifact {
                kind: ARTIFACT_KIND,
                reason: "max_len must be positive".into(),
            });
        }
        if let Some((word, id)) = self.vocab.iter().find(|(_, id)| **id <= OOV_ID) {
            return Err(ModelError::InvalidArtifact {
                kind: ARTIFACT_KIND,
                reason: format!("word '{word}' uses reserved id {id}"),
            });
        }
        Ok(())
    }

    /// Smallest embedding table that covers every id this tokenizer emits.
    pub fn vocab_size(&self) -> usize {
        self.vocab
            .values()
            .max()
            .map(|&id| id as usize + 1)
            .unwrap_or(OOV_ID as usize + 1)
    }
}

impl Tokenizer for VocabTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        let mut ids: Vec<u32> = text
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|word| !word.is_empty())
            .map(|word| self.vocab.get(&word).copied().unwrap_or(OOV_ID))
            .take(self.max_len)
            .collect();
        ids.resize(self.max_len, PAD_ID);
        ids
    }

    fn sequence_len(&self) -> usize {
        self.max_len
    }
}
