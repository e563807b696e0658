//! Error types for model loading and inference

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading artifacts or scoring a request
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{kind} artifact not found: {}", .path.display())]
    MissingArtifact { kind: &'static str, path: PathBuf },

    #[error("Malformed {kind} artifact {}: {reason}", .path.display())]
    MalformedArtifact {
        kind: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid {kind} artifact: {reason}")]
    InvalidArtifact { kind: &'static str, reason: String },

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Sequence model returned score outside [0, 1]: {0}")]
    InvalidScore(f32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Attach an artifact path to an `InvalidArtifact` error.
    pub(crate) fn at_path(self, path: &Path) -> Self {
        match self {
            ModelError::InvalidArtifact { kind, reason } => ModelError::MalformedArtifact {
                kind,
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Read an artifact file, mapping a missing file to `MissingArtifact`.
pub(crate) fn read_artifact(kind: &'static str, path: &Path) -> ModelResult<String> {
    if !path.is_file() {
        return Err(ModelError::MissingArtifact {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}
