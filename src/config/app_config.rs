//! Application configuration
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User config (`~/.config/fragma/config.toml`)
//! 3. Project config (`./fragma.toml`, or the file given with `--config`)
//! 4. Environment variables (`FRAGMA_ML_MODEL`, `FRAGMA_DL_MODEL`, `FRAGMA_DL_TOKENIZER`)
//! 5. Command-line overrides
//!
//! Files are merged table by table before deserializing, so a project file
//! only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::classical::{LabelMap, PipelineFormat};
use crate::{FRAGMENT_LABEL, NOT_FRAGMENT_LABEL};

pub const PROJECT_CONFIG_FILE: &str = "fragma.toml";
pub const ENV_ML_MODEL: &str = "FRAGMA_ML_MODEL";
pub const ENV_DL_MODEL: &str = "FRAGMA_DL_MODEL";
pub const ENV_DL_TOKENIZER: &str = "FRAGMA_DL_TOKENIZER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub classical: ClassicalConfig,
    pub sequence: SequenceConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassicalConfig {
    /// Path to the trained tree ensemble
    pub model: PathBuf,
    pub format: PipelineFormat,
    /// Label for probabilities at or above `threshold`
    pub positive_label: String,
    pub negative_label: String,
    pub threshold: f64,
}

impl Default for ClassicalConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("models/fragma_ml.json"),
            format: PipelineFormat::Gbdt,
            positive_label: FRAGMENT_LABEL.to_string(),
            negative_label: NOT_FRAGMENT_LABEL.to_string(),
            threshold: 0.5,
        }
    }
}

impl ClassicalConfig {
    pub fn label_map(&self) -> LabelMap {
        LabelMap {
            positive: self.positive_label.clone(),
            negative: self.negative_label.clone(),
            threshold: self.threshold,
        }
    }
}

/// Sequence model artifacts. Leave both unset for placeholder mode.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub model: Option<PathBuf>,
    pub tokenizer: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Select a Model Interface".to_string(),
        }
    }
}

/// Values supplied on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ml_model: Option<PathBuf>,
    pub dl_model: Option<PathBuf>,
    pub dl_tokenizer: Option<PathBuf>,
}

/// Config files to consult.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Optional; skipped with a warning when unreadable
    pub user: Option<PathBuf>,
    /// Optional; skipped with a warning when unreadable
    pub project: Option<PathBuf>,
    /// Required when set; replaces `project`
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover(explicit: Option<&Path>) -> Self {
        Self {
            user: AppConfig::user_config_path(),
            project: Some(PathBuf::from(PROJECT_CONFIG_FILE)),
            explicit: explicit.map(Path::to_path_buf),
        }
    }
}

impl AppConfig {
    /// Load from the default locations, the process environment and `overrides`.
    pub fn load(explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(
            &ConfigPaths::discover(explicit),
            |key| std::env::var(key).ok(),
            overrides,
        )
    }

    pub fn resolve(
        paths: &ConfigPaths,
        env: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();

        if let Some(user) = &paths.user {
            merge_optional(&mut merged, user);
        }
        match &paths.explicit {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.clone(),
                    });
                }
                merge_tables(&mut merged, read_table(explicit)?);
                debug!("Loaded config from {}", explicit.display());
            }
            None => {
                if let Some(project) = &paths.project {
                    merge_optional(&mut merged, project);
                }
            }
        }

        let mut config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))?;

        // Environment variables override files
        if let Some(path) = env(ENV_ML_MODEL) {
            config.classical.model = PathBuf::from(path);
        }
        if let Some(path) = env(ENV_DL_MODEL) {
            config.sequence.model = Some(PathBuf::from(path));
        }
        if let Some(path) = env(ENV_DL_TOKENIZER) {
            config.sequence.tokenizer = Some(PathBuf::from(path));
        }

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse a single TOML document on top of the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.ml_model {
            self.classical.model = path.clone();
        }
        if let Some(path) = &overrides.dl_model {
            self.sequence.model = Some(path.clone());
        }
        if let Some(path) = &overrides.dl_tokenizer {
            self.sequence.tokenizer = Some(path.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.classical.threshold) {
            return Err(ConfigError::Invalid(format!(
                "classical.threshold must be within [0, 1], got {}",
                self.classical.threshold
            )));
        }
        if self.classical.positive_label.is_empty() || self.classical.negative_label.is_empty() {
            return Err(ConfigError::Invalid(
                "classical labels must not be empty".into(),
            ));
        }
        match (&self.sequence.model, &self.sequence.tokenizer) {
            (Some(_), None) => Err(ConfigError::Invalid(
                "sequence.model is set but sequence.tokenizer is not".into(),
            )),
            (None, Some(_)) => Err(ConfigError::Invalid(
                "sequence.tokenizer is set but sequence.model is not".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fragma").join("config.toml"))
    }

    /// Example config written by `fragma init`
    pub fn example_toml() -> &'static str {
        r#"# fragma configuration

[classical]
# Trained tree ensemble. format = "gbdt" reads gbdt-rs native JSON.
# format = "xgboost" reads a dump whose first line is the base score alone
# (e.g. 0.5), followed by the JSON array of trees.
model = "models/fragma_ml.json"
format = "gbdt"
positive_label = "Fragment"
negative_label = "Not a Fragment"
threshold = 0.5

[sequence]
# Leave both unset to run the Deep Learning tab in placeholder mode
# model = "models/fragma_dl.json"
# tokenizer = "models/fragma_tokenizer.json"

[ui]
title = "Select a Model Interface"
"#
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_optional(merged: &mut toml::Table, path: &Path) {
    if !path.exists() {
        return;
    }
    match read_table(path) {
        Ok(table) => {
            debug!("Loaded config from {}", path.display());
            merge_tables(merged, table);
        }
        Err(e) => warn!("Skipping config: {}", e),
    }
}

/// Recursively merge `overlay` into `base`; overlay wins on conflicts.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}
