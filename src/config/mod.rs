//! Configuration module for fragma
//!
//! This module handles:
//! - Model artifact locations (classical pipeline, sequence model + tokenizer)
//! - Classical label mapping and decision threshold
//! - UI shell text
//! - Layering of defaults, config files, environment and CLI flags

mod app_config;

pub use app_config::{
    AppConfig,
    ClassicalConfig,
    ConfigError,
    ConfigOverrides,
    ConfigPaths,
    SequenceConfig,
    UiConfig,
    ENV_DL_MODEL,
    ENV_DL_TOKENIZER,
    ENV_ML_MODEL,
    PROJECT_CONFIG_FILE,
};
