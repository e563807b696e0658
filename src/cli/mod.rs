//! CLI command definitions and handlers

mod classify;
mod features;
mod init;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fragma::config::{AppConfig, ConfigOverrides};
use fragma::ModelKind;

/// fragma - sentence fragment classifier
#[derive(Parser, Debug)]
#[command(name = "fragma")]
#[command(
    version,
    about = "Classify sentences as fragments with a classical or a neural model",
    long_about = "fragma classifies a sentence as \"Fragment\" or \"Not a Fragment\" using either \
a classical pipeline over 17 linguistic features or a neural sequence model.\n\n\
Run without a subcommand to open the interactive UI:\n  \
fragma",
    after_help = "\
Examples:
  fragma                                         Open the tabbed UI
  fragma classify \"Because it was raining.\"      Classify with the classical model
  fragma classify --model sequence \"Ran home.\"   Classify with the sequence model
  fragma features \"So, this is great.\"           Show the extracted features
  fragma init                                    Write an example fragma.toml"
)]
pub struct Cli {
    /// Config file (default: ./fragma.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Classical model artifact (overrides config and FRAGMA_ML_MODEL)
    #[arg(long, global = true)]
    pub ml_model: Option<PathBuf>,

    /// Sequence model artifact (overrides config and FRAGMA_DL_MODEL)
    #[arg(long, global = true)]
    pub dl_model: Option<PathBuf>,

    /// Sequence tokenizer artifact (overrides config and FRAGMA_DL_TOKENIZER)
    #[arg(long, global = true)]
    pub dl_tokenizer: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the tabbed UI with both classifiers (default)
    Ui,

    /// Classify a single sentence
    #[command(after_help = "\
Examples:
  fragma classify \"Because it was raining.\"
  fragma classify --model sequence \"Running late.\"
  fragma classify \"She can sing.\" --format json")]
    Classify {
        /// Sentence to classify
        text: String,

        /// Model to use: classical, sequence
        #[arg(long, short = 'm', default_value = "classical", value_parser = ["classical", "sequence"])]
        model: String,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Print the 17 linguistic features of a sentence (no models needed)
    Features {
        /// Sentence to analyze
        text: String,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Write an example fragma.toml in the current directory
    Init {
        /// Overwrite an existing fragma.toml
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ml_model: self.ml_model.clone(),
            dl_model: self.dl_model.clone(),
            dl_tokenizer: self.dl_tokenizer.clone(),
        }
    }

    fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load(self.config.as_deref(), &self.overrides())
            .context("Failed to load configuration")
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None | Some(Commands::Ui) => {
            let config = cli.load_config()?;
            tui::run(&config)
        }

        Some(Commands::Classify {
            text,
            model,
            format,
        }) => {
            let config = cli.load_config()?;
            let kind: ModelKind = model.parse().map_err(anyhow::Error::msg)?;
            classify::run(&config, kind, text, format)
        }

        Some(Commands::Features { text, format }) => features::run(text, format),

        Some(Commands::Init { force }) => init::run(std::path::Path::new("."), *force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_ui() {
        let cli = Cli::try_parse_from(["fragma"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_classify_args() {
        let cli = Cli::try_parse_from([
            "fragma",
            "classify",
            "--model",
            "sequence",
            "Ran home.",
            "--dl-model",
            "m.json",
        ])
        .unwrap();
        match &cli.command {
            Some(Commands::Classify {
                text,
                model,
                format,
            }) => {
                assert_eq!(text, "Ran home.");
                assert_eq!(model, "sequence");
                assert_eq!(format, "text");
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.overrides().dl_model, Some(PathBuf::from("m.json")));
    }

    #[test]
    fn test_rejects_unknown_model() {
        assert!(Cli::try_parse_from(["fragma", "classify", "--model", "onnx", "x"]).is_err());
    }
}
