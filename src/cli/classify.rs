//! Classify command - one form submission from the command line

use anyhow::{Context, Result};
use tracing::info;

use fragma::config::AppConfig;
use fragma::{ClassicalPredictor, ModelKind, SequencePredictor};

/// Run the classify command
///
/// Only the selected model's artifacts are loaded; they must be present.
pub fn run(config: &AppConfig, kind: ModelKind, text: &str, format: &str) -> Result<()> {
    let prediction = match kind {
        ModelKind::Classical => {
            let predictor = ClassicalPredictor::from_config(&config.classical)
                .context("Failed to load classical model")?;
            predictor.predict(text)
        }
        ModelKind::Sequence => {
            let predictor = SequencePredictor::from_config(&config.sequence)
                .context("Failed to load sequence model")?;
            predictor.predict(text)
        }
    }
    .with_context(|| format!("{} prediction failed", kind.tab_title()))?;

    info!(model = %kind, "classified {} chars", text.chars().count());

    match format {
        "json" => {
            let out = serde_json::json!({
                "model": kind.as_str(),
                "text": text,
                "prediction": prediction,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => println!("{prediction}"),
    }

    Ok(())
}
