//! Features command - show what the classical pipeline sees

use anyhow::Result;
use console::style;

use fragma::classical::TEXT_COLUMN;
use fragma::{FeatureExtractor, FeatureRecord};

/// Run the features command
pub fn run(text: &str, format: &str) -> Result<()> {
    let record = FeatureRecord::from_text(text, FeatureExtractor::shared());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("{} {:?}\n", style(format!("{TEXT_COLUMN}:")).bold(), record.text());
    let width = fragma::FEATURE_NAMES
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0);
    for (name, value) in record.features().iter() {
        let shown = if value {
            style("true").green().bold()
        } else {
            style("false").dim()
        };
        println!("  {name:<width$}  {shown}");
    }
    println!(
        "\n{} of {} features set",
        record.features().count_set(),
        record.features().len()
    );

    Ok(())
}
