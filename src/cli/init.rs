//! Init command - write an example configuration

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use fragma::config::{AppConfig, PROJECT_CONFIG_FILE};

/// Run the init command
pub fn run(dir: &Path, force: bool) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join(PROJECT_CONFIG_FILE);
    if config_path.exists() && !force {
        println!(
            "{} Already initialized at {} (use --force to overwrite)",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::example_toml())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_example_config() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), false).unwrap();
        let content = std::fs::read_to_string(dir.path().join(PROJECT_CONFIG_FILE)).unwrap();
        assert_eq!(content, AppConfig::example_toml());
    }

    #[test]
    fn test_keeps_existing_config_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "# mine\n").unwrap();

        run(dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        run(dir.path(), true).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            AppConfig::example_toml()
        );
    }

    #[test]
    fn test_rejects_missing_directory() {
        assert!(run(Path::new("/nonexistent/dir"), false).is_err());
    }
}
