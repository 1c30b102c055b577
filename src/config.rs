use std::{fs, path::Path};

use anyhow::{Context, Result};
use machine_learning::training::TrainerConfig;

const SEED_VAR: &str = "ECHO_SEED";
const EPOCHS_VAR: &str = "ECHO_EPOCHS";

/// Loads a `TrainerConfig` from a JSON file, every missing field takes its default.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_json(path: &Path) -> Result<TrainerConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read '{}'", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("invalid config '{}'", path.display()))
}

/// Applies the `ECHO_SEED` and `ECHO_EPOCHS` overrides found through `lookup`.
///
/// # Errors
/// Returns an error if an override is set but isn't a valid number.
pub fn apply_overrides<F>(mut config: TrainerConfig, lookup: F) -> Result<TrainerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(seed) = lookup(SEED_VAR) {
        let seed = seed
            .trim()
            .parse()
            .with_context(|| format!("{SEED_VAR} must be an unsigned integer, got '{seed}'"))?;
        config.seed = Some(seed);
    }

    if let Some(epochs) = lookup(EPOCHS_VAR) {
        config.num_epochs = epochs
            .trim()
            .parse()
            .with_context(|| format!("{EPOCHS_VAR} must be an unsigned integer, got '{epochs}'"))?;
    }

    Ok(config)
}

/// Resolves the run's configuration from an optional JSON path and the environment.
pub fn resolve(path: Option<&Path>) -> Result<TrainerConfig> {
    let config = match path {
        Some(path) => load_json(path)?,
        None => TrainerConfig::default(),
    };

    apply_overrides(config, |key| std::env::var(key).ok())
}
