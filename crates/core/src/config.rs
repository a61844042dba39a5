//! Application configuration.
//!
//! Values come from built-in defaults, then `config.toml` in the user's
//! config directory, then `FRUIT_DEALER_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{engine::DEFAULT_TRAVEL_COST, models::Money, setup::DEFAULT_STARTING_MONEY};

/// Directory under the platform config dir holding all app files.
pub const APP_DIR: &str = "fruit-dealer";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides (e.g. `FRUIT_DEALER_TRAVEL_COST=75`).
pub const ENV_PREFIX: &str = "FRUIT_DEALER";

const DEFAULT_CONFIG: &str = r#"# Fruit Dealer configuration.
# Money values are in cents.

# save_dir = "/path/to/saves"
starting_money = 200000
travel_cost = 50
# Fix the price generator for reproducible games.
# rng_seed = 42
"#;

/// Runtime settings shared by the core and the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding save files.
    pub save_dir: PathBuf,
    /// Money a new player starts with.
    pub starting_money: Money,
    /// Cost of every trip between cities. Must be positive.
    pub travel_cost: Money,
    /// Optional seed for the price generator.
    pub rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_dir: app_dir().join("saves"),
            starting_money: DEFAULT_STARTING_MONEY,
            travel_cost: DEFAULT_TRAVEL_COST,
            rng_seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path`, which may be missing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layers(
            path.as_ref(),
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    fn load_layers(path: &Path, env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config = settings
            .try_deserialize::<AppConfig>()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.travel_cost > 0, "travel_cost must be positive");
        Ok(())
    }
}

/// Root of all application files, e.g. `~/.config/fruit-dealer`.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default path of the configuration file.
pub fn config_path() -> PathBuf {
    app_dir().join(CONFIG_FILE)
}

/// Write a commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
