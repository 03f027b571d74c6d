use super::{
    evolution::EvolutionConfig,
    market::{MarketConfig, WorldConfig},
    scoring::{RankingConfig, ScoringConfig},
    traits::ConfigSection,
};
use crate::error::EngineError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix for environment overrides, e.g. `EVOFORECAST_SCORING__DEAD_ZONE`.
const ENV_PREFIX: &str = "EVOFORECAST";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub scoring: ScoringConfig,
    pub ranking: RankingConfig,
    pub evolution: EvolutionConfig,
    pub worlds: Vec<WorldConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            scoring: ScoringConfig::default(),
            ranking: RankingConfig::default(),
            evolution: EvolutionConfig::default(),
            worlds: vec![
                WorldConfig { size: 50, horizon: 1 },
                WorldConfig { size: 50, horizon: 3 },
                WorldConfig { size: 50, horizon: 5 },
            ],
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.market.validate()?;
        self.scoring.validate()?;
        self.ranking.validate()?;
        self.evolution.validate()?;

        if self.worlds.is_empty() {
            return Err(EngineError::Configuration(
                "At least one world must be configured".to_string()
            ));
        }
        for world in &self.worlds {
            world.validate()?;
            // the reference bar `horizon` publishes back must still be retained
            if world.horizon >= self.market.bars_in_memory as u64 {
                return Err(EngineError::Configuration(format!(
                    "Horizon {} does not fit in a bar log of {} entries",
                    world.horizon, self.market.bars_in_memory
                )));
            }
        }
        Ok(())
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, EngineError> {
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML/JSON file, layered with environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config = AppConfig::from_builder(Config::builder().add_source(File::from(path)))?;
        log::info!("Loaded configuration from {}", path.display());
        self.replace(config);
        Ok(())
    }

    /// Defaults overlaid with `EVOFORECAST_*` environment variables only.
    pub fn load_from_env(&self) -> Result<(), EngineError> {
        let config = AppConfig::from_builder(Config::builder())?;
        self.replace(config);
        Ok(())
    }

    /// Load configuration from an in-memory TOML document.
    pub fn load_from_str(&self, contents: &str) -> Result<(), EngineError> {
        let config = AppConfig::from_builder(
            Config::builder().add_source(File::from_str(contents, FileFormat::Toml)),
        )?;
        self.replace(config);
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to a copy and commit it only if the result validates.
    pub fn update<F>(&self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        candidate.validate()?;
        self.replace(candidate);
        Ok(())
    }

    fn replace(&self, config: AppConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}
