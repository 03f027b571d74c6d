use super::traits::ConfigSection;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Capacity of the shared bar log.
    pub bars_in_memory: usize,
    pub atr_period: usize,
    /// Multiplier applied to ATR% when deriving the volatility denominator.
    pub vol_norm_k: f64,
    /// Bars ingested before any world is evaluated.
    pub warm_up_bars: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            bars_in_memory: 1000,
            atr_period: 14,
            vol_norm_k: 1.0,
            warm_up_bars: 50,
        }
    }
}

impl ConfigSection for MarketConfig {
    fn section_name() -> &'static str {
        "market"
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.bars_in_memory == 0 {
            return Err(EngineError::Configuration(
                "bars_in_memory must be greater than zero".to_string()
            ));
        }
        if self.atr_period == 0 {
            return Err(EngineError::Configuration(
                "ATR period must be greater than zero".to_string()
            ));
        }
        if !self.vol_norm_k.is_finite() || self.vol_norm_k <= 0.0 {
            return Err(EngineError::Configuration(
                "vol_norm_k must be positive".to_string()
            ));
        }
        Ok(())
    }
}

/// One population: its gene count and forecast horizon in bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub size: usize,
    pub horizon: u64,
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.size == 0 {
            return Err(EngineError::Configuration(
                "World size must be at least 1".to_string()
            ));
        }
        if self.horizon == 0 {
            return Err(EngineError::Configuration(
                "Horizon must be at least 1 bar".to_string()
            ));
        }
        Ok(())
    }
}
