use super::traits::ConfigSection;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Settings shared by prediction issuance and maturation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Relative move below which a realized or predicted move counts as flat.
    pub dead_zone: f64,
    /// Divisor applied before squashing the blended signal through tanh.
    pub temperature: f64,
    /// Depth of each gene's pending-prediction log. Raised to the horizon
    /// when smaller.
    pub prediction_log_depth: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            dead_zone: 0.0005,
            temperature: 0.5,
            prediction_log_depth: 50,
        }
    }
}

impl ConfigSection for ScoringConfig {
    fn section_name() -> &'static str {
        "scoring"
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.dead_zone.is_finite() || self.dead_zone < 0.0 {
            return Err(EngineError::Configuration(
                "Dead zone must be a non-negative number".to_string()
            ));
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(EngineError::Configuration(
                "Temperature must be positive".to_string()
            ));
        }
        if self.prediction_log_depth == 0 {
            return Err(EngineError::Configuration(
                "Prediction log depth must be greater than zero".to_string()
            ));
        }
        Ok(())
    }
}

/// Weights of the two ranking terms. They need not sum to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub score_weight: f64,
    pub win_rate_weight: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            score_weight: 0.5,
            win_rate_weight: 0.5,
        }
    }
}

impl ConfigSection for RankingConfig {
    fn section_name() -> &'static str {
        "ranking"
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.score_weight.is_finite() || !self.win_rate_weight.is_finite() {
            return Err(EngineError::Configuration(
                "Ranking weights must be finite".to_string()
            ));
        }
        Ok(())
    }
}
