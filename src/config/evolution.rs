use super::traits::{check_fraction, ConfigSection};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Share of the ranked population copied unchanged.
    pub elite_pct: f64,
    /// Share of the population replaced by brand-new random genes.
    pub generate_new_pct: f64,
    /// Per-locus probability of drawing a fresh indicator index.
    pub mutation_rate: f64,
    /// Genes younger than this survive evolution untouched.
    pub min_bars_before_replacing: u64,
    /// Indicators per freshly generated gene.
    pub genome_length: usize,
    /// Evaluated bars between two evolution passes.
    pub evolve_every_bars: u64,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            elite_pct: 0.25,
            generate_new_pct: 0.25,
            mutation_rate: 0.08,
            min_bars_before_replacing: 50,
            genome_length: 5,
            evolve_every_bars: 500,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EngineError> {
        check_fraction(Self::section_name(), "elite_pct", self.elite_pct)?;
        check_fraction(Self::section_name(), "generate_new_pct", self.generate_new_pct)?;
        check_fraction(Self::section_name(), "mutation_rate", self.mutation_rate)?;
        if self.elite_pct + self.generate_new_pct > 1.0 {
            return Err(EngineError::Configuration(
                "elite_pct + generate_new_pct must not exceed 1".to_string()
            ));
        }
        if self.genome_length == 0 {
            return Err(EngineError::Configuration(
                "Genome length must be at least 1".to_string()
            ));
        }
        if self.evolve_every_bars == 0 {
            return Err(EngineError::Configuration(
                "evolve_every_bars must be at least 1".to_string()
            ));
        }
        Ok(())
    }
}
