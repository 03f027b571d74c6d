use super::progress::EngineObserver;
use crate::config::AppConfig;
use crate::data::ring_log::SequencedRingLog;
use crate::engines::generation::{EvolutionScheduler, EvolutionSummary};
use crate::engines::world::{BarOutcome, World, WorldReport};
use crate::error::Result;
use crate::functions::{volatility_denominator, Atr, IndicatorSource};
use crate::types::Bar;
use serde::Serialize;
use std::sync::Arc;

/// What one `ingest` call did.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStep {
    pub sequence: u64,
    pub atr: Option<f64>,
    pub outcomes: Vec<BarOutcome>,
    /// Sum of arbitrator directions over the worlds evaluated on this bar.
    pub consolidated: Option<i32>,
    pub evolutions: Vec<EvolutionSummary>,
}

impl EngineStep {
    fn skipped(sequence: u64, atr: Option<f64>) -> Self {
        Self {
            sequence,
            atr,
            outcomes: Vec::new(),
            consolidated: None,
            evolutions: Vec::new(),
        }
    }

    pub fn evaluated(&self) -> bool {
        !self.outcomes.is_empty()
    }
}

/// Feeds bars to every world and evolves them on a fixed cadence.
///
/// The bar log is shared: other threads may hold the `Arc` from
/// [`ForecastEngine::bars`] and read it with their own cursors while the
/// engine keeps publishing.
pub struct ForecastEngine {
    config: AppConfig,
    bars: Arc<SequencedRingLog<Bar>>,
    atr: Atr,
    worlds: Vec<World>,
    scheduler: EvolutionScheduler,
    observers: Vec<Box<dyn EngineObserver>>,
    bars_since_evolution: u64,
    evolutions: u64,
}

impl ForecastEngine {
    /// `indicator_count` is the size of the catalog genes draw from.
    pub fn new(config: AppConfig, indicator_count: usize) -> Result<Self> {
        config.validate()?;

        let bars = Arc::new(SequencedRingLog::new(config.market.bars_in_memory)?);
        let mut scheduler = EvolutionScheduler::new(config.evolution.clone(), indicator_count)?;
        let worlds = config
            .worlds
            .iter()
            .enumerate()
            .map(|(id, world)| World::seeded(id, world.size, world.horizon, &config.scoring, &mut scheduler))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Engine ready: {} worlds, {} indicators, bar log of {}",
            worlds.len(),
            indicator_count,
            config.market.bars_in_memory
        );

        Ok(Self {
            atr: Atr::new(config.market.atr_period)?,
            config,
            bars,
            worlds,
            scheduler,
            observers: Vec::new(),
            bars_since_evolution: 0,
            evolutions: 0,
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn bars(&self) -> Arc<SequencedRingLog<Bar>> {
        Arc::clone(&self.bars)
    }

    pub fn worlds(&self) -> &[World] {
        &self.worlds
    }

    pub fn atr(&self) -> Option<f64> {
        self.atr.value()
    }

    /// Evolution passes run so far.
    pub fn evolutions(&self) -> u64 {
        self.evolutions
    }

    /// Publish `bar` and evaluate every world whose reference bar is known.
    ///
    /// The bar's sequence is overwritten with the log's next sequence. The
    /// first bar and the warm-up window only feed the log and the ATR.
    pub fn ingest(&mut self, bar: Bar, indicators: &dyn IndicatorSource) -> Result<EngineStep> {
        let sequence = self.bars.publish_with(|sequence| Bar { sequence, ..bar });
        let bar = Bar { sequence, ..bar };
        let atr = self.atr.update(&bar);

        if sequence == 0 || sequence < self.config.market.warm_up_bars {
            return Ok(EngineStep::skipped(sequence, atr));
        }

        let mut outcomes = Vec::with_capacity(self.worlds.len());
        for world in &mut self.worlds {
            let horizon = world.horizon();
            if sequence < horizon {
                continue;
            }

            let reference = match self.bars.get(sequence - horizon) {
                Some(entry) if entry.sequence == sequence - horizon => entry.value,
                _ => {
                    log::warn!(
                        "World {}: reference bar {} no longer retained",
                        world.id(),
                        sequence - horizon
                    );
                    continue;
                }
            };

            let denominator = volatility_denominator(atr, reference.close, self.config.market.vol_norm_k);
            let outcome = world.evaluate(
                &bar,
                reference.close,
                indicators,
                denominator,
                &self.config.scoring,
                &self.config.ranking,
            )?;

            for observer in &mut self.observers {
                for fault in &outcome.faults {
                    observer.on_gene_fault(outcome.world_id, fault);
                }
                observer.on_bar_evaluated(&outcome);
            }
            outcomes.push(outcome);
        }

        let consolidated = if outcomes.is_empty() {
            None
        } else {
            let direction: i32 = outcomes.iter().map(|o| o.direction().as_i32()).sum();
            for observer in &mut self.observers {
                observer.on_consolidated(sequence, direction);
            }
            Some(direction)
        };

        let mut evolutions = Vec::new();
        if !outcomes.is_empty() {
            self.bars_since_evolution += 1;
            if self.bars_since_evolution >= self.config.evolution.evolve_every_bars {
                evolutions = self.evolve()?;
            }
        }

        Ok(EngineStep {
            sequence,
            atr,
            outcomes,
            consolidated,
            evolutions,
        })
    }

    /// Evolve every world now, between two bars.
    pub fn evolve(&mut self) -> Result<Vec<EvolutionSummary>> {
        let mut summaries = Vec::with_capacity(self.worlds.len());
        for world in &mut self.worlds {
            let summary = world.evolve(&mut self.scheduler, &self.config.ranking)?;
            for observer in &mut self.observers {
                observer.on_evolution_complete(&summary);
            }
            summaries.push(summary);
        }

        self.bars_since_evolution = 0;
        self.evolutions += 1;
        Ok(summaries)
    }

    pub fn reports(&self) -> Vec<WorldReport> {
        self.worlds.iter().map(World::report).collect()
    }
}
