use crate::engines::generation::EvolutionSummary;
use crate::engines::world::{Accumulators, BarOutcome, GeneFault};
use crate::types::Direction;

/// Receives engine events as bars are processed.
pub trait EngineObserver: Send {
    fn on_bar_evaluated(&mut self, outcome: &BarOutcome);
    fn on_evolution_complete(&mut self, summary: &EvolutionSummary);
    fn on_gene_fault(&mut self, _world_id: usize, _fault: &GeneFault) {}
    fn on_consolidated(&mut self, _sequence: u64, _direction: i32) {}
}

/// Logs a world summary every `every` evaluated bars.
pub struct LoggingObserver {
    every: u64,
}

impl LoggingObserver {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EngineObserver for LoggingObserver {
    fn on_bar_evaluated(&mut self, outcome: &BarOutcome) {
        let acc = &outcome.accumulators;
        if acc.records % self.every == 0 {
            log::info!(
                "World {} (h={}) bar {}: {} records, match {:.1}%, flat {:.1}%, error {:.1}%, top {}",
                outcome.world_id,
                outcome.horizon,
                outcome.sequence,
                acc.records,
                acc.match_pct(),
                acc.flat_pct(),
                acc.error_pct(),
                outcome.top_gene.as_deref().unwrap_or("-")
            );
        }
    }

    fn on_evolution_complete(&mut self, summary: &EvolutionSummary) {
        log::info!(
            "World {} evolved (generation {}): {} elites, {} protected, {} fresh, {} offspring",
            summary.world_id,
            summary.generation,
            summary.elites,
            summary.protected,
            summary.fresh,
            summary.offspring
        );
    }

    fn on_gene_fault(&mut self, world_id: usize, fault: &GeneFault) {
        log::warn!(
            "World {}: {} lost {} predictions",
            world_id,
            fault.gene,
            fault.missed
        );
    }
}

// For handing events to another thread
pub struct ChannelObserver {
    sender: std::sync::mpsc::Sender<EngineEvent>,
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    BarEvaluated {
        world_id: usize,
        sequence: u64,
        direction: Direction,
        accumulators: Accumulators,
    },
    EvolutionComplete(EvolutionSummary),
    GeneFault { world_id: usize, fault: GeneFault },
    Consolidated { sequence: u64, direction: i32 },
}

impl ChannelObserver {
    pub fn new(sender: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { sender }
    }
}

impl EngineObserver for ChannelObserver {
    fn on_bar_evaluated(&mut self, outcome: &BarOutcome) {
        let _ = self.sender.send(EngineEvent::BarEvaluated {
            world_id: outcome.world_id,
            sequence: outcome.sequence,
            direction: outcome.direction(),
            accumulators: outcome.accumulators,
        });
    }

    fn on_evolution_complete(&mut self, summary: &EvolutionSummary) {
        let _ = self.sender.send(EngineEvent::EvolutionComplete(summary.clone()));
    }

    fn on_gene_fault(&mut self, world_id: usize, fault: &GeneFault) {
        let _ = self.sender.send(EngineEvent::GeneFault {
            world_id,
            fault: fault.clone(),
        });
    }

    fn on_consolidated(&mut self, sequence: u64, direction: i32) {
        let _ = self.sender.send(EngineEvent::Consolidated { sequence, direction });
    }
}
