use crate::config::{ConfigSection, EvolutionConfig};
use crate::engines::evaluation::Gene;
use crate::engines::generation::{
    genome::Genome,
    operators::{mutate, pick_parents, random_genome, uniform_crossover},
};
use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// What happens to the gene at one ranked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotAction {
    Elite,
    /// Too young to be judged; kept as is.
    Protected,
    Fresh,
    Offspring,
}

/// Slot assignment for one ranked population, best first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan {
    pub slots: Vec<SlotAction>,
}

impl SelectionPlan {
    pub fn count(&self, action: SlotAction) -> usize {
        self.slots.iter().filter(|&&slot| slot == action).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvolutionSummary {
    pub world_id: usize,
    pub generation: u64,
    pub elites: usize,
    pub protected: usize,
    pub fresh: usize,
    pub offspring: usize,
    /// Population size including the arbitrator.
    pub size: usize,
}

/// Replaces the weaker part of a ranked population: elites and young genes
/// stay, the lowest-ranked of the rest become random genes and the others
/// are bred from elite parents.
pub struct EvolutionScheduler {
    config: EvolutionConfig,
    indicator_count: usize,
    serial: u64,
    generation: u64,
    rng: StdRng,
}

impl EvolutionScheduler {
    pub fn new(config: EvolutionConfig, indicator_count: usize) -> Result<Self> {
        config.validate()?;
        if indicator_count == 0 {
            return Err(EngineError::Configuration(
                "Indicator catalog is empty".to_string()
            ));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            indicator_count,
            serial: 0,
            generation: 0,
            rng,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn indicator_count(&self) -> usize {
        self.indicator_count
    }

    /// World evolutions performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `size` random genes for a new world.
    pub fn seed_population(&mut self, world_id: usize, size: usize, log_depth: usize) -> Result<Vec<Gene>> {
        (0..size)
            .map(|_| {
                let genome = random_genome(self.config.genome_length, self.indicator_count, &mut self.rng);
                self.spawn(world_id, genome, log_depth)
            })
            .collect()
    }

    /// Slot assignment for a population already sorted best first.
    pub fn plan(&self, ranked: &[Gene]) -> SelectionPlan {
        let n = ranked.len();
        let elites = ((n as f64 * self.config.elite_pct).round() as usize).min(n);
        let fresh_target = (n as f64 * self.config.generate_new_pct).round() as usize;

        let mut slots: Vec<SlotAction> = ranked
            .iter()
            .enumerate()
            .map(|(i, gene)| {
                if i < elites {
                    SlotAction::Elite
                } else if gene.bars_survived() < self.config.min_bars_before_replacing {
                    SlotAction::Protected
                } else {
                    SlotAction::Offspring
                }
            })
            .collect();

        // fresh genes take the lowest-ranked replaceable slots
        let mut fresh = 0;
        for slot in slots.iter_mut().rev() {
            if fresh == fresh_target {
                break;
            }
            if *slot == SlotAction::Offspring {
                *slot = SlotAction::Fresh;
                fresh += 1;
            }
        }

        SelectionPlan { slots }
    }

    /// Next generation of `ranked` (best first, arbitrator excluded). The
    /// arbitrator is re-appended last, unchanged.
    pub fn evolve(
        &mut self,
        world_id: usize,
        ranked: Vec<Gene>,
        arbitrator: Gene,
        log_depth: usize,
    ) -> Result<(Vec<Gene>, EvolutionSummary)> {
        if !arbitrator.is_arbitrator() || ranked.iter().any(Gene::is_arbitrator) {
            return Err(EngineError::Evolution(format!(
                "World {}: arbitrator must be passed separately from the ranked genes",
                world_id
            )));
        }

        let n = ranked.len();
        let plan = self.plan(&ranked);
        let elites = plan.count(SlotAction::Elite);
        let parents: Vec<Genome> = ranked
            .iter()
            .take(elites.max(1))
            .map(|gene| gene.indicators().to_vec())
            .collect();

        let mut brood: Vec<Genome> = Vec::new();
        let mut next = Vec::with_capacity(n + 1);
        for (gene, action) in ranked.into_iter().zip(&plan.slots) {
            match action {
                SlotAction::Elite | SlotAction::Protected => next.push(gene),
                SlotAction::Fresh => {
                    let genome = random_genome(self.config.genome_length, self.indicator_count, &mut self.rng);
                    next.push(self.spawn(world_id, genome, log_depth)?);
                }
                SlotAction::Offspring => {
                    if brood.is_empty() {
                        brood = self.breed(&parents);
                    }
                    let genome = brood.pop().unwrap_or_default();
                    next.push(self.spawn(world_id, genome, log_depth)?);
                }
            }
        }
        next.push(arbitrator);

        if next.len() != n + 1 {
            return Err(EngineError::Evolution(format!(
                "World {}: evolution produced {} genes, expected {}",
                world_id,
                next.len(),
                n + 1
            )));
        }

        self.generation += 1;
        let summary = EvolutionSummary {
            world_id,
            generation: self.generation,
            elites,
            protected: plan.count(SlotAction::Protected),
            fresh: plan.count(SlotAction::Fresh),
            offspring: plan.count(SlotAction::Offspring),
            size: next.len(),
        };
        log::debug!(
            "World {} evolved: {} elites, {} protected, {} fresh, {} offspring",
            world_id,
            summary.elites,
            summary.protected,
            summary.fresh,
            summary.offspring
        );

        Ok((next, summary))
    }

    /// Two mutated children of two random parents.
    fn breed(&mut self, parents: &[Genome]) -> Vec<Genome> {
        if parents.is_empty() {
            return vec![random_genome(self.config.genome_length, self.indicator_count, &mut self.rng)];
        }

        let (a, b) = pick_parents(parents.len(), &mut self.rng);
        let (mut child1, mut child2) = uniform_crossover(&parents[a], &parents[b], &mut self.rng);
        mutate(&mut child1, self.config.mutation_rate, self.indicator_count, &mut self.rng);
        mutate(&mut child2, self.config.mutation_rate, self.indicator_count, &mut self.rng);
        vec![child2, child1]
    }

    fn spawn(&mut self, world_id: usize, genome: Genome, log_depth: usize) -> Result<Gene> {
        self.serial += 1;
        Gene::new(format!("w{}-g{:05}", world_id, self.serial), genome, log_depth)
    }
}
