use super::accumulators::Accumulators;
use crate::config::{RankingConfig, ScoringConfig};
use crate::data::ring_log::CursorLapped;
use crate::engines::evaluation::{
    Gene, GeneReport, GeneStep, Maturation, Prediction, PredictionScorer,
};
use crate::engines::generation::{EvolutionScheduler, EvolutionSummary, Ranker};
use crate::error::{EngineError, Result};
use crate::functions::IndicatorSource;
use crate::types::{Bar, Direction};
use serde::Serialize;

/// A gene whose reader fell a full log behind on this bar.
#[derive(Debug, Clone, Serialize)]
pub struct GeneFault {
    pub gene: String,
    pub expected: u64,
    pub missed: u64,
}

impl GeneFault {
    fn new(gene: &str, lapped: CursorLapped) -> Self {
        Self {
            gene: gene.to_string(),
            expected: lapped.expected,
            missed: lapped.missed,
        }
    }
}

/// Result of evaluating one world on one bar.
#[derive(Debug, Clone, Serialize)]
pub struct BarOutcome {
    pub world_id: usize,
    pub horizon: u64,
    pub sequence: u64,
    pub reference_close: f64,
    pub denominator: f64,
    pub steps: Vec<GeneStep>,
    pub top_gene: Option<String>,
    pub arbitrator_issued: Prediction,
    pub arbitrator_matured: Option<Maturation>,
    pub faults: Vec<GeneFault>,
    pub accumulators: Accumulators,
}

impl BarOutcome {
    pub fn direction(&self) -> Direction {
        self.arbitrator_issued.direction
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldReport {
    pub id: usize,
    pub horizon: u64,
    pub bars_evaluated: u64,
    pub lapped_reads: u64,
    pub accumulators: Accumulators,
    pub arbitrator: GeneReport,
    /// Candidates in last-ranked order.
    pub genes: Vec<GeneReport>,
}

/// One population sharing a forecast horizon, plus its arbitrator.
///
/// Members are stored in one vector whose last element is always the
/// arbitrator.
#[derive(Debug)]
pub struct World {
    id: usize,
    horizon: u64,
    log_depth: usize,
    members: Vec<Gene>,
    ranking: Vec<usize>,
    accumulators: Accumulators,
    bars_evaluated: u64,
    lapped_reads: u64,
}

impl World {
    /// Prediction log depth used for every gene of a world with `horizon`.
    pub fn log_depth(scoring: &ScoringConfig, horizon: u64) -> usize {
        scoring.prediction_log_depth.max(horizon as usize)
    }

    pub fn new(id: usize, horizon: u64, genes: Vec<Gene>, scoring: &ScoringConfig) -> Result<Self> {
        if horizon == 0 {
            return Err(EngineError::Configuration(format!(
                "World {}: horizon must be at least 1 bar",
                id
            )));
        }
        if genes.iter().any(Gene::is_arbitrator) {
            return Err(EngineError::Configuration(format!(
                "World {}: candidate genes must not include an arbitrator",
                id
            )));
        }
        if let Some(gene) = genes
            .iter()
            .find(|g| (g.predictions().capacity() as u64) < horizon)
        {
            return Err(EngineError::Configuration(format!(
                "World {}: gene {} keeps {} predictions but horizon is {}",
                id,
                gene.name(),
                gene.predictions().capacity(),
                horizon
            )));
        }

        let log_depth = Self::log_depth(scoring, horizon);
        let mut members = genes;
        members.push(Gene::arbitrator(log_depth)?);

        Ok(Self {
            id,
            horizon,
            log_depth,
            members,
            ranking: Vec::new(),
            accumulators: Accumulators::default(),
            bars_evaluated: 0,
            lapped_reads: 0,
        })
    }

    /// World seeded with `size` random genes.
    pub fn seeded(
        id: usize,
        size: usize,
        horizon: u64,
        scoring: &ScoringConfig,
        scheduler: &mut EvolutionScheduler,
    ) -> Result<Self> {
        let genes = scheduler.seed_population(id, size, Self::log_depth(scoring, horizon))?;
        Self::new(id, horizon, genes, scoring)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// Candidate genes, arbitrator excluded.
    pub fn genes(&self) -> &[Gene] {
        match self.members.split_last() {
            Some((_, genes)) => genes,
            None => &[],
        }
    }

    pub fn arbitrator(&self) -> Option<&Gene> {
        self.members.last()
    }

    /// Arbitrator included; always `genes().len() + 1`.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Candidate indices from the last evaluation, best first.
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    pub fn top_gene(&self) -> Option<&Gene> {
        self.ranking.first().and_then(|&i| self.genes().get(i))
    }

    pub fn accumulators(&self) -> &Accumulators {
        &self.accumulators
    }

    pub fn bars_evaluated(&self) -> u64 {
        self.bars_evaluated
    }

    /// Latest call of the arbitrator.
    pub fn direction(&self) -> Direction {
        self.arbitrator()
            .and_then(Gene::latest_prediction)
            .map_or(Direction::Flat, |prediction| prediction.direction)
    }

    /// Score due predictions, issue new ones, re-rank and let the arbitrator
    /// follow the leader.
    pub fn evaluate(
        &mut self,
        bar: &Bar,
        reference_close: f64,
        indicators: &dyn IndicatorSource,
        denominator: f64,
        scoring: &ScoringConfig,
        ranking: &RankingConfig,
    ) -> Result<BarOutcome> {
        let id = self.id;
        let scorer = PredictionScorer::new(scoring, self.horizon);
        let (arbitrator, genes) = self
            .members
            .split_last_mut()
            .ok_or_else(|| EngineError::Evolution(format!("World {} has no arbitrator", id)))?;

        let mut faults = Vec::new();
        let mut steps = Vec::with_capacity(genes.len());
        for gene in genes.iter_mut() {
            let step = scorer.step(gene, bar, reference_close, indicators, denominator);
            gene.mark_survived();
            if let Some(lapped) = step.fault {
                faults.push(GeneFault::new(gene.name(), lapped));
            }
            steps.push(step);
        }

        let genes: &[Gene] = genes;
        self.ranking = Ranker::new(ranking).rank(genes);
        let top = self.ranking.first().map(|&i| &genes[i]);
        let source = top.and_then(Gene::latest_prediction);
        let top_gene = top.map(|gene| gene.name().to_string());
        if let Some(top) = top {
            arbitrator.set_indicators(top.indicators().to_vec(), top.weights().to_vec());
        }

        let (arbitrator_matured, lapped) = scorer.mature_or_resync(arbitrator, bar, reference_close);
        if let Some(lapped) = lapped {
            faults.push(GeneFault::new(arbitrator.name(), lapped));
        }
        let arbitrator_issued = scorer.mirror(arbitrator, bar, source.as_ref());
        arbitrator.mark_survived();

        self.accumulators = Accumulators::from_arbitrator(arbitrator);
        self.bars_evaluated += 1;
        self.lapped_reads += faults.len() as u64;

        log::trace!(
            "World {} bar {}: top {:?}, arbitrator {}",
            id,
            bar.sequence,
            top_gene,
            arbitrator_issued.direction.label()
        );

        Ok(BarOutcome {
            world_id: id,
            horizon: self.horizon,
            sequence: bar.sequence,
            reference_close,
            denominator,
            steps,
            top_gene,
            arbitrator_issued,
            arbitrator_matured,
            faults,
            accumulators: self.accumulators,
        })
    }

    /// Rank and replace the weaker genes. Population size is unchanged.
    pub fn evolve(
        &mut self,
        scheduler: &mut EvolutionScheduler,
        ranking: &RankingConfig,
    ) -> Result<EvolutionSummary> {
        let mut members = std::mem::take(&mut self.members);
        let arbitrator = members
            .pop()
            .ok_or_else(|| EngineError::Evolution(format!("World {} has no arbitrator", self.id)))?;

        let ranked = Ranker::new(ranking).sort(members);
        let (next, summary) = scheduler.evolve(self.id, ranked, arbitrator, self.log_depth)?;
        self.members = next;
        // rankings refer to the previous population
        self.ranking.clear();
        Ok(summary)
    }

    pub fn report(&self) -> WorldReport {
        let genes = self.genes();
        let mut order: Vec<usize> = self.ranking.clone();
        if order.len() != genes.len() {
            order = (0..genes.len()).collect();
        }

        WorldReport {
            id: self.id,
            horizon: self.horizon,
            bars_evaluated: self.bars_evaluated,
            lapped_reads: self.lapped_reads,
            accumulators: self.accumulators,
            arbitrator: self
                .arbitrator()
                .map(Gene::report)
                .unwrap_or_else(empty_report),
            genes: order.into_iter().filter_map(|i| genes.get(i)).map(Gene::report).collect(),
        }
    }
}

fn empty_report() -> GeneReport {
    GeneReport {
        name: String::new(),
        role: crate::engines::evaluation::GeneRole::Arbitrator,
        indicators: Vec::new(),
        bars_survived: 0,
        stats: Default::default(),
        win_rate: 0.0,
        last_signal: 0.0,
        pending: 0,
        latest_prediction: None,
        last_matured: None,
    }
}
