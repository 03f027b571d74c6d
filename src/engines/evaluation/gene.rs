use super::prediction::Prediction;
use crate::data::ring_log::{Cursor, CursorLapped, SequencedRingLog};
use crate::error::{EngineError, Result};
use crate::functions::{IndicatorSource, SIGNAL_MAX_ABS};
use crate::types::Direction;
use serde::{Deserialize, Serialize};

pub const ARBITRATOR_NAME: &str = "arbitrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneRole {
    Candidate,
    /// Mirrors the current top-ranked gene of its world. Never ranked or
    /// replaced by evolution.
    Arbitrator,
}

/// Running outcome counters of one gene. Only ever increase, except
/// `total_score` which is a signed sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneStats {
    pub total_score: f64,
    pub total_win: u64,
    pub long_win: u64,
    pub short_win: u64,
    pub total_long: u64,
    pub total_short: u64,
}

impl GeneStats {
    /// Directional predictions that matured against a directional market.
    pub fn bets(&self) -> u64 {
        self.total_long + self.total_short
    }

    pub fn win_rate(&self) -> f64 {
        match self.bets() {
            0 => 0.0,
            bets => self.total_win as f64 / bets as f64,
        }
    }

    /// Fold in one matured prediction. A zero agreement (flat prediction or
    /// flat market) only moves `total_score`, which it leaves unchanged.
    pub fn record(&mut self, direction: Direction, agreement: i32, score: f64) {
        self.total_score += score;
        if agreement == 0 {
            return;
        }

        match direction {
            Direction::Long => self.total_long += 1,
            Direction::Short => self.total_short += 1,
            Direction::Flat => {}
        }

        if agreement > 0 {
            self.total_win += 1;
            match direction {
                Direction::Long => self.long_win += 1,
                Direction::Short => self.short_win += 1,
                Direction::Flat => {}
            }
        }
    }
}

/// Weighted subset of the indicator catalog plus its own pending-prediction
/// log.
#[derive(Debug)]
pub struct Gene {
    name: String,
    role: GeneRole,
    indicators: Vec<usize>,
    weights: Vec<f64>,
    stats: GeneStats,
    bars_survived: u64,
    last_signal: f64,
    last_matured: Option<Prediction>,
    predictions: SequencedRingLog<Prediction>,
    reader: Cursor,
}

impl Gene {
    /// Gene with unit weights. `log_depth` must cover the world's horizon.
    pub fn new(name: impl Into<String>, indicators: Vec<usize>, log_depth: usize) -> Result<Self> {
        let weights = vec![1.0; indicators.len()];
        Self::with_weights(name, indicators, weights, log_depth)
    }

    pub fn with_weights(
        name: impl Into<String>,
        indicators: Vec<usize>,
        weights: Vec<f64>,
        log_depth: usize,
    ) -> Result<Self> {
        Self::build(name.into(), GeneRole::Candidate, indicators, weights, log_depth)
    }

    pub fn arbitrator(log_depth: usize) -> Result<Self> {
        Self::build(
            ARBITRATOR_NAME.to_string(),
            GeneRole::Arbitrator,
            Vec::new(),
            Vec::new(),
            log_depth,
        )
    }

    fn build(
        name: String,
        role: GeneRole,
        indicators: Vec<usize>,
        weights: Vec<f64>,
        log_depth: usize,
    ) -> Result<Self> {
        if indicators.len() != weights.len() {
            return Err(EngineError::Configuration(format!(
                "Gene {} has {} indicators but {} weights",
                name,
                indicators.len(),
                weights.len()
            )));
        }

        let predictions = SequencedRingLog::new(log_depth)?;
        let reader = predictions.cursor_from_start();
        Ok(Self {
            name,
            role,
            indicators,
            weights,
            stats: GeneStats::default(),
            bars_survived: 0,
            last_signal: 0.0,
            last_matured: None,
            predictions,
            reader,
        })
    }

    /// Start with the given counters and age instead of a blank record.
    pub fn with_history(mut self, stats: GeneStats, bars_survived: u64) -> Self {
        self.stats = stats;
        self.bars_survived = bars_survived;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> GeneRole {
        self.role
    }

    pub fn is_arbitrator(&self) -> bool {
        self.role == GeneRole::Arbitrator
    }

    pub fn indicators(&self) -> &[usize] {
        &self.indicators
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn stats(&self) -> &GeneStats {
        &self.stats
    }

    pub fn bars_survived(&self) -> u64 {
        self.bars_survived
    }

    pub fn last_signal(&self) -> f64 {
        self.last_signal
    }

    pub fn last_matured(&self) -> Option<&Prediction> {
        self.last_matured.as_ref()
    }

    pub fn predictions(&self) -> &SequencedRingLog<Prediction> {
        &self.predictions
    }

    /// Issued predictions not yet matured.
    pub fn pending(&self) -> u64 {
        self.predictions.pending(&self.reader)
    }

    pub fn latest_prediction(&self) -> Option<Prediction> {
        self.predictions.latest().map(|entry| entry.value)
    }

    /// Blend of the selected readings: `sum(w_i * x_i / 50) / max(1, n)`.
    /// Readings are in [-50, 50], so the result lies in [-max|w|, max|w|].
    pub fn signal(&mut self, source: &dyn IndicatorSource) -> f64 {
        let weighted: f64 = self
            .indicators
            .iter()
            .zip(&self.weights)
            .map(|(&id, &w)| w * source.normalized(id) / SIGNAL_MAX_ABS)
            .sum();
        self.last_signal = weighted / self.indicators.len().max(1) as f64;
        self.last_signal
    }

    /// Take over another gene's indicator selection.
    pub fn set_indicators(&mut self, indicators: Vec<usize>, weights: Vec<f64>) {
        if indicators.len() == weights.len() {
            self.indicators = indicators;
            self.weights = weights;
        }
    }

    pub(crate) fn mark_survived(&mut self) {
        self.bars_survived += 1;
    }

    /// The oldest pending prediction, once `horizon` publishes have passed
    /// since it was issued.
    pub(crate) fn pop_due(&mut self, horizon: u64) -> std::result::Result<Option<Prediction>, CursorLapped> {
        if self.predictions.pending(&self.reader) < horizon {
            return Ok(None);
        }
        Ok(self.predictions.poll(&mut self.reader)?.map(|entry| entry.value))
    }

    pub(crate) fn publish(&mut self, prediction: Prediction) -> u64 {
        self.predictions.publish(prediction)
    }

    pub(crate) fn settle(&mut self, prediction: &Prediction, agreement: i32) {
        self.stats.record(prediction.direction, agreement, prediction.score);
        self.last_matured = Some(prediction.clone());
    }

    /// Jump the reader to the oldest retained prediction; returns how many
    /// were lost.
    pub(crate) fn resync(&mut self) -> u64 {
        self.predictions.resync(&mut self.reader)
    }

    pub fn report(&self) -> GeneReport {
        GeneReport {
            name: self.name.clone(),
            role: self.role,
            indicators: self.indicators.clone(),
            bars_survived: self.bars_survived,
            stats: self.stats,
            win_rate: self.stats.win_rate(),
            last_signal: self.last_signal,
            pending: self.pending(),
            latest_prediction: self.latest_prediction(),
            last_matured: self.last_matured.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneReport {
    pub name: String,
    pub role: GeneRole,
    pub indicators: Vec<usize>,
    pub bars_survived: u64,
    pub stats: GeneStats,
    pub win_rate: f64,
    pub last_signal: f64,
    pub pending: u64,
    pub latest_prediction: Option<Prediction>,
    pub last_matured: Option<Prediction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_is_weighted_mean() {
        let mut gene = Gene::with_weights("g", vec![0, 2], vec![1.0, 0.5], 4).unwrap();
        let readings = vec![50.0, -10.0, -50.0];
        // (1.0 * 1.0 + 0.5 * -1.0) / 2
        let signal = gene.signal(&readings);
        assert!((signal - 0.25).abs() < 1e-12);
        assert_eq!(gene.last_signal(), signal);
    }

    #[test]
    fn test_empty_gene_has_zero_signal() {
        let mut gene = Gene::arbitrator(4).unwrap();
        assert_eq!(gene.signal(&vec![50.0]), 0.0);
        assert!(gene.is_arbitrator());
    }

    #[test]
    fn test_mismatched_weights_rejected() {
        assert!(Gene::with_weights("g", vec![0, 1], vec![1.0], 4).is_err());
        assert!(Gene::new("g", vec![0], 0).is_err());
    }

    #[test]
    fn test_stats_record() {
        let mut stats = GeneStats::default();
        stats.record(Direction::Long, 1, 2.0);
        stats.record(Direction::Short, -1, -1.0);
        stats.record(Direction::Flat, 0, 0.0);
        stats.record(Direction::Long, 0, 0.0);

        assert_eq!(stats.total_long, 1);
        assert_eq!(stats.total_short, 1);
        assert_eq!(stats.total_win, 1);
        assert_eq!(stats.long_win, 1);
        assert_eq!(stats.short_win, 0);
        assert_eq!(stats.total_score, 1.0);
        assert_eq!(stats.win_rate(), 0.5);
    }
}
