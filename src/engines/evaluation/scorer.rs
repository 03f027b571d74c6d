use super::gene::Gene;
use super::prediction::Prediction;
use crate::config::ScoringConfig;
use crate::data::ring_log::CursorLapped;
use crate::functions::IndicatorSource;
use crate::types::{realized_direction, Bar, Direction, EPSILON};
use serde::Serialize;

/// A matured prediction's score never exceeds this share of the close.
pub const SCORE_CAP_FRACTION: f64 = 0.05;

/// A prediction scored against the bar it targeted.
#[derive(Debug, Clone, Serialize)]
pub struct Maturation {
    pub prediction: Prediction,
    pub realized: Direction,
    /// `realized * predicted`, in {-1, 0, 1}.
    pub agreement: i32,
}

/// Everything one gene did on one bar.
#[derive(Debug, Clone, Serialize)]
pub struct GeneStep {
    pub gene: String,
    pub signal: f64,
    pub issued: Prediction,
    pub matured: Option<Maturation>,
    #[serde(skip)]
    pub fault: Option<CursorLapped>,
}

/// Issues forecasts and scores them once they come due, for one horizon.
pub struct PredictionScorer<'a> {
    config: &'a ScoringConfig,
    horizon: u64,
}

impl<'a> PredictionScorer<'a> {
    pub fn new(config: &'a ScoringConfig, horizon: u64) -> Self {
        Self { config, horizon }
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// `tanh(signal / temperature)`.
    pub fn forecast(&self, signal: f64) -> f64 {
        (signal / self.config.temperature.max(EPSILON)).tanh()
    }

    /// Agreement and score of `prediction` against the realized move.
    pub fn score(&self, prediction: &Prediction, close: f64, realized: Direction) -> (i32, f64) {
        let agreement = realized.as_i32() * prediction.direction.as_i32();
        let distance = (prediction.predicted_price - close).abs();
        let magnitude = (close * SCORE_CAP_FRACTION).min(1.0 / (distance + EPSILON));
        (agreement, magnitude * agreement as f64)
    }

    /// Score the gene's oldest pending prediction if it is due on `bar`.
    pub fn mature(
        &self,
        gene: &mut Gene,
        bar: &Bar,
        reference_close: f64,
    ) -> Result<Option<Maturation>, CursorLapped> {
        let Some(mut prediction) = gene.pop_due(self.horizon)? else {
            return Ok(None);
        };

        if prediction.target_sequence != bar.sequence {
            log::warn!(
                "{}: prediction targeting bar {} matured on bar {}",
                gene.name(),
                prediction.target_sequence,
                bar.sequence
            );
        }

        let realized = realized_direction(reference_close, bar.close, self.config.dead_zone);
        let (agreement, score) = self.score(&prediction, bar.close, realized);
        prediction.score = score;
        prediction.successful = agreement > 0;
        gene.settle(&prediction, agreement);

        Ok(Some(Maturation {
            prediction,
            realized,
            agreement,
        }))
    }

    /// Turn `signal` into a price forecast `horizon` bars ahead and publish
    /// it to the gene's log.
    pub fn issue(&self, gene: &mut Gene, bar: &Bar, signal: f64, denominator: f64) -> Prediction {
        let forecast = self.forecast(signal);
        let predicted_return = forecast * denominator.max(EPSILON);
        let predicted_price = bar.close * (1.0 + predicted_return);
        let direction = if predicted_return.abs() < self.config.dead_zone {
            Direction::Flat
        } else {
            Direction::from_sign(forecast)
        };

        let prediction = Prediction::issue(
            gene.name(),
            bar,
            self.horizon,
            forecast,
            predicted_price,
            direction,
        );
        gene.publish(prediction.clone());
        prediction
    }

    /// Publish a copy of `source` (or a flat call when there is none) under
    /// the gene's name.
    pub fn mirror(&self, gene: &mut Gene, bar: &Bar, source: Option<&Prediction>) -> Prediction {
        let prediction = match source {
            Some(source) => Prediction::mirror(source, gene.name(), bar, self.horizon),
            None => Prediction::flat(gene.name(), bar, self.horizon),
        };
        gene.publish(prediction.clone());
        prediction
    }

    /// Mature then issue. A lapped reader loses the overdue predictions but
    /// the gene still forecasts on this bar.
    pub fn step(
        &self,
        gene: &mut Gene,
        bar: &Bar,
        reference_close: f64,
        indicators: &dyn IndicatorSource,
        denominator: f64,
    ) -> GeneStep {
        let (matured, fault) = self.mature_or_resync(gene, bar, reference_close);
        let signal = gene.signal(indicators);
        let issued = self.issue(gene, bar, signal, denominator);

        GeneStep {
            gene: gene.name().to_string(),
            signal,
            issued,
            matured,
            fault,
        }
    }

    pub(crate) fn mature_or_resync(
        &self,
        gene: &mut Gene,
        bar: &Bar,
        reference_close: f64,
    ) -> (Option<Maturation>, Option<CursorLapped>) {
        match self.mature(gene, bar, reference_close) {
            Ok(matured) => (matured, None),
            Err(lapped) => {
                log::error!("{}: {}", gene.name(), lapped);
                let skipped = gene.resync();
                log::debug!("{}: resynced past {} predictions", gene.name(), skipped);
                (None, Some(lapped))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bar(sequence: u64, close: f64) -> Bar {
        let mut bar = Bar::new(Utc::now(), close, close, close, close, 0.0);
        bar.sequence = sequence;
        bar
    }

    fn config(dead_zone: f64) -> ScoringConfig {
        ScoringConfig {
            dead_zone,
            temperature: 0.5,
            prediction_log_depth: 8,
        }
    }

    #[test]
    fn test_forecast_is_bounded() {
        let config = config(0.0);
        let scorer = PredictionScorer::new(&config, 1);
        assert_eq!(scorer.forecast(0.0), 0.0);
        assert!(scorer.forecast(10.0) <= 1.0);
        assert!(scorer.forecast(-10.0) >= -1.0);
        assert!(scorer.forecast(0.3) < 1.0);
        assert!((scorer.forecast(0.5) - 1f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_capped_and_signed() {
        let config = config(0.0);
        let scorer = PredictionScorer::new(&config, 1);
        let mut prediction = Prediction::flat("g", &bar(0, 100.0), 1);
        prediction.direction = Direction::Long;
        prediction.predicted_price = 101.0;

        // exact hit: 1/eps is capped at 5% of the close
        let (agreement, score) = scorer.score(&prediction, 101.0, Direction::Long);
        assert_eq!(agreement, 1);
        assert!((score - 101.0 * SCORE_CAP_FRACTION).abs() < 1e-9);

        let (agreement, score) = scorer.score(&prediction, 99.0, Direction::Short);
        assert_eq!(agreement, -1);
        assert!((score + 0.5).abs() < 1e-6);

        let (agreement, score) = scorer.score(&prediction, 101.0, Direction::Flat);
        assert_eq!(agreement, 0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_small_move_issues_flat() {
        let config = config(0.01);
        let scorer = PredictionScorer::new(&config, 1);
        let mut gene = Gene::new("g", vec![0], 4).unwrap();
        // |forecast * denom| < 0.01
        let prediction = scorer.issue(&mut gene, &bar(3, 100.0), 1.0, 0.001);
        assert_eq!(prediction.direction, Direction::Flat);
        assert_eq!(prediction.target_sequence, 4);
        assert!(prediction.predicted_price > 100.0);
    }

    #[test]
    fn test_nothing_matures_before_horizon() {
        let config = config(0.0);
        let scorer = PredictionScorer::new(&config, 2);
        let mut gene = Gene::new("g", vec![0], 4).unwrap();
        let readings = vec![50.0];

        let first = scorer.step(&mut gene, &bar(1, 100.0), 100.0, &readings, 0.01);
        assert!(first.matured.is_none());
        let second = scorer.step(&mut gene, &bar(2, 101.0), 100.0, &readings, 0.01);
        assert!(second.matured.is_none());
        let third = scorer.step(&mut gene, &bar(3, 102.0), 100.0, &readings, 0.01);

        let matured = third.matured.unwrap();
        assert_eq!(matured.prediction.issue_sequence, 1);
        assert_eq!(matured.prediction.target_sequence, 3);
        assert_eq!(matured.realized, Direction::Long);
        assert!(matured.prediction.successful);
        assert_eq!(gene.pending(), 2);
    }

    #[test]
    fn test_lapped_gene_resyncs_and_still_issues() {
        let config = config(0.0);
        let scorer = PredictionScorer::new(&config, 1);
        let mut gene = Gene::new("g", vec![0], 2).unwrap();
        for seq in 0..3 {
            scorer.issue(&mut gene, &bar(seq, 100.0), 1.0, 0.01);
        }

        let step = scorer.step(&mut gene, &bar(3, 101.0), 100.0, &vec![50.0], 0.01);
        let lapped = step.fault.unwrap();
        assert_eq!(lapped.expected, 0);
        assert!(step.matured.is_none());
        assert_eq!(step.issued.issue_sequence, 3);
        assert_eq!(gene.stats().bets(), 0);
    }
}
