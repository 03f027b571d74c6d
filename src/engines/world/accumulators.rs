// src/engines/world/accumulators.rs
use crate::engines::evaluation::Gene;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Track record of a world's arbitrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulators {
    /// Bars the arbitrator has been evaluated on.
    pub records: u64,
    /// Directional calls that matured against a directional market.
    pub matches: u64,
    pub flat: u64,
    pub errors: u64,
    pub total_score: f64,
}

impl Accumulators {
    pub fn from_arbitrator(arbitrator: &Gene) -> Self {
        let stats = arbitrator.stats();
        let records = arbitrator.bars_survived();
        let matches = stats.bets();
        let wins = stats.long_win + stats.short_win;

        Self {
            records,
            matches,
            flat: records.saturating_sub(matches),
            errors: matches.saturating_sub(wins),
            total_score: stats.total_score,
        }
    }

    pub fn match_pct(&self) -> f64 {
        percent(self.matches, self.records)
    }

    pub fn flat_pct(&self) -> f64 {
        percent(self.flat, self.records)
    }

    pub fn error_pct(&self) -> f64 {
        percent(self.errors, self.records)
    }

    /// Wins among directional matches.
    pub fn accuracy(&self) -> f64 {
        percent(self.matches - self.errors.min(self.matches), self.matches)
    }

    pub fn to_metrics(&self) -> HashMap<String, f64> {
        let mut metrics = HashMap::new();
        metrics.insert("records".to_string(), self.records as f64);
        metrics.insert("match_pct".to_string(), self.match_pct());
        metrics.insert("flat_pct".to_string(), self.flat_pct());
        metrics.insert("error_pct".to_string(), self.error_pct());
        metrics.insert("accuracy".to_string(), self.accuracy());
        metrics.insert("total_score".to_string(), self.total_score);
        metrics
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    match whole {
        0 => 0.0,
        whole => part as f64 * 100.0 / whole as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::GeneStats;

    #[test]
    fn test_from_arbitrator() {
        let stats = GeneStats {
            total_score: 1.5,
            total_win: 3,
            long_win: 2,
            short_win: 1,
            total_long: 3,
            total_short: 2,
        };
        let arbitrator = Gene::arbitrator(4).unwrap().with_history(stats, 10);
        let acc = Accumulators::from_arbitrator(&arbitrator);

        assert_eq!(acc.records, 10);
        assert_eq!(acc.matches, 5);
        assert_eq!(acc.flat, 5);
        assert_eq!(acc.errors, 2);
        assert_eq!(acc.match_pct(), 50.0);
        assert_eq!(acc.error_pct(), 20.0);
        assert_eq!(acc.accuracy(), 60.0);
    }

    #[test]
    fn test_empty_is_all_zero() {
        let acc = Accumulators::default();
        assert_eq!(acc.match_pct(), 0.0);
        assert_eq!(acc.accuracy(), 0.0);
        assert_eq!(acc.to_metrics()["flat_pct"], 0.0);
    }
}
