use crate::config::RankingConfig;
use crate::engines::evaluation::Gene;
use std::cmp::Ordering;

/// Orders genes by a blend of mean score per bar and win rate.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    score_weight: f64,
    win_rate_weight: f64,
}

impl Ranker {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            score_weight: config.score_weight,
            win_rate_weight: config.win_rate_weight,
        }
    }

    /// `score/bars * score_weight + win/bets * win_rate_weight`; a term with a
    /// zero denominator contributes 0.
    pub fn key(&self, gene: &Gene) -> f64 {
        let stats = gene.stats();
        let mean_score = match gene.bars_survived() {
            0 => 0.0,
            bars => stats.total_score / bars as f64,
        };
        mean_score * self.score_weight + stats.win_rate() * self.win_rate_weight
    }

    /// Indices of the non-arbitrator genes, best first. Ties keep input order.
    pub fn rank(&self, genes: &[Gene]) -> Vec<usize> {
        let mut keyed: Vec<(usize, f64)> = genes
            .iter()
            .enumerate()
            .filter(|(_, gene)| !gene.is_arbitrator())
            .map(|(i, gene)| (i, self.key(gene)))
            .collect();

        keyed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        keyed.into_iter().map(|(i, _)| i).collect()
    }

    /// Reorder an owned population best first. Arbitrators are moved to the
    /// end in their original order.
    pub fn sort(&self, genes: Vec<Gene>) -> Vec<Gene> {
        let mut order = self.rank(&genes);
        order.extend(
            genes
                .iter()
                .enumerate()
                .filter(|(_, gene)| gene.is_arbitrator())
                .map(|(i, _)| i),
        );

        let mut slots: Vec<Option<Gene>> = genes.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .collect()
    }
}
