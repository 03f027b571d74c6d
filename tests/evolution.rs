use evoforecast::config::{EvolutionConfig, RankingConfig};
use evoforecast::engines::evaluation::{Gene, GeneStats};
use evoforecast::engines::generation::{EvolutionScheduler, Ranker, SlotAction};
use std::collections::HashSet;

fn evolution_config() -> EvolutionConfig {
    EvolutionConfig {
        elite_pct: 0.5,
        generate_new_pct: 0.25,
        mutation_rate: 0.08,
        min_bars_before_replacing: 50,
        genome_length: 4,
        evolve_every_bars: 100,
        seed: Some(2024),
    }
}

/// Eight genes with distinct track records, all old enough to be replaced.
fn scored_population() -> Vec<Gene> {
    (0..8)
        .map(|i| {
            let stats = GeneStats {
                total_score: i as f64,
                total_win: i,
                long_win: i,
                total_long: 8,
                ..GeneStats::default()
            };
            Gene::new(format!("g{}", i), vec![i as usize % 5, 0], 8)
                .unwrap()
                .with_history(stats, 100)
        })
        .collect()
}

#[test]
fn test_ranker_orders_best_first() {
    let ranker = Ranker::new(&RankingConfig::default());
    let genes = scored_population();
    let order = ranker.rank(&genes);

    assert_eq!(order, vec![7, 6, 5, 4, 3, 2, 1, 0]);
    let unique: HashSet<usize> = order.iter().copied().collect();
    assert_eq!(unique.len(), genes.len());
}

#[test]
fn test_ranker_ties_keep_input_order() {
    let ranker = Ranker::new(&RankingConfig::default());
    let genes: Vec<Gene> = (0..5)
        .map(|i| Gene::new(format!("t{}", i), vec![0], 4).unwrap())
        .collect();
    assert_eq!(ranker.rank(&genes), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_evolution_split_four_two_two() {
    println!("\n=== Testing evolution of 8 genes with elite 0.5 and new 0.25 ===");

    let mut scheduler = EvolutionScheduler::new(evolution_config(), 5).unwrap();
    let ranked = Ranker::new(&RankingConfig::default()).sort(scored_population());
    let elite_names: Vec<String> = ranked[..4].iter().map(|g| g.name().to_string()).collect();
    assert_eq!(elite_names, vec!["g7", "g6", "g5", "g4"]);

    let plan = scheduler.plan(&ranked);
    assert_eq!(plan.count(SlotAction::Elite), 4);
    assert_eq!(plan.count(SlotAction::Offspring), 2);
    assert_eq!(plan.count(SlotAction::Fresh), 2);

    let (next, summary) = scheduler
        .evolve(0, ranked, Gene::arbitrator(8).unwrap(), 8)
        .unwrap();

    assert_eq!(next.len(), 9);
    assert_eq!((summary.elites, summary.offspring, summary.fresh), (4, 2, 2));
    assert!(next.last().unwrap().is_arbitrator());

    for (gene, name) in next.iter().zip(&elite_names) {
        assert_eq!(gene.name(), name);
        assert_eq!(gene.bars_survived(), 100);
    }

    let names: HashSet<&str> = next.iter().map(Gene::name).collect();
    assert_eq!(names.len(), 9);
    for gene in &next[4..8] {
        assert_eq!(gene.bars_survived(), 0);
        assert_eq!(gene.stats(), &GeneStats::default());
        assert!(gene.indicators().iter().all(|&i| i < 5));
    }
}

#[test]
fn test_young_genes_survive_evolution() {
    let mut scheduler = EvolutionScheduler::new(evolution_config(), 5).unwrap();
    let mut population = scored_population();
    // the two worst genes are too young to judge
    population[0] = Gene::new("young-a", vec![1], 8).unwrap().with_history(GeneStats::default(), 10);
    population[1] = Gene::new("young-b", vec![2], 8).unwrap();

    let ranked = Ranker::new(&RankingConfig::default()).sort(population);
    let (next, summary) = scheduler
        .evolve(3, ranked, Gene::arbitrator(8).unwrap(), 8)
        .unwrap();

    let names: Vec<&str> = next.iter().map(Gene::name).collect();
    assert!(names.contains(&"young-a"));
    assert!(names.contains(&"young-b"));
    assert_eq!(summary.protected, 2);
    assert_eq!(summary.elites, 4);
    assert_eq!(summary.fresh, 2);
    assert_eq!(summary.offspring, 0);
    assert_eq!(next.len(), 9);
}

#[test]
fn test_seeded_scheduler_is_reproducible() {
    let mut a = EvolutionScheduler::new(evolution_config(), 5).unwrap();
    let mut b = EvolutionScheduler::new(evolution_config(), 5).unwrap();

    let pa = a.seed_population(0, 6, 4).unwrap();
    let pb = b.seed_population(0, 6, 4).unwrap();
    for (x, y) in pa.iter().zip(&pb) {
        assert_eq!(x.name(), y.name());
        assert_eq!(x.indicators(), y.indicators());
    }
}
