use chrono::Utc;
use evoforecast::config::{RankingConfig, ScoringConfig};
use evoforecast::engines::evaluation::{Gene, PredictionScorer};
use evoforecast::engines::world::World;
use evoforecast::{Bar, Direction};

fn bar(sequence: u64, close: f64) -> Bar {
    let mut bar = Bar::new(Utc::now(), close, close, close, close, 0.0);
    bar.sequence = sequence;
    bar
}

fn scoring(dead_zone: f64) -> ScoringConfig {
    ScoringConfig {
        dead_zone,
        temperature: 0.5,
        prediction_log_depth: 16,
    }
}

#[test]
fn test_cold_start_then_first_maturation() {
    let scoring = scoring(0.0);
    let horizon = 3;
    let scorer = PredictionScorer::new(&scoring, horizon);
    let mut gene = Gene::new("g", vec![0], 16).unwrap();
    let readings = vec![25.0];

    let closes = [100.0, 100.5, 101.0, 101.5, 102.0];
    let mut matured = Vec::new();
    for (i, &close) in closes.iter().enumerate() {
        let sequence = i as u64 + 1;
        let reference = if i >= horizon as usize { closes[i - horizon as usize] } else { close };
        let step = scorer.step(&mut gene, &bar(sequence, close), reference, &readings, 0.01);
        matured.push(step.matured);
    }

    // bars 1..=3 only issue
    assert!(matured[..3].iter().all(Option::is_none));
    // bar 4 scores bar 1's prediction
    let first = matured[3].as_ref().unwrap();
    assert_eq!(first.prediction.issue_sequence, 1);
    assert_eq!(first.prediction.target_sequence, 4);
    assert_eq!(first.realized, Direction::Long);
    assert!(first.prediction.successful);
    assert_eq!(matured[4].as_ref().unwrap().prediction.issue_sequence, 2);
    assert_eq!(gene.stats().total_win, 2);
}

#[test]
fn test_up_down_flat_scenario() {
    println!("\n=== Testing horizon-1 scenario over closes 100, 101, 99, 99 ===");

    let scoring = scoring(0.0);
    let ranking = RankingConfig::default();
    let gene = Gene::new("always-long", vec![0], 16).unwrap();
    let mut world = World::new(0, 1, vec![gene], &scoring).unwrap();
    let readings = vec![50.0];

    let closes = [100.0, 101.0, 99.0, 99.0];
    let mut previous = closes[0];
    for (i, &close) in closes.iter().enumerate() {
        let outcome = world
            .evaluate(&bar(i as u64 + 1, close), previous, &readings, 0.01, &scoring, &ranking)
            .unwrap();
        assert_eq!(outcome.steps[0].issued.direction, Direction::Long);
        previous = close;
    }

    let stats = world.genes()[0].stats();
    // bar 2 rises: a win; bar 3 falls: a loss; bar 4 is flat: neither
    assert_eq!(stats.total_long, 1 + 1);
    assert_eq!(stats.total_win, 1);
    assert_eq!(stats.long_win, 1);
    assert_eq!(stats.total_short, 0);
    assert_eq!(world.genes()[0].bars_survived(), 4);
    assert_eq!(world.accumulators().records, 4);
    assert_eq!(world.accumulators().matches, 2);
    assert_eq!(world.accumulators().errors, 1);
}

#[test]
fn test_score_sign_follows_agreement() {
    let scoring = scoring(0.0);
    let scorer = PredictionScorer::new(&scoring, 1);
    let mut gene = Gene::new("g", vec![0], 4).unwrap();
    let bullish = vec![50.0];

    scorer.step(&mut gene, &bar(1, 100.0), 100.0, &bullish, 0.01);
    let win = scorer.step(&mut gene, &bar(2, 101.0), 100.0, &bullish, 0.01);
    let win = win.matured.unwrap();
    assert!(win.prediction.score > 0.0);
    assert!(win.prediction.score <= 101.0 * 0.05);

    let loss = scorer.step(&mut gene, &bar(3, 99.0), 101.0, &bullish, 0.01);
    assert!(loss.matured.unwrap().prediction.score < 0.0);
}

#[test]
fn test_dead_zone_flattens_small_moves() {
    let scoring = scoring(0.05);
    let scorer = PredictionScorer::new(&scoring, 1);
    let mut gene = Gene::new("g", vec![0], 4).unwrap();
    let bullish = vec![50.0];

    // forecast * 0.01 is always below a 5% dead zone
    let issued = scorer.step(&mut gene, &bar(1, 100.0), 100.0, &bullish, 0.01).issued;
    assert_eq!(issued.direction, Direction::Flat);

    let matured = scorer.step(&mut gene, &bar(2, 101.0), 100.0, &bullish, 0.01).matured.unwrap();
    // a 1% move is flat too
    assert_eq!(matured.realized, Direction::Flat);
    assert_eq!(matured.agreement, 0);
    assert_eq!(gene.stats().bets(), 0);
}
