use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use evoforecast::engines::orchestration::{ChannelObserver, EngineEvent, LoggingObserver};
use evoforecast::functions::{Atr, IndicatorReading, IndicatorReadings};
use evoforecast::{Bar, ConfigManager, ForecastEngine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;

const DEFAULT_BARS: u64 = 2000;
const HISTORY: usize = 32;

/// Indicator catalog of the synthetic feed, in gene index order.
const CATALOG: [&str; 6] = ["ROC3", "ROC8", "ROC21", "SMA10", "SMA30", "DONCHIAN20"];

/// Seeded random walk with a slowly drifting trend.
struct SyntheticFeed {
    rng: StdRng,
    close: f64,
    drift: f64,
    closes: VecDeque<f64>,
    atr: Atr,
    readings: IndicatorReadings,
}

impl SyntheticFeed {
    fn new(seed: u64, atr_period: usize) -> evoforecast::Result<Self> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            close: 100.0,
            drift: 0.0,
            closes: VecDeque::with_capacity(HISTORY),
            atr: Atr::new(atr_period)?,
            readings: IndicatorReadings::new(CATALOG),
        })
    }

    fn next_bar(&mut self, index: u64) -> Bar {
        self.drift = (self.drift + self.rng.gen_range(-0.0002..0.0002)).clamp(-0.002, 0.002);
        let open = self.close;
        let ret = self.drift + self.rng.gen_range(-0.01..0.01);
        let close = (open * (1.0 + ret)).max(1.0);
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..0.003));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..0.003));
        let volume = self.rng.gen_range(1_000.0..5_000.0);
        self.close = close;

        self.closes.push_back(close);
        if self.closes.len() > HISTORY {
            self.closes.pop_front();
        }

        let timestamp = Utc::now() + Duration::minutes(index as i64);
        let bar = Bar::new(timestamp, open, high, low, close, volume);
        self.atr.update(&bar);
        bar
    }

    /// Readings for the latest bar, normalized with the ATR that already
    /// includes it. Indicators without enough history read 0.
    fn update_readings(&mut self) -> &IndicatorReadings {
        let close = self.close;
        let atr = self.atr.value().unwrap_or(0.0);
        let roc = |closes: &VecDeque<f64>, k: usize| {
            closes
                .len()
                .checked_sub(k + 1)
                .map(|i| (close / closes[i] - 1.0) * 100.0)
        };
        let sma = |closes: &VecDeque<f64>, k: usize| {
            (closes.len() >= k).then(|| closes.iter().rev().take(k).sum::<f64>() / k as f64)
        };

        let catalog = [
            roc(&self.closes, 3).map(IndicatorReading::Percent),
            roc(&self.closes, 8).map(IndicatorReading::Percent),
            roc(&self.closes, 21).map(IndicatorReading::Percent),
            sma(&self.closes, 10).map(IndicatorReading::MovingAverage),
            sma(&self.closes, 30).map(IndicatorReading::MovingAverage),
            (self.closes.len() >= 20).then(|| {
                let window = self.closes.iter().rev().take(20);
                let (upper, lower) = window.fold((f64::MIN, f64::MAX), |(hi, lo), &c| (hi.max(c), lo.min(c)));
                IndicatorReading::Channel { upper, lower }
            }),
        ];

        for (id, reading) in catalog.into_iter().enumerate() {
            match reading {
                Some(reading) => {
                    self.readings.record(id, reading, close, atr);
                }
                None => self.readings.set_normalized(id, 0.0),
            }
        }
        &self.readings
    }
}

#[derive(Serialize)]
struct RunSummary {
    bars: u64,
    evaluated: u64,
    evolutions: u64,
    reader_seen: u64,
    reader_skipped: u64,
    consolidated_long: u64,
    consolidated_short: u64,
    worlds: Vec<evoforecast::engines::world::WorldReport>,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let manager = ConfigManager::new();
    match args.next() {
        Some(path) => manager
            .load_from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => manager
            .load_from_env()
            .context("loading config from environment")?,
    }
    let total: u64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid bar count {:?}", raw))?,
        None => DEFAULT_BARS,
    };

    let config = manager.get();
    let seed = config.evolution.seed.unwrap_or(7);
    let atr_period = config.market.atr_period;
    let mut engine = ForecastEngine::new(config, CATALOG.len()).context("building engine")?;
    engine.add_observer(Box::new(LoggingObserver::new(250)));

    let (sender, events) = mpsc::channel();
    engine.add_observer(Box::new(ChannelObserver::new(sender)));

    // independent consumer of the shared bar log
    let bars = engine.bars();
    let reader = thread::spawn(move || {
        let mut cursor = bars.cursor_from_start();
        let (mut seen, mut skipped) = (0u64, 0u64);
        while seen + skipped < total {
            match bars.take(&mut cursor) {
                Ok(_) => seen += 1,
                Err(lapped) => {
                    log::warn!("Bar reader: {}", lapped);
                    skipped += bars.resync(&mut cursor);
                }
            }
        }
        (seen, skipped)
    });

    let mut feed = SyntheticFeed::new(seed, atr_period).context("building feed")?;
    let mut evaluated = 0;
    for index in 0..total {
        let bar = feed.next_bar(index);
        let readings = feed.update_readings();
        let step = engine.ingest(bar, readings)?;
        if step.evaluated() {
            evaluated += 1;
        }
    }

    let (reader_seen, reader_skipped) = reader
        .join()
        .map_err(|_| anyhow::anyhow!("bar reader thread panicked"))?;

    let (mut consolidated_long, mut consolidated_short) = (0, 0);
    for event in events.try_iter() {
        if let EngineEvent::Consolidated { direction, .. } = event {
            if direction > 0 {
                consolidated_long += 1;
            } else if direction < 0 {
                consolidated_short += 1;
            }
        }
    }

    let summary = RunSummary {
        bars: total,
        evaluated,
        evolutions: engine.evolutions(),
        reader_seen,
        reader_skipped,
        consolidated_long,
        consolidated_short,
        worlds: engine.reports(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoforecast::AppConfig;

    #[test]
    fn test_feed_atr_includes_current_bar() {
        let mut feed = SyntheticFeed::new(3, 1).unwrap();
        let bar = feed.next_bar(0);
        assert_eq!(feed.atr.value(), Some(bar.high - bar.low));
    }

    #[test]
    fn test_feed_atr_matches_engine_after_ingest() {
        let mut config = AppConfig::default();
        config.market.atr_period = 3;
        let mut engine = ForecastEngine::new(config, CATALOG.len()).unwrap();
        let mut feed = SyntheticFeed::new(3, 3).unwrap();

        for index in 0..10 {
            let bar = feed.next_bar(index);
            let readings = feed.update_readings();
            engine.ingest(bar, readings).unwrap();
            assert_eq!(feed.atr.value(), engine.atr());
        }
    }
}
