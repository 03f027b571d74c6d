//! Online genetic-algorithm forecasting over a stream of price bars.
//!
//! Bars flow into a [`ForecastEngine`], which publishes them to a shared
//! [`SequencedRingLog`] and evaluates one [`World`] per configured horizon.
//! Each world's genes blend indicator readings into price forecasts that are
//! scored once their horizon has elapsed; the best gene is mirrored by the
//! world's arbitrator and the population is periodically evolved.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod functions;
pub mod types;

pub use config::{AppConfig, ConfigManager};
pub use data::{Cursor, CursorLapped, Entry, SequencedRingLog};
pub use engines::evaluation::{Gene, Prediction, PredictionScorer};
pub use engines::generation::{EvolutionScheduler, Ranker};
pub use engines::orchestration::{EngineStep, ForecastEngine};
pub use engines::world::{Accumulators, World};
pub use error::{EngineError, Result};
pub use types::{Bar, Direction};
