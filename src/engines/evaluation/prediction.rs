use crate::types::{Bar, Direction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forecast issued on one bar and due `horizon` bars later.
///
/// `score` and `successful` stay at their defaults in the issuing log; they
/// are filled in on the copy handed out when the prediction matures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub origin: String,
    pub issue_timestamp: DateTime<Utc>,
    pub issue_sequence: u64,
    pub target_sequence: u64,
    pub predicted_price: f64,
    pub direction: Direction,
    /// Squashed signal in [-1, 1].
    pub forecast: f64,
    pub score: f64,
    pub successful: bool,
}

impl Prediction {
    pub fn issue(
        origin: &str,
        bar: &Bar,
        horizon: u64,
        forecast: f64,
        predicted_price: f64,
        direction: Direction,
    ) -> Self {
        Self {
            origin: origin.to_string(),
            issue_timestamp: bar.timestamp,
            issue_sequence: bar.sequence,
            target_sequence: bar.sequence + horizon,
            predicted_price,
            direction,
            forecast,
            score: 0.0,
            successful: false,
        }
    }

    /// No opinion: flat at the current close.
    pub fn flat(origin: &str, bar: &Bar, horizon: u64) -> Self {
        Self::issue(origin, bar, horizon, 0.0, bar.close, Direction::Flat)
    }

    /// Re-issue `source`'s price and direction under a new origin on `bar`.
    pub fn mirror(source: &Prediction, origin: &str, bar: &Bar, horizon: u64) -> Self {
        Self::issue(
            origin,
            bar,
            horizon,
            source.forecast,
            source.predicted_price,
            source.direction,
        )
    }
}
