use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Guard added to every denominator that could reach zero.
pub const EPSILON: f64 = 1e-9;

/// One OHLCV sample. Never mutated once published to a log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            sequence: 0,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Direction of a forecast or of a realized move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Short,
    Flat,
    Long,
}

impl Direction {
    /// Sign of `value`; exact zero (and NaN) map to `Flat`.
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Self::Long
        } else if value < 0.0 {
            Self::Short
        } else {
            Self::Flat
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Short => -1,
            Self::Flat => 0,
            Self::Long => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Short => "SHORT",
            Self::Flat => "FLAT",
            Self::Long => "LONG",
        }
    }
}

/// Realized market direction between two closes, with a relative dead zone.
pub fn realized_direction(reference_close: f64, current_close: f64, dead_zone: f64) -> Direction {
    let change = current_close - reference_close;
    if change.abs() / current_close.abs().max(EPSILON) < dead_zone {
        return Direction::Flat;
    }
    Direction::from_sign(change)
}
