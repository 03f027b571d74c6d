use crate::error::{EngineError, Result};
use crate::types::{Bar, EPSILON};
use ta::indicators::AverageTrueRange;
use ta::{Close, High, Low, Next};

impl High for Bar {
    fn high(&self) -> f64 {
        self.high
    }
}

impl Low for Bar {
    fn low(&self) -> f64 {
        self.low
    }
}

impl Close for Bar {
    fn close(&self) -> f64 {
        self.close
    }
}

/// Streaming Average True Range over the bar feed.
///
/// The first bar contributes `high - low` as its true range. No value is
/// reported until `period` bars have been seen.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    inner: AverageTrueRange,
    seen: usize,
    value: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self> {
        let inner = AverageTrueRange::new(period).map_err(|e| {
            EngineError::Configuration(format!("Invalid ATR period {}: {:?}", period, e))
        })?;
        Ok(Self {
            period,
            inner,
            seen: 0,
            value: None,
        })
    }

    /// Feed one bar; returns the ATR once `period` bars were seen.
    pub fn update(&mut self, bar: &Bar) -> Option<f64> {
        let atr = self.inner.next(bar);
        self.seen += 1;
        if self.seen >= self.period && atr.is_finite() {
            self.value = Some(atr);
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Fraction of price a full-strength forecast moves: `k * ATR%`, floored at
/// [`EPSILON`] at both stages. A missing ATR or zero reference close floors.
pub fn volatility_denominator(atr: Option<f64>, reference_close: f64, k: f64) -> f64 {
    let atr_pct = match atr {
        Some(atr) if atr.is_finite() && reference_close != 0.0 => atr / reference_close,
        _ => 0.0,
    };
    (k * atr_pct.max(EPSILON)).max(EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bar(high: f64, low: f64, close: f64) -> Bar {
        Bar::new(Utc::now(), close, high, low, close, 0.0)
    }

    #[test]
    fn test_atr_counts_first_bar_range() {
        let mut atr = Atr::new(1).unwrap();
        // first true range is high - low
        assert_eq!(atr.update(&bar(11.0, 9.0, 10.0)), Some(2.0));
    }

    #[test]
    fn test_atr_defined_after_period_bars() {
        let mut atr = Atr::new(3).unwrap();
        assert_eq!(atr.update(&bar(11.0, 9.0, 10.0)), None);
        assert_eq!(atr.update(&bar(12.0, 10.0, 11.0)), None);
        let third = atr.update(&bar(13.0, 9.0, 12.0)).unwrap();
        // every true range so far lies in [2, 4]
        assert!((2.0..=4.0).contains(&third));
        assert_eq!(atr.value(), Some(third));

        let fourth = atr.update(&bar(30.0, 10.0, 20.0)).unwrap();
        assert!(fourth > third);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(Atr::new(0), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_denominator_is_floored() {
        assert_eq!(volatility_denominator(None, 100.0, 1.0), EPSILON);
        assert_eq!(volatility_denominator(Some(1.0), 0.0, 1.0), EPSILON);
        assert!((volatility_denominator(Some(2.0), 100.0, 1.5) - 0.03).abs() < 1e-12);
    }
}
