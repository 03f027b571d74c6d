use super::traits::IndicatorSource;
use serde::{Deserialize, Serialize};

/// Bound of every normalized reading.
pub const SIGNAL_MAX_ABS: f64 = 50.0;

const MACD_TO_ATR_SCALE: f64 = 50.0;
const PRICE_TO_ATR_SCALE: f64 = 25.0;
const FALLBACK_ATR_SCALE: f64 = 10.0;

pub fn clamp50(x: f64) -> f64 {
    x.clamp(-SIGNAL_MAX_ABS, SIGNAL_MAX_ABS)
}

/// Raw indicator output tagged with the family that decides how it maps
/// onto [-50, 50].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IndicatorReading {
    /// 0..100 oscillators: RSI, stochastic %K/%D, MFI.
    Oscillator(f64),
    /// Williams %R, in [-100, 0].
    WilliamsR(f64),
    /// Zero-centred oscillators in [-100, 100]: CMO, Aroon oscillator.
    SymmetricOscillator(f64),
    /// Position inside a band already expressed as 0..100: Bollinger %B, Keltner.
    BandPercent(f64),
    /// Donchian-style channel; position of the close inside it.
    Channel { upper: f64, lower: f64 },
    /// Percent-scale momentum: ROC, TRIX, Coppock.
    Percent(f64),
    /// Commodity channel index, typically within [-200, 200].
    Cci(f64),
    /// MACD histogram in price units.
    MacdHistogram(f64),
    /// Oscillators in price units: awesome oscillator, DPO.
    PriceOscillator(f64),
    /// Moving-average level; the close's distance from it is the signal.
    MovingAverage(f64),
    /// ATR itself carries no direction.
    Volatility(f64),
    UlcerIndex(f64),
    MassIndex(f64),
    /// Anything else, scaled by ATR.
    Other(f64),
}

impl IndicatorReading {
    /// Map the reading onto [-50, 50] given the current close and ATR.
    /// Undefined inputs (NaN, zero ATR where one is needed) give 0.
    pub fn normalize(&self, close: f64, atr: f64) -> f64 {
        let atr_ok = atr.is_finite() && atr != 0.0;
        let z = match *self {
            Self::Oscillator(v) | Self::BandPercent(v) => v - 50.0,
            Self::WilliamsR(v) => v + 50.0,
            Self::SymmetricOscillator(v) => v / 2.0,
            Self::Channel { upper, lower } => {
                let range = upper - lower;
                if !range.is_finite() || range == 0.0 {
                    return 0.0;
                }
                (close - lower) * 100.0 / range - 50.0
            }
            Self::Percent(v) | Self::UlcerIndex(v) => v,
            Self::Cci(v) => v / 4.0,
            Self::MacdHistogram(v) if atr_ok => v / atr * MACD_TO_ATR_SCALE,
            Self::PriceOscillator(v) if atr_ok => v / atr * PRICE_TO_ATR_SCALE,
            Self::MovingAverage(ma) if atr_ok => (close - ma) / atr * PRICE_TO_ATR_SCALE,
            Self::MassIndex(v) => (v - 25.0) * 2.0,
            Self::Other(v) if atr_ok => v / atr * FALLBACK_ATR_SCALE,
            Self::Volatility(_)
            | Self::MacdHistogram(_)
            | Self::PriceOscillator(_)
            | Self::MovingAverage(_)
            | Self::Other(_) => 0.0,
        };

        if z.is_nan() {
            0.0
        } else {
            clamp50(z)
        }
    }
}

/// Named, normalized readings for one bar. Index order is the catalog order
/// genes refer to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorReadings {
    names: Vec<String>,
    values: Vec<f64>,
}

impl IndicatorReadings {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let values = vec![0.0; names.len()];
        Self { names, values }
    }

    /// Store an already-normalized value, clamped to [-50, 50].
    pub fn set_normalized(&mut self, id: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(id) {
            *slot = if value.is_nan() { 0.0 } else { clamp50(value) };
        }
    }

    /// Normalize `reading` against the bar's close and ATR, then store it.
    pub fn record(&mut self, id: usize, reading: IndicatorReading, close: f64, atr: f64) -> f64 {
        let z = reading.normalize(close, atr);
        if let Some(slot) = self.values.get_mut(id) {
            *slot = z;
        }
        z
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl IndicatorSource for IndicatorReadings {
    fn count(&self) -> usize {
        self.values.len()
    }

    fn normalized(&self, id: usize) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}
