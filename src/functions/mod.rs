pub mod traits;
pub mod normalizer;
pub mod volatility;

pub use traits::IndicatorSource;
pub use normalizer::{clamp50, IndicatorReading, IndicatorReadings, SIGNAL_MAX_ABS};
pub use volatility::{volatility_denominator, Atr};
