pub mod engine;
pub mod progress;

pub use engine::{EngineStep, ForecastEngine};
pub use progress::{ChannelObserver, EngineEvent, EngineObserver, LoggingObserver};
