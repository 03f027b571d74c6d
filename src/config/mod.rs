pub mod traits;
pub mod market;
pub mod scoring;
pub mod evolution;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use market::{MarketConfig, WorldConfig};
pub use scoring::{RankingConfig, ScoringConfig};
pub use evolution::EvolutionConfig;
pub use traits::ConfigSection;
