pub mod gene;
pub mod prediction;
pub mod scorer;

pub use gene::{Gene, GeneReport, GeneRole, GeneStats, ARBITRATOR_NAME};
pub use prediction::Prediction;
pub use scorer::{GeneStep, Maturation, PredictionScorer, SCORE_CAP_FRACTION};
