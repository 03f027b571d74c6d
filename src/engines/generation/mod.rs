pub mod genome;
pub mod operators;
pub mod ranker;
pub mod scheduler;

pub use genome::Genome;
pub use ranker::Ranker;
pub use scheduler::{EvolutionScheduler, EvolutionSummary, SelectionPlan, SlotAction};
