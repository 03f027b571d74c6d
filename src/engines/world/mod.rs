pub mod accumulators;
pub mod population;

pub use accumulators::Accumulators;
pub use population::{BarOutcome, GeneFault, World, WorldReport};
