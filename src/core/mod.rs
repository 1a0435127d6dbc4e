mod distribution;
mod engine;
mod types;

pub use distribution::{OutcomeDistribution, OutcomeEntry};
pub use engine::{run, run_with};
pub use types::{
    Outcome, STAKE_GRANULARITY_PENCE, SimulationConfig, SimulationError, SimulationResult,
    StepRecord, amount_from_pence, pence_from_amount,
};
