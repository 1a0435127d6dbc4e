use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::distribution::{OutcomeDistribution, Rng};
use super::types::{
    STAKE_GRANULARITY_PENCE, SimulationConfig, SimulationError, SimulationResult, StepRecord,
};

/// Runs a single wagering-requirement attempt against the reference payout
/// table. Deterministic for a given seed.
pub fn run(config: &SimulationConfig) -> Result<SimulationResult, SimulationError> {
    run_with(config, &OutcomeDistribution::default())
}

/// Runs a single attempt with a caller-supplied outcome distribution.
///
/// The run ends either when the cumulative stake reaches the wagering target
/// (the qualifying stake's outcome is never resolved; the final record keeps
/// the pre-outcome balance) or when the balance can no longer cover a stake
/// at the 5p granularity.
pub fn run_with(
    config: &SimulationConfig,
    distribution: &OutcomeDistribution,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(entropy_seed);
    let mut rng = Rng::new(seed);

    let target_pence = config.target_pence();
    let max_steps = max_step_bound(config, target_pence);

    let mut balance = config.starting_balance_pence;
    let mut total_staked = 0_i64;
    let mut step = 0_u32;

    let mut records = vec![StepRecord {
        step,
        balance_pence: balance,
        total_staked_pence: total_staked,
    }];

    while balance >= STAKE_GRANULARITY_PENCE {
        // Never stake more than the balance holds at the 5p granularity;
        // the sub-5p remainder is reserved rather than overbet.
        let stake = config
            .average_stake_pence
            .min(balance - balance % STAKE_GRANULARITY_PENCE);
        if stake <= 0 {
            return Err(SimulationError::NonProgressingSimulation {
                step,
                balance_pence: balance,
                stake_pence: stake,
            });
        }

        total_staked += stake;
        step += 1;

        if total_staked >= target_pence {
            // Requirement met on the staking action itself.
            records.push(StepRecord {
                step,
                balance_pence: balance,
                total_staked_pence: total_staked,
            });
            break;
        }

        let multiplier = distribution.sample(&mut rng);
        balance += stake * (multiplier - 1);
        records.push(StepRecord {
            step,
            balance_pence: balance,
            total_staked_pence: total_staked,
        });

        if balance <= 0 {
            break;
        }
        if u64::from(step) > max_steps {
            return Err(SimulationError::NonProgressingSimulation {
                step,
                balance_pence: balance,
                stake_pence: stake,
            });
        }
    }

    Ok(SimulationResult {
        records,
        target_pence,
        seed,
    })
}

// Every step stakes at least min(average_stake, granularity), so the target
// is reached within target / min_stake steps unless an invariant is broken.
fn max_step_bound(config: &SimulationConfig, target_pence: i64) -> u64 {
    let min_stake = config
        .average_stake_pence
        .min(STAKE_GRANULARITY_PENCE)
        .max(1);
    (target_pence / min_stake).max(0) as u64 + 4
}

fn entropy_seed() -> u64 {
    // Counter keeps unseeded runs from sharing a seed on coarse clocks.
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut hasher = DefaultHasher::new();
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    hasher.finish()
}
