use thiserror::Error;

/// Smallest currency unit the engine will stake or track, in pence.
/// This is part of the engine contract: it defines the stake clamp and the
/// "cannot place a smaller final stake" termination rule.
pub const STAKE_GRANULARITY_PENCE: i64 = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(
        "simulation made no progress at step {step}: stake {stake_pence}p with balance {balance_pence}p"
    )]
    NonProgressingSimulation {
        step: u32,
        balance_pence: i64,
        stake_pence: i64,
    },
}

/// Converts a decimal currency amount to integer pence, rounding to the
/// nearest penny.
pub fn pence_from_amount(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn amount_from_pence(pence: i64) -> f64 {
    pence as f64 / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub starting_balance_pence: i64,
    pub wagering_multiplier: f64,
    pub average_stake_pence: i64,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Builds a config from decimal currency amounts, validating the decimal
    /// preconditions before quantizing to pence.
    ///
    /// A stake that is positive as a decimal but rounds to zero pence (e.g.
    /// 0.004) is accepted here; the engine's non-progress guard rejects it at
    /// run time.
    pub fn from_amounts(
        starting_balance: f64,
        wagering_multiplier: f64,
        average_stake: f64,
        seed: Option<u64>,
    ) -> Result<Self, SimulationError> {
        if !starting_balance.is_finite() || starting_balance <= 0.0 {
            return Err(SimulationError::InvalidConfiguration(
                "starting balance must be > 0".to_string(),
            ));
        }
        if !wagering_multiplier.is_finite() || wagering_multiplier < 1.0 {
            return Err(SimulationError::InvalidConfiguration(
                "wagering multiplier must be >= 1".to_string(),
            ));
        }
        if !average_stake.is_finite() || average_stake <= 0.0 {
            return Err(SimulationError::InvalidConfiguration(
                "average stake must be > 0".to_string(),
            ));
        }

        let starting_balance_pence = pence_from_amount(starting_balance);
        if starting_balance_pence <= 0 {
            return Err(SimulationError::InvalidConfiguration(
                "starting balance must be at least 0.01".to_string(),
            ));
        }

        Ok(Self {
            starting_balance_pence,
            wagering_multiplier,
            average_stake_pence: pence_from_amount(average_stake),
            seed,
        })
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.starting_balance_pence <= 0 {
            return Err(SimulationError::InvalidConfiguration(
                "starting balance must be > 0".to_string(),
            ));
        }
        if !self.wagering_multiplier.is_finite() || self.wagering_multiplier < 1.0 {
            return Err(SimulationError::InvalidConfiguration(
                "wagering multiplier must be >= 1".to_string(),
            ));
        }
        if self.average_stake_pence < 0 {
            return Err(SimulationError::InvalidConfiguration(
                "average stake must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Total amount that must be staked before the requirement is met.
    /// Ceiling keeps the integer `>=` comparison equivalent to the
    /// real-valued one for fractional multipliers.
    pub fn target_pence(&self) -> i64 {
        (self.wagering_multiplier * self.starting_balance_pence as f64).ceil() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    pub step: u32,
    pub balance_pence: i64,
    pub total_staked_pence: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    Incomplete,
}

/// Full per-step history of one run, read-only once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub records: Vec<StepRecord>,
    pub target_pence: i64,
    /// Seed the run actually used; echoing it makes unseeded runs replayable.
    pub seed: u64,
}

impl SimulationResult {
    pub fn final_balance_pence(&self) -> i64 {
        self.records.last().map_or(0, |r| r.balance_pence)
    }

    pub fn total_staked_pence(&self) -> i64 {
        self.records.last().map_or(0, |r| r.total_staked_pence)
    }

    pub fn outcome(&self) -> Outcome {
        let Some(last) = self.records.last() else {
            return Outcome::Incomplete;
        };
        if last.balance_pence <= 0 {
            Outcome::Lost
        } else if last.total_staked_pence >= self.target_pence {
            Outcome::Won
        } else {
            Outcome::Incomplete
        }
    }

    /// Amount still to be wagered before the requirement would be met,
    /// clamped at zero for display.
    pub fn remaining_to_wager_pence(&self) -> i64 {
        (self.target_pence - self.total_staked_pence()).max(0)
    }
}
