use super::types::SimulationError;

/// One entry of the discrete outcome model: a stake multiplier and the
/// probability of drawing it. Net balance change for a step is
/// `stake * (multiplier - 1)`, so 0 loses the stake, 1 is a push, 3 is a
/// double-up and 11 a ten-times win.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeEntry {
    pub multiplier: i64,
    pub probability: f64,
}

const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;

/// Discrete probability distribution over stake multipliers. Construction
/// validates the table, so a held value is always safe to sample from.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeDistribution {
    entries: Vec<OutcomeEntry>,
}

impl OutcomeDistribution {
    pub fn new(entries: Vec<OutcomeEntry>) -> Result<Self, SimulationError> {
        if entries.is_empty() {
            return Err(SimulationError::InvalidConfiguration(
                "outcome distribution must have at least one entry".to_string(),
            ));
        }

        let mut sum = 0.0;
        for entry in &entries {
            if !entry.probability.is_finite() || entry.probability < 0.0 {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "outcome probability for multiplier {} must be finite and >= 0",
                    entry.multiplier
                )));
            }
            sum += entry.probability;
        }

        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(SimulationError::InvalidConfiguration(format!(
                "outcome probabilities must sum to 1, got {sum}"
            )));
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[OutcomeEntry] {
        &self.entries
    }

    pub(crate) fn sample(&self, rng: &mut Rng) -> i64 {
        let u = rng.next_f64();
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.probability;
            if u < cumulative {
                return entry.multiplier;
            }
        }
        // Accumulated float error can leave u a hair above the final sum.
        self.entries[self.entries.len() - 1].multiplier
    }
}

impl Default for OutcomeDistribution {
    /// The reference slot game's payout table, preserved verbatim.
    fn default() -> Self {
        Self {
            entries: vec![
                OutcomeEntry {
                    multiplier: 0,
                    probability: 0.55,
                },
                OutcomeEntry {
                    multiplier: 1,
                    probability: 0.234,
                },
                OutcomeEntry {
                    multiplier: 3,
                    probability: 0.21,
                },
                OutcomeEntry {
                    multiplier: 11,
                    probability: 0.006,
                },
            ],
        }
    }
}

/// Xorshift64* generator, constructed fresh per run from that run's seed so
/// concurrent runs never share random state.
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    pub(crate) fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            seed
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    pub(crate) fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_reference_game() {
        let distribution = OutcomeDistribution::default();
        let entries = distribution.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].multiplier, 0);
        assert_eq!(entries[0].probability, 0.55);
        assert_eq!(entries[1].multiplier, 1);
        assert_eq!(entries[1].probability, 0.234);
        assert_eq!(entries[2].multiplier, 3);
        assert_eq!(entries[2].probability, 0.21);
        assert_eq!(entries[3].multiplier, 11);
        assert_eq!(entries[3].probability, 0.006);
    }

    #[test]
    fn new_rejects_malformed_tables() {
        assert!(OutcomeDistribution::new(Vec::new()).is_err());

        let negative = vec![
            OutcomeEntry {
                multiplier: 0,
                probability: -0.5,
            },
            OutcomeEntry {
                multiplier: 2,
                probability: 1.5,
            },
        ];
        assert!(OutcomeDistribution::new(negative).is_err());

        let short_sum = vec![
            OutcomeEntry {
                multiplier: 0,
                probability: 0.5,
            },
            OutcomeEntry {
                multiplier: 2,
                probability: 0.4,
            },
        ];
        assert!(OutcomeDistribution::new(short_sum).is_err());

        let nan = vec![OutcomeEntry {
            multiplier: 0,
            probability: f64::NAN,
        }];
        assert!(OutcomeDistribution::new(nan).is_err());
    }

    #[test]
    fn new_accepts_custom_table() {
        let coin_flip = OutcomeDistribution::new(vec![
            OutcomeEntry {
                multiplier: 0,
                probability: 0.5,
            },
            OutcomeEntry {
                multiplier: 2,
                probability: 0.5,
            },
        ])
        .unwrap();
        assert_eq!(coin_flip.entries().len(), 2);
    }

    #[test]
    fn sampling_is_deterministic_for_a_seed() {
        let distribution = OutcomeDistribution::default();
        let mut a = Rng::new(987);
        let mut b = Rng::new(987);
        for _ in 0..200 {
            assert_eq!(distribution.sample(&mut a), distribution.sample(&mut b));
        }
    }

    #[test]
    fn samples_come_from_the_table() {
        let distribution = OutcomeDistribution::default();
        let mut rng = Rng::new(5);
        for _ in 0..1_000 {
            let m = distribution.sample(&mut rng);
            assert!(
                matches!(m, 0 | 1 | 3 | 11),
                "sampled multiplier {m} not in table"
            );
        }
    }

    #[test]
    fn empirical_frequencies_match_table() {
        const N: usize = 100_000;
        let distribution = OutcomeDistribution::default();
        let mut rng = Rng::new(123_456);

        let mut counts = [0usize; 4];
        for _ in 0..N {
            let idx = match distribution.sample(&mut rng) {
                0 => 0,
                1 => 1,
                3 => 2,
                11 => 3,
                other => panic!("unexpected multiplier {other}"),
            };
            counts[idx] += 1;
        }

        for (count, entry) in counts.iter().zip(distribution.entries()) {
            let p = entry.probability;
            let frequency = *count as f64 / N as f64;
            let sigma = (p * (1.0 - p) / N as f64).sqrt();
            let tolerance = (5.0 * sigma).max(0.002);
            assert!(
                (frequency - p).abs() <= tolerance,
                "multiplier {}: frequency {frequency} outside {p} +/- {tolerance}",
                entry.multiplier
            );
        }
    }

    #[test]
    fn next_f64_stays_in_unit_interval() {
        let mut rng = Rng::new(0);
        for _ in 0..10_000 {
            let u = rng.next_f64();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
