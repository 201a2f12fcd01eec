//! Population configuration.
//!
//! [`PopulationConfig`] holds the engine-wide constants that drive every
//! generation: the truncation cap, the operator rates, and the recombination
//! composition policy.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How recombination offspring are merged into the population.
///
/// The two policies produce very different growth dynamics and are never
/// mixed within one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Composition {
    /// Offspring are appended to the mutated population. Every member that
    /// entered the generation competes in the final sort, so the best
    /// fitness never decreases between generations.
    #[default]
    Additive,

    /// Offspring replace the population entirely. The previous best may be
    /// lost, so best fitness can decrease between generations.
    Replacing,
}

/// Configuration for a [`Population`](super::Population).
///
/// # Defaults
///
/// ```
/// use u_evolve::population::{Composition, PopulationConfig};
///
/// let config = PopulationConfig::default();
/// assert_eq!(config.max_population, 10_000);
/// assert_eq!(config.composition, Composition::Additive);
/// assert!(!config.kill_enabled);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::population::{Composition, PopulationConfig};
///
/// let config = PopulationConfig::default()
///     .with_max_population(500)
///     .with_mutation_rate(0.2)
///     .with_repopulation_rate(0.5)
///     .with_composition(Composition::Replacing)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PopulationConfig {
    /// Population size cap applied after every sort (truncation selection).
    pub max_population: usize,

    /// Fraction of the sorted population (best first) that receives one
    /// mutated copy per generation (0.0–1.0).
    pub mutation_rate: f64,

    /// Number of recombination offspring per generation, as a fraction of
    /// the population size after mutation (0.0–1.0).
    pub repopulation_rate: f64,

    /// Fraction of the population removed at random by
    /// [`kill`](super::Population::kill) (0.0 up to, excluding, 1.0).
    pub death_rate: f64,

    /// Composition policy for recombination offspring.
    pub composition: Composition,

    /// Whether [`evolve`](super::Population::evolve) runs the kill step
    /// between recombination and the final sort.
    pub kill_enabled: bool,

    /// Whether recombination offspring are produced on the rayon pool.
    ///
    /// When `false`, productions run one after another on the calling
    /// thread through the same result channel.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional per-generation deadline in milliseconds.
    ///
    /// A generation that misses it fails as a whole: partial offspring are
    /// discarded and the population is restored to its sorted state from
    /// the start of the generation.
    pub generation_timeout_ms: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            max_population: 10_000,
            mutation_rate: 0.4,
            repopulation_rate: 0.8,
            death_rate: 0.6,
            composition: Composition::Additive,
            kill_enabled: false,
            parallel: true,
            seed: None,
            generation_timeout_ms: None,
        }
    }
}

impl PopulationConfig {
    /// Sets the population cap.
    pub fn with_max_population(mut self, n: usize) -> Self {
        self.max_population = n;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the repopulation rate.
    pub fn with_repopulation_rate(mut self, rate: f64) -> Self {
        self.repopulation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the death rate used by the kill step.
    pub fn with_death_rate(mut self, rate: f64) -> Self {
        self.death_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the recombination composition policy.
    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    /// Enables or disables the kill step inside `evolve`.
    pub fn with_kill(mut self, enabled: bool) -> Self {
        self.kill_enabled = enabled;
        self
    }

    /// Enables or disables parallel recombination.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the per-generation deadline in milliseconds.
    pub fn with_generation_timeout_ms(mut self, ms: u64) -> Self {
        self.generation_timeout_ms = Some(ms);
        self
    }

    /// The per-generation deadline as a [`Duration`].
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }

    /// Number of offspring a recombination step produces for a population of
    /// `len` members: `floor(len * repopulation_rate)`.
    pub fn offspring_count(&self, len: usize) -> usize {
        fraction_of(len, self.repopulation_rate)
    }

    /// Number of mutants a mutation step appends: `floor(len * mutation_rate)`.
    pub fn mutant_count(&self, len: usize) -> usize {
        fraction_of(len, self.mutation_rate)
    }

    /// Number of members the kill step removes: `floor(len * death_rate)`.
    pub fn death_count(&self, len: usize) -> usize {
        fraction_of(len, self.death_rate)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_population < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        for (name, value) in [
            ("mutation_rate", self.mutation_rate),
            ("repopulation_rate", self.repopulation_rate),
            ("death_rate", self.death_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.death_rate >= 1.0 {
            return Err(ConfigError::DeathRateTooHigh);
        }
        if self.composition == Composition::Replacing {
            let offspring = self.offspring_count(self.max_population);
            if offspring < 2 {
                return Err(ConfigError::TooFewOffspring { offspring });
            }
        }
        if self.generation_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn fraction_of(len: usize, rate: f64) -> usize {
    ((len as f64 * rate) as usize).min(len)
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_population must be at least 2")]
    PopulationTooSmall,
    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("death_rate must be below 1.0 so the kill step leaves survivors")]
    DeathRateTooHigh,
    #[error("replacing composition would keep only {offspring} offspring, at least 2 are required")]
    TooFewOffspring { offspring: usize },
    #[error("generation_timeout_ms must be positive or None")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PopulationConfig::default();
        assert_eq!(config.max_population, 10_000);
        assert!((config.mutation_rate - 0.4).abs() < 1e-10);
        assert!((config.repopulation_rate - 0.8).abs() < 1e-10);
        assert!((config.death_rate - 0.6).abs() < 1e-10);
        assert_eq!(config.composition, Composition::Additive);
        assert!(!config.kill_enabled);
        assert!(config.parallel);
        assert!(config.seed.is_none());
        assert!(config.generation_timeout_ms.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PopulationConfig::default()
            .with_max_population(200)
            .with_mutation_rate(0.1)
            .with_repopulation_rate(0.5)
            .with_death_rate(0.3)
            .with_composition(Composition::Replacing)
            .with_kill(true)
            .with_parallel(false)
            .with_seed(7)
            .with_generation_timeout_ms(250);

        assert_eq!(config.max_population, 200);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert!((config.repopulation_rate - 0.5).abs() < 1e-10);
        assert!((config.death_rate - 0.3).abs() < 1e-10);
        assert_eq!(config.composition, Composition::Replacing);
        assert!(config.kill_enabled);
        assert!(!config.parallel);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.generation_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_clamp_rates() {
        let config = PopulationConfig::default()
            .with_mutation_rate(1.5)
            .with_repopulation_rate(-0.5)
            .with_death_rate(2.0);

        assert!((config.mutation_rate - 1.0).abs() < 1e-10);
        assert!((config.repopulation_rate - 0.0).abs() < 1e-10);
        assert!((config.death_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_counts_floor() {
        let config = PopulationConfig::default()
            .with_mutation_rate(0.5)
            .with_repopulation_rate(0.5)
            .with_death_rate(0.6);

        assert_eq!(config.mutant_count(4), 2);
        assert_eq!(config.offspring_count(4), 2);
        assert_eq!(config.offspring_count(5), 2);
        assert_eq!(config.death_count(10), 6);
        assert_eq!(config.death_count(1), 0);
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = PopulationConfig::default().with_max_population(1);
        assert_eq!(config.validate(), Err(ConfigError::PopulationTooSmall));
    }

    #[test]
    fn test_validate_rate_out_of_range() {
        let config = PopulationConfig {
            mutation_rate: 1.2,
            ..PopulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RateOutOfRange {
                name: "mutation_rate",
                ..
            })
        ));

        let config = PopulationConfig {
            repopulation_rate: f64::NAN,
            ..PopulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_death_rate_one() {
        let config = PopulationConfig::default().with_death_rate(1.0);
        assert_eq!(config.validate(), Err(ConfigError::DeathRateTooHigh));
    }

    #[test]
    fn test_validate_replacing_needs_offspring() {
        let config = PopulationConfig::default()
            .with_max_population(4)
            .with_repopulation_rate(0.25)
            .with_composition(Composition::Replacing);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooFewOffspring { offspring: 1 })
        );

        // Additive keeps the survivors, so no offspring at all is fine
        let config = PopulationConfig::default()
            .with_max_population(4)
            .with_repopulation_rate(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = PopulationConfig::default().with_generation_timeout_ms(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }
}
